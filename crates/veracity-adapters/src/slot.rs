//! Holder for a leaf adapter's bound configuration.

use std::sync::{Arc, PoisonError, RwLock};

/// Replaceable, shareable slot for the state produced by `configure`.
///
/// `evaluate` takes an `Arc` snapshot, so a concurrent reconfigure never
/// changes the config an in-flight evaluation is using.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    inner: RwLock<Option<Arc<T>>>,
}

impl<T> Slot<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    pub(crate) fn get(&self) -> Option<Arc<T>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set(&self, value: T) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(value));
    }

    pub(crate) fn take(&self) -> Option<Arc<T>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}
