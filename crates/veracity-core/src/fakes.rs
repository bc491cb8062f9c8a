//! In-memory fakes for the adapter contract (testing only)
//!
//! `StaticAdapter` answers a fixed value and records every lifecycle call so
//! tests can spy on how a chain drives its stages. `Journal` collects an
//! ordered log shared between several fakes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::adapter::TruthAdapter;
use crate::config::{AdapterConfig, JsonParams};
use crate::error::{AdapterError, Result};
use crate::result::{AdapterResult, Metadata};

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Ordered, shared log of lifecycle calls, e.g. `["source.configure", ..]`.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// StaticAdapter
// ---------------------------------------------------------------------------

/// Adapter with a fixed (but switchable) answer that counts its calls.
#[derive(Debug)]
pub struct StaticAdapter {
    answer: AtomicBool,
    metadata: Metadata,
    reject_config: AtomicBool,
    configs: Mutex<Vec<AdapterConfig>>,
    configure_calls: AtomicUsize,
    evaluate_calls: AtomicUsize,
    dispose_calls: AtomicUsize,
    journal: Option<(Journal, String)>,
}

impl StaticAdapter {
    pub fn new(answer: bool) -> Self {
        Self {
            answer: AtomicBool::new(answer),
            metadata: Metadata::new(),
            reject_config: AtomicBool::new(false),
            configs: Mutex::new(Vec::new()),
            configure_calls: AtomicUsize::new(0),
            evaluate_calls: AtomicUsize::new(0),
            dispose_calls: AtomicUsize::new(0),
            journal: None,
        }
    }

    /// An adapter whose `configure` always fails with `InvalidConfig`.
    pub fn rejecting_config(answer: bool) -> Self {
        let adapter = Self::new(answer);
        adapter.set_reject_config(true);
        adapter
    }

    /// Metadata attached to every result.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Record lifecycle calls into `journal` as `"{label}.{operation}"`.
    pub fn with_journal(mut self, journal: &Journal, label: impl Into<String>) -> Self {
        self.journal = Some((journal.clone(), label.into()));
        self
    }

    pub fn set_answer(&self, answer: bool) {
        self.answer.store(answer, Ordering::SeqCst);
    }

    /// Make subsequent `configure` calls fail (or succeed again).
    pub fn set_reject_config(&self, reject: bool) {
        self.reject_config.store(reject, Ordering::SeqCst);
    }

    pub fn configure_count(&self) -> usize {
        self.configure_calls.load(Ordering::SeqCst)
    }

    pub fn evaluate_count(&self) -> usize {
        self.evaluate_calls.load(Ordering::SeqCst)
    }

    pub fn dispose_count(&self) -> usize {
        self.dispose_calls.load(Ordering::SeqCst)
    }

    /// Every config accepted so far, oldest first.
    pub fn configs(&self) -> Vec<AdapterConfig> {
        self.configs.lock().unwrap().clone()
    }

    pub fn last_config(&self) -> Option<AdapterConfig> {
        self.configs.lock().unwrap().last().cloned()
    }

    fn note(&self, operation: &str) {
        if let Some((journal, label)) = &self.journal {
            journal.record(format!("{}.{}", label, operation));
        }
    }
}

#[async_trait]
impl TruthAdapter for StaticAdapter {
    type Params = JsonParams;

    async fn configure(&self, config: AdapterConfig) -> Result<()> {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        self.note("configure");
        if self.reject_config.load(Ordering::SeqCst) {
            return Err(AdapterError::invalid_config(config.id, "rejected by fake"));
        }
        self.configs.lock().unwrap().push(config);
        Ok(())
    }

    async fn evaluate(&self) -> Result<AdapterResult> {
        self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
        self.note("evaluate");
        let mut result = AdapterResult::new(self.answer.load(Ordering::SeqCst));
        result.metadata = self.metadata.clone();
        Ok(result)
    }

    async fn dispose(&self) {
        self.dispose_calls.fetch_add(1, Ordering::SeqCst);
        self.note("dispose");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_adapter_counts_calls() {
        let adapter = StaticAdapter::new(true).with_metadata("value", "test");
        adapter
            .configure(AdapterConfig::bare("a", "A"))
            .await
            .unwrap();
        let result = adapter.evaluate().await.unwrap();
        adapter.dispose().await;

        assert!(result.answer);
        assert_eq!(result.metadata["value"], "test");
        assert_eq!(adapter.configure_count(), 1);
        assert_eq!(adapter.evaluate_count(), 1);
        assert_eq!(adapter.dispose_count(), 1);
        assert_eq!(adapter.last_config().unwrap().id, "a");
    }

    #[tokio::test]
    async fn journal_is_shared_between_fakes() {
        let journal = Journal::new();
        let a = StaticAdapter::new(true).with_journal(&journal, "a");
        let b = StaticAdapter::new(false).with_journal(&journal, "b");

        b.evaluate().await.unwrap();
        a.dispose().await;

        assert_eq!(journal.entries(), vec!["b.evaluate", "a.dispose"]);
    }

    #[tokio::test]
    async fn set_answer_flips_result() {
        let adapter = StaticAdapter::new(true);
        adapter.set_answer(false);
        assert!(!adapter.evaluate().await.unwrap().answer);
    }
}
