//! Adapters behind an untyped JSON parameter bag.
//!
//! [`JsonAdapter`] lets a typed adapter be configured from a
//! [`JsonParams`] map, so heterogeneous adapters can share the
//! [`DynAdapter`] type. [`Prebound`] freezes a config (typically a whole
//! chain) so that it can fill a stage slot of a JSON-described chain.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::adapter::TruthAdapter;
use crate::config::{AdapterConfig, JsonParams};
use crate::error::{AdapterError, Result};
use crate::result::AdapterResult;

/// Typed adapter configured through a JSON parameter bag.
///
/// A bag that does not deserialize into the adapter's params is rejected at
/// `configure` time as `InvalidConfig`.
pub struct JsonAdapter<A> {
    inner: A,
}

impl<A> JsonAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A> TruthAdapter for JsonAdapter<A>
where
    A: TruthAdapter,
    A::Params: DeserializeOwned,
{
    type Params = JsonParams;

    async fn configure(&self, config: AdapterConfig) -> Result<()> {
        let AdapterConfig { id, name, params } = config;
        let params: A::Params = serde_json::from_value(Value::Object(params))
            .map_err(|e| AdapterError::invalid_config(id.as_str(), e.to_string()))?;
        self.inner
            .configure(AdapterConfig::new(id, name, params))
            .await
    }

    async fn evaluate(&self) -> Result<AdapterResult> {
        self.inner.evaluate().await
    }

    async fn dispose(&self) {
        self.inner.dispose().await
    }
}

/// Adapter wired to a fixed configuration.
///
/// `configure` takes only an identity: the id and name replace those of the
/// frozen config, and a non-empty parameter bag is rejected.
pub struct Prebound<A>
where
    A: TruthAdapter + ?Sized,
{
    inner: Arc<A>,
    config: AdapterConfig<A::Params>,
}

impl<A> Prebound<A>
where
    A: TruthAdapter + ?Sized,
{
    pub fn new(inner: Arc<A>, config: AdapterConfig<A::Params>) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &Arc<A> {
        &self.inner
    }
}

#[async_trait]
impl<A> TruthAdapter for Prebound<A>
where
    A: TruthAdapter + ?Sized,
{
    type Params = JsonParams;

    async fn configure(&self, config: AdapterConfig) -> Result<()> {
        if !config.params.is_empty() {
            let keys: Vec<&str> = config.params.keys().map(String::as_str).collect();
            return Err(AdapterError::invalid_config(
                config.id.as_str(),
                format!("prebound adapter takes no parameters, got: {}", keys.join(", ")),
            ));
        }
        let frozen = AdapterConfig::new(config.id, config.name, self.config.params.clone());
        self.inner.configure(frozen).await
    }

    async fn evaluate(&self) -> Result<AdapterResult> {
        self.inner.evaluate().await
    }

    async fn dispose(&self) {
        self.inner.dispose().await
    }
}
