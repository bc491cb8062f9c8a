//! The capability contract shared by leaf and composite adapters.
//!
//! Every adapter goes through the same lifecycle:
//! - `configure(config)` binds parameters (no I/O, may reject bad params)
//! - `evaluate()` performs the check and returns an [`AdapterResult`]
//! - `dispose()` releases whatever the adapter holds
//!
//! Composites implement the same trait, so a chain can be the source or the
//! target of another chain.

use async_trait::async_trait;

use crate::config::{AdapterConfig, JsonParams};
use crate::error::Result;
use crate::result::AdapterResult;

/// A truth source answering a yes/no question.
///
/// Contract:
/// - `configure` fails only for structurally invalid parameters and must be
///   called before `evaluate`. Calling it again replaces the previous config.
/// - `evaluate` never mutates the adapter's own config. Internal faults
///   (network, parse, no match, not configured) are returned as
///   `Ok(AdapterResult { answer: false, metadata: {"error": ..} })`.
///   Leaves never return `Err` here; composites propagate transform faults.
/// - `dispose` is idempotent and safe before `configure`.
///
/// Overlapping `evaluate` calls on one instance are allowed by the contract;
/// an adapter that cannot tolerate them serializes internally.
#[async_trait]
pub trait TruthAdapter: Send + Sync {
    /// Adapter-specific parameters carried in [`AdapterConfig::params`].
    type Params: Clone + Send + Sync + 'static;

    /// Bind a configuration.
    async fn configure(&self, config: AdapterConfig<Self::Params>) -> Result<()>;

    /// Evaluate the current state and return a yes/no answer.
    async fn evaluate(&self) -> Result<AdapterResult>;

    /// Release held resources.
    async fn dispose(&self);
}

/// Adapter configured through an untyped JSON parameter bag.
pub type DynAdapter = dyn TruthAdapter<Params = JsonParams>;

