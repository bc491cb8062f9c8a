//! Two-stage composition engine.
//!
//! [`ChainedAdapter`] wires a source and a target adapter into one adapter
//! whose answer is `source AND target`:
//!
//! 1. evaluate the source; a false answer short-circuits (the target is
//!    neither reconfigured nor evaluated)
//! 2. if a transform is bound, derive the target's next config from the
//!    source result and reconfigure the target with it
//! 3. evaluate the target and report both sub-results
//!
//! A transform failure escapes `evaluate` as [`AdapterError::Transform`]; it
//! means the wiring is wrong, not that the answer is no.
//!
//! Deeper pipelines are built by nesting: `ChainedAdapter` is itself a
//! [`TruthAdapter`] and can fill either stage of another chain.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::adapter::TruthAdapter;
use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result, TransformError};
use crate::obs;
use crate::result::{
    AdapterResult, NOT_CONFIGURED, REASON_KEY, SOURCE_RESULT_KEY, TARGET_RESULT_KEY,
};

/// Reason recorded when the source stage answers false.
pub const SOURCE_FALSE_REASON: &str = "Source adapter returned false";

/// Derives the target's next config from the source result.
///
/// Must be free of side effects; failing is its only permitted effect.
pub type TransformFn<P> = Arc<
    dyn Fn(&AdapterResult) -> std::result::Result<AdapterConfig<P>, TransformError> + Send + Sync,
>;

/// Parameters of a chain: the two stages, their initial configs and an
/// optional transform.
///
/// The chain holds references to the stages; it never constructs them.
pub struct ChainParams<S, T>
where
    S: TruthAdapter + ?Sized,
    T: TruthAdapter + ?Sized,
{
    pub source_adapter: Arc<S>,
    pub target_adapter: Arc<T>,
    pub source_config: AdapterConfig<S::Params>,
    pub target_config: AdapterConfig<T::Params>,
    pub transform_result: Option<TransformFn<T::Params>>,
}

impl<S, T> ChainParams<S, T>
where
    S: TruthAdapter + ?Sized,
    T: TruthAdapter + ?Sized,
{
    pub fn new(
        source_adapter: Arc<S>,
        source_config: AdapterConfig<S::Params>,
        target_adapter: Arc<T>,
        target_config: AdapterConfig<T::Params>,
    ) -> Self {
        Self {
            source_adapter,
            target_adapter,
            source_config,
            target_config,
            transform_result: None,
        }
    }

    /// Reconfigure the target from each truthy source result.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&AdapterResult) -> std::result::Result<AdapterConfig<T::Params>, TransformError>
            + Send
            + Sync
            + 'static,
    {
        self.transform_result = Some(Arc::new(transform));
        self
    }
}

impl<S, T> Clone for ChainParams<S, T>
where
    S: TruthAdapter + ?Sized,
    T: TruthAdapter + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            source_adapter: Arc::clone(&self.source_adapter),
            target_adapter: Arc::clone(&self.target_adapter),
            source_config: self.source_config.clone(),
            target_config: self.target_config.clone(),
            transform_result: self.transform_result.clone(),
        }
    }
}

/// Full configuration record of a chain.
pub type ChainedAdapterConfig<S, T> = AdapterConfig<ChainParams<S, T>>;

// Stage references kept from the start of configure. The initial configs
// are not kept: they belong to the children once handed over. `ready` turns
// true only once both stages accepted their configs; until then the binding
// exists solely so that dispose can reach the stages.
struct Binding<S, T>
where
    S: TruthAdapter + ?Sized,
    T: TruthAdapter + ?Sized,
{
    id: String,
    ready: bool,
    source: Arc<S>,
    target: Arc<T>,
    transform: Option<TransformFn<T::Params>>,
}

impl<S, T> Clone for Binding<S, T>
where
    S: TruthAdapter + ?Sized,
    T: TruthAdapter + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            ready: self.ready,
            source: Arc::clone(&self.source),
            target: Arc::clone(&self.target),
            transform: self.transform.clone(),
        }
    }
}

/// Short-circuiting AND of two adapters.
///
/// A chain bound with a transform reconfigures its target during
/// `evaluate`, so its evaluations are serialized internally. Without a
/// transform no extra ordering is imposed beyond what the stages require.
pub struct ChainedAdapter<S, T>
where
    S: TruthAdapter + ?Sized,
    T: TruthAdapter + ?Sized,
{
    binding: RwLock<Option<Binding<S, T>>>,
    serial: Mutex<()>,
}

impl<S, T> ChainedAdapter<S, T>
where
    S: TruthAdapter + ?Sized,
    T: TruthAdapter + ?Sized,
{
    /// An unbound chain; it does nothing until configured.
    pub fn new() -> Self {
        Self {
            binding: RwLock::new(None),
            serial: Mutex::new(()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|b| b.ready)
    }

    /// Id of the bound configuration, if any.
    pub fn id(&self) -> Option<String> {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|b| b.ready)
            .map(|b| b.id.clone())
    }

    fn snapshot(&self) -> Option<Binding<S, T>> {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, binding: Option<Binding<S, T>>) -> Option<Binding<S, T>> {
        let mut slot = self.binding.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, binding)
    }

    async fn run(&self, binding: &Binding<S, T>) -> Result<AdapterResult> {
        let source_result = binding.source.evaluate().await?;

        if !source_result.answer {
            obs::emit_short_circuit(&binding.id, source_result.error());
            return Ok(AdapterResult::new(false)
                .with_metadata(SOURCE_RESULT_KEY, &source_result)
                .with_metadata(REASON_KEY, SOURCE_FALSE_REASON));
        }

        if let Some(transform) = &binding.transform {
            let next = transform(&source_result).map_err(|source| {
                obs::emit_transform_failed(&binding.id, &source);
                AdapterError::Transform {
                    chain: binding.id.clone(),
                    source,
                }
            })?;
            obs::emit_reconfigured(&binding.id, &next.id);
            binding.target.configure(next).await?;
        }

        let target_result = binding.target.evaluate().await?;
        obs::emit_evaluated(&binding.id, target_result.answer);

        Ok(AdapterResult::new(target_result.answer)
            .with_metadata(SOURCE_RESULT_KEY, &source_result)
            .with_metadata(TARGET_RESULT_KEY, &target_result))
    }
}

impl<S, T> Default for ChainedAdapter<S, T>
where
    S: TruthAdapter + ?Sized,
    T: TruthAdapter + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S, T> TruthAdapter for ChainedAdapter<S, T>
where
    S: TruthAdapter + ?Sized + 'static,
    T: TruthAdapter + ?Sized + 'static,
{
    type Params = ChainParams<S, T>;

    async fn configure(&self, config: ChainedAdapterConfig<S, T>) -> Result<()> {
        let AdapterConfig { id, params, .. } = config;
        let ChainParams {
            source_adapter,
            target_adapter,
            source_config,
            target_config,
            transform_result,
        } = params;

        // a failed cascade leaves the chain unusable but still disposable
        let mut binding = Binding {
            id,
            ready: false,
            source: source_adapter,
            target: target_adapter,
            transform: transform_result,
        };
        self.replace(Some(binding.clone()));
        binding.source.configure(source_config).await?;
        binding.target.configure(target_config).await?;

        obs::emit_configured("chain", &binding.id);
        binding.ready = true;
        self.replace(Some(binding));
        Ok(())
    }

    async fn evaluate(&self) -> Result<AdapterResult> {
        let Some(binding) = self.snapshot().filter(|b| b.ready) else {
            return Ok(AdapterResult::fault(NOT_CONFIGURED));
        };

        let span = obs::evaluation_span("chain", &binding.id);
        async {
            let _serial = match binding.transform {
                Some(_) => Some(self.serial.lock().await),
                None => None,
            };
            self.run(&binding).await
        }
        .instrument(span)
        .await
    }

    async fn dispose(&self) {
        let Some(binding) = self.replace(None) else {
            return;
        };
        binding.source.dispose().await;
        binding.target.dispose().await;
        obs::emit_disposed("chain", &binding.id);
    }
}
