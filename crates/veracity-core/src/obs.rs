//! Structured observability hooks for adapter lifecycle events.
//!
//! Each helper emits one event with a stable `event` field so log pipelines
//! can filter on it:
//! - `adapter.configured`, `adapter.disposed`
//! - `evaluation.completed`, `adapter.fault`
//! - `chain.short_circuit`, `chain.reconfigured`, `chain.transform_failed`

use tracing::{debug, info, warn};

/// Span wrapping one evaluation of the adapter `id`.
///
/// Attach it with `tracing::Instrument` rather than entering it, since
/// evaluation futures cross await points.
pub fn evaluation_span(kind: &'static str, id: &str) -> tracing::Span {
    tracing::info_span!("veracity.evaluate", kind = kind, adapter_id = %id)
}

/// Emit event: an adapter accepted a configuration.
pub fn emit_configured(kind: &str, id: &str) {
    debug!(event = "adapter.configured", kind = %kind, adapter_id = %id);
}

/// Emit event: an adapter released its resources.
pub fn emit_disposed(kind: &str, id: &str) {
    debug!(event = "adapter.disposed", kind = %kind, adapter_id = %id);
}

/// Emit event: an evaluation finished with the given answer.
pub fn emit_evaluated(id: &str, answer: bool) {
    info!(event = "evaluation.completed", adapter_id = %id, answer = answer);
}

/// Emit event: an evaluation fault was folded into a false answer (warning level).
pub fn emit_fault(id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "adapter.fault", adapter_id = %id, error = %error);
}

/// Emit event: the source stage answered false and the target was skipped.
pub fn emit_short_circuit(chain_id: &str, source_error: Option<&str>) {
    info!(
        event = "chain.short_circuit",
        chain_id = %chain_id,
        source_error = source_error.unwrap_or(""),
    );
}

/// Emit event: the target stage was reconfigured from the source result.
pub fn emit_reconfigured(chain_id: &str, target_config_id: &str) {
    debug!(
        event = "chain.reconfigured",
        chain_id = %chain_id,
        target_config_id = %target_config_id,
    );
}

/// Emit event: the transform rejected the source result (warning level).
pub fn emit_transform_failed(chain_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "chain.transform_failed", chain_id = %chain_id, error = %error);
}
