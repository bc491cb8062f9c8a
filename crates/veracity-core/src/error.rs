//! Error types for veracity-core

use thiserror::Error;

/// Failure raised by a chain transform while deriving the target's next config.
///
/// Carries only a message: transforms are plain closures and their failures
/// describe bad wiring or unusable source data, never I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that escape the adapter contract.
///
/// Leaf adapters only ever return `InvalidConfig` (from `configure`). Every
/// evaluation-time fault is encoded as a false `AdapterResult` instead.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Parameters are structurally unusable (missing bounds, bad regex, ...)
    #[error("invalid configuration for '{id}': {reason}")]
    InvalidConfig { id: String, reason: String },

    /// A chain transform failed to produce the target's next config
    #[error("transform for chain '{chain}' failed: {source}")]
    Transform {
        chain: String,
        #[source]
        source: TransformError,
    },
}

impl AdapterError {
    pub fn invalid_config(id: impl Into<String>, reason: impl Into<String>) -> Self {
        AdapterError::InvalidConfig {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;
