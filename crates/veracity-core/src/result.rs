//! The outcome record every adapter returns from `evaluate`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open-ended diagnostic mapping attached to a result.
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata key holding a fault description.
pub const ERROR_KEY: &str = "error";
/// Metadata key explaining a short-circuited chain.
pub const REASON_KEY: &str = "reason";
/// Metadata key holding a chain's source sub-result.
pub const SOURCE_RESULT_KEY: &str = "sourceResult";
/// Metadata key holding a chain's target sub-result.
pub const TARGET_RESULT_KEY: &str = "targetResult";

/// Fault reported when `evaluate` runs before `configure`.
pub const NOT_CONFIGURED: &str = "adapter is not configured";

/// Result of a single evaluation.
///
/// A false answer is a legitimate outcome, including when the adapter hit an
/// internal fault; in that case `metadata["error"]` describes the fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterResult {
    /// The yes/no answer
    pub answer: bool,
    /// When the answer was produced
    pub timestamp: DateTime<Utc>,
    /// Match values, error descriptions, nested sub-results
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl AdapterResult {
    /// Answer stamped with the current time.
    pub fn new(answer: bool) -> Self {
        Self::at(answer, Utc::now())
    }

    /// Answer stamped with an explicit time.
    pub fn at(answer: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            answer,
            timestamp,
            metadata: Metadata::new(),
        }
    }

    /// False answer describing an evaluation fault.
    pub fn fault(error: impl fmt::Display) -> Self {
        Self::new(false).with_metadata(ERROR_KEY, error.to_string())
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Fault description, if the adapter reported one.
    pub fn error(&self) -> Option<&str> {
        self.get(ERROR_KEY).and_then(Value::as_str)
    }

    /// Decode a nested result stored under `key` (e.g. a chain's `sourceResult`).
    pub fn sub_result(&self, key: &str) -> Option<AdapterResult> {
        self.get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// JSON form used when nesting this result inside another result's metadata.
    pub fn to_value(&self) -> Value {
        // string keys and plain fields only, so serialization cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&AdapterResult> for Value {
    fn from(result: &AdapterResult) -> Self {
        result.to_value()
    }
}

impl fmt::Display for AdapterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error() {
            Some(error) => write!(f, "{} ({})", self.answer, error),
            None => write!(f, "{}", self.answer),
        }
    }
}
