//! Numeric range truth source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use veracity_core::obs;
use veracity_core::{AdapterConfig, AdapterError, AdapterResult, Result, TruthAdapter, NOT_CONFIGURED};

use crate::slot::Slot;

const KIND: &str = "range";

/// Reason given when neither bound is set.
pub const MISSING_BOUNDS: &str = "At least one of minValue or maxValue must be specified";

fn default_inclusive() -> bool {
    true
}

/// Parameters of a [`NumericRangeAdapter`].
///
/// Either bound may be omitted, leaving that side of the range open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericRangeParams {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Whether the bounds themselves are in range
    #[serde(default = "default_inclusive")]
    pub inclusive: bool,
}

impl NumericRangeParams {
    /// Inclusive range `[min, max]`.
    pub fn between(value: f64, min: f64, max: f64) -> Self {
        Self {
            value,
            min_value: Some(min),
            max_value: Some(max),
            inclusive: true,
        }
    }

    pub fn at_least(value: f64, min: f64) -> Self {
        Self {
            value,
            min_value: Some(min),
            max_value: None,
            inclusive: true,
        }
    }

    pub fn at_most(value: f64, max: f64) -> Self {
        Self {
            value,
            min_value: None,
            max_value: Some(max),
            inclusive: true,
        }
    }

    pub fn exclusive(mut self) -> Self {
        self.inclusive = false;
        self
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.min_value.is_none() && self.max_value.is_none() {
            return Err(MISSING_BOUNDS.to_string());
        }
        let numbers = [Some(self.value), self.min_value, self.max_value];
        if numbers.iter().flatten().any(|n| n.is_nan()) {
            return Err("value, minValue and maxValue must be numbers".to_string());
        }
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                return Err(format!("minValue {} is greater than maxValue {}", min, max));
            }
        }
        Ok(())
    }

    fn contains(&self) -> bool {
        let v = self.value;
        let above = self
            .min_value
            .map_or(true, |min| if self.inclusive { v >= min } else { v > min });
        let below = self
            .max_value
            .map_or(true, |max| if self.inclusive { v <= max } else { v < max });
        above && below
    }
}

#[derive(Debug)]
struct BoundRange {
    id: String,
    params: NumericRangeParams,
}

/// Answers whether a value lies within a range.
#[derive(Debug, Default)]
pub struct NumericRangeAdapter {
    slot: Slot<BoundRange>,
}

impl NumericRangeAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TruthAdapter for NumericRangeAdapter {
    type Params = NumericRangeParams;

    async fn configure(&self, config: AdapterConfig<NumericRangeParams>) -> Result<()> {
        let AdapterConfig { id, params, .. } = config;
        params
            .validate()
            .map_err(|reason| AdapterError::invalid_config(id.as_str(), reason))?;
        obs::emit_configured(KIND, &id);
        self.slot.set(BoundRange { id, params });
        Ok(())
    }

    async fn evaluate(&self) -> Result<AdapterResult> {
        let Some(bound) = self.slot.get() else {
            return Ok(AdapterResult::fault(NOT_CONFIGURED));
        };
        let span = obs::evaluation_span(KIND, &bound.id);
        let result = async {
            let params = &bound.params;
            let answer = params.contains();
            obs::emit_evaluated(&bound.id, answer);
            let mut result = AdapterResult::new(answer)
                .with_metadata("value", params.value)
                .with_metadata("inclusive", params.inclusive);
            if let Some(min) = params.min_value {
                result = result.with_metadata("minValue", min);
            }
            if let Some(max) = params.max_value {
                result = result.with_metadata("maxValue", max);
            }
            result
        }
        .instrument(span)
        .await;
        Ok(result)
    }

    async fn dispose(&self) {
        if let Some(bound) = self.slot.take() {
            obs::emit_disposed(KIND, &bound.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ended_ranges() {
        assert!(NumericRangeParams::at_least(10.0, 5.0).contains());
        assert!(!NumericRangeParams::at_least(4.0, 5.0).contains());
        assert!(NumericRangeParams::at_most(-3.0, 0.0).contains());
        assert!(!NumericRangeParams::at_most(0.0, 0.0).exclusive().contains());
    }

    #[test]
    fn validation_rules() {
        let mut params = NumericRangeParams::between(1.0, 0.0, 2.0);
        assert!(params.validate().is_ok());

        params.min_value = None;
        params.max_value = None;
        assert_eq!(params.validate().unwrap_err(), MISSING_BOUNDS);

        let inverted = NumericRangeParams::between(1.0, 3.0, 2.0);
        assert!(inverted.validate().unwrap_err().contains("greater than"));

        let nan = NumericRangeParams::at_least(f64::NAN, 0.0);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn inclusive_defaults_to_true_on_the_wire() {
        let params: NumericRangeParams =
            serde_json::from_value(serde_json::json!({"value": 5, "minValue": 1})).unwrap();
        assert!(params.inclusive);
        assert_eq!(params.max_value, None);
    }
}
