//! Calendar-date truth source.
//!
//! Answers whether "today" (per the injected [`Clock`]) is the target date,
//! or the same month and day of any year when `recurringYearly` is set.
//! Both instants are reduced to their UTC calendar date before comparing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use veracity_core::obs;
use veracity_core::{AdapterConfig, AdapterError, AdapterResult, Result, TruthAdapter, NOT_CONFIGURED};

use crate::clock::{Clock, SystemClock};
use crate::slot::Slot;

const KIND: &str = "date";

/// Parameters of a [`DateAdapter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateParams {
    /// RFC 3339 date-time, `YYYY-MM-DDTHH:MM:SS` (read as UTC) or `YYYY-MM-DD`
    pub target_date: String,
    /// Compare month and day only
    #[serde(default)]
    pub recurring_yearly: bool,
}

impl DateParams {
    pub fn new(target_date: impl Into<String>) -> Self {
        Self {
            target_date: target_date.into(),
            recurring_yearly: false,
        }
    }

    pub fn recurring(mut self) -> Self {
        self.recurring_yearly = true;
        self
    }
}

/// Reduce a date string to its UTC calendar date.
pub fn parse_target_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc).date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[derive(Debug)]
struct BoundDate {
    id: String,
    target: NaiveDate,
    recurring: bool,
}

impl BoundDate {
    fn matches(&self, today: NaiveDate) -> bool {
        if self.recurring {
            today.month() == self.target.month() && today.day() == self.target.day()
        } else {
            today == self.target
        }
    }
}

/// Date-match adapter.
pub struct DateAdapter {
    clock: Arc<dyn Clock>,
    slot: Slot<BoundDate>,
}

impl DateAdapter {
    /// Adapter reading the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slot: Slot::new(),
        }
    }
}

impl Default for DateAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TruthAdapter for DateAdapter {
    type Params = DateParams;

    async fn configure(&self, config: AdapterConfig<DateParams>) -> Result<()> {
        let AdapterConfig { id, params, .. } = config;
        let target = parse_target_date(&params.target_date).ok_or_else(|| {
            AdapterError::invalid_config(
                id.as_str(),
                format!("targetDate '{}' is not a valid date", params.target_date),
            )
        })?;
        obs::emit_configured(KIND, &id);
        self.slot.set(BoundDate {
            id,
            target,
            recurring: params.recurring_yearly,
        });
        Ok(())
    }

    async fn evaluate(&self) -> Result<AdapterResult> {
        let Some(bound) = self.slot.get() else {
            return Ok(AdapterResult::fault(NOT_CONFIGURED));
        };
        let span = obs::evaluation_span(KIND, &bound.id);
        let result = async {
            let now = self.clock.now();
            let today = now.date_naive();
            let answer = bound.matches(today);
            obs::emit_evaluated(&bound.id, answer);
            AdapterResult::at(answer, now)
                .with_metadata("today", today.to_string())
                .with_metadata("targetDate", bound.target.to_string())
                .with_metadata("recurringYearly", bound.recurring)
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
