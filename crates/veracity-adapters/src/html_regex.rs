//! Regular-expression match over a fetched page.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use veracity_core::obs;
use veracity_core::{AdapterConfig, AdapterError, AdapterResult, Result, TruthAdapter, NOT_CONFIGURED};

use crate::fetch::PageFetcher;
use crate::slot::Slot;
use crate::{MATCHED_VALUE_KEY, NO_MATCH};

const KIND: &str = "html";

/// Parameters of an [`HtmlRegexAdapter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlRegexParams {
    pub url: String,
    pub regex: String,
    /// Value the captured text must equal; any match is enough when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_match: Option<String>,
    /// Request timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl HtmlRegexParams {
    pub fn new(url: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            regex: regex.into(),
            expected_match: None,
            timeout: None,
        }
    }

    pub fn expecting(mut self, expected: impl Into<String>) -> Self {
        self.expected_match = Some(expected.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }
}

#[derive(Debug)]
struct BoundRegex {
    id: String,
    url: String,
    regex: Regex,
    expected: Option<String>,
    timeout: Option<Duration>,
}

impl BoundRegex {
    /// First match's capture group 1, or the whole match for a pattern
    /// without groups.
    fn extract<'h>(&self, body: &'h str) -> Option<&'h str> {
        let captures = self.regex.captures(body)?;
        captures
            .get(1)
            .or_else(|| captures.get(0))
            .map(|m| m.as_str())
    }
}

/// Fetches a page and matches a regular expression against its body.
pub struct HtmlRegexAdapter {
    fetcher: Arc<dyn PageFetcher>,
    slot: Slot<BoundRegex>,
}

impl HtmlRegexAdapter {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            slot: Slot::new(),
        }
    }

    async fn check(&self, bound: &BoundRegex) -> AdapterResult {
        let body = match self.fetcher.fetch(&bound.url, bound.timeout).await {
            Ok(body) => body,
            Err(e) => {
                obs::emit_fault(&bound.id, &e);
                return AdapterResult::fault(e);
            }
        };

        let Some(matched) = bound.extract(&body) else {
            obs::emit_fault(&bound.id, &NO_MATCH);
            return AdapterResult::fault(NO_MATCH);
        };

        let answer = bound
            .expected
            .as_deref()
            .map_or(true, |expected| expected == matched);
        obs::emit_evaluated(&bound.id, answer);
        AdapterResult::new(answer).with_metadata(MATCHED_VALUE_KEY, matched)
    }
}

#[async_trait]
impl TruthAdapter for HtmlRegexAdapter {
    type Params = HtmlRegexParams;

    async fn configure(&self, config: AdapterConfig<HtmlRegexParams>) -> Result<()> {
        let AdapterConfig { id, params, .. } = config;
        let regex = Regex::new(&params.regex).map_err(|e| {
            AdapterError::invalid_config(id.as_str(), format!("invalid regex: {}", e))
        })?;
        obs::emit_configured(KIND, &id);
        self.slot.set(BoundRegex {
            id,
            url: params.url,
            regex,
            expected: params.expected_match,
            timeout: params.timeout.map(Duration::from_millis),
        });
        Ok(())
    }

    async fn evaluate(&self) -> Result<AdapterResult> {
        let Some(bound) = self.slot.get() else {
            return Ok(AdapterResult::fault(NOT_CONFIGURED));
        };
        let span = obs::evaluation_span(KIND, &bound.id);
        Ok(self.check(&bound).instrument(span).await)
    }

    async fn dispose(&self) {
        if let Some(bound) = self.slot.take() {
            obs::emit_disposed(KIND, &bound.id);
        }
    }
}
