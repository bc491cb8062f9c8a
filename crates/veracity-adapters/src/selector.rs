//! CSS selector extraction over a fetched page.
//!
//! The selector is parsed once at configure. The page is parsed with
//! `scraper`, whose document type is not `Send`, so parsing and extraction
//! run in a plain function after the fetch completes and nothing from the
//! document is held across an await.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use veracity_core::obs;
use veracity_core::{AdapterConfig, AdapterError, AdapterResult, Result, TruthAdapter, NOT_CONFIGURED};

use crate::fetch::PageFetcher;
use crate::slot::Slot;
use crate::{MATCHED_VALUE_KEY, NO_MATCH};

const KIND: &str = "select";

/// Metadata key naming the attribute that was read.
pub const EXTRACTED_ATTRIBUTE_KEY: &str = "extractedAttribute";

/// Parameters of a [`SelectorAdapter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorParams {
    pub url: String,
    /// CSS selector
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    /// Request timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Read this attribute of the first match instead of the text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_attribute: Option<String>,
}

impl SelectorParams {
    pub fn new(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: selector.into(),
            expected_value: None,
            timeout: None,
            extract_attribute: None,
        }
    }

    pub fn expecting(mut self, expected: impl Into<String>) -> Self {
        self.expected_value = Some(expected.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.extract_attribute = Some(name.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }
}

#[derive(Debug)]
struct BoundSelector {
    id: String,
    url: String,
    selector: Selector,
    expected: Option<String>,
    attribute: Option<String>,
    timeout: Option<Duration>,
}

fn parse_selector(selector: &str) -> std::result::Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("invalid selector '{}': {}", selector, e))
}

/// Value selected from `body`: the attribute of the first match, or the
/// trimmed text of all matches. Empty values count as no match.
pub fn extract(body: &str, selector: &Selector, attribute: Option<&str>) -> Option<String> {
    let document = Html::parse_document(body);
    let mut matches = document.select(selector);

    let value = match attribute {
        Some(name) => matches
            .next()
            .and_then(|element| element.value().attr(name))
            .map(str::to_string),
        None => {
            let text: String = matches.flat_map(|element| element.text()).collect();
            Some(text.trim().to_string())
        }
    };
    value.filter(|v| !v.is_empty())
}

/// Fetches a page and extracts a value with a CSS selector.
pub struct SelectorAdapter {
    fetcher: Arc<dyn PageFetcher>,
    slot: Slot<BoundSelector>,
}

impl SelectorAdapter {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            slot: Slot::new(),
        }
    }

    async fn check(&self, bound: &BoundSelector) -> AdapterResult {
        let body = match self.fetcher.fetch(&bound.url, bound.timeout).await {
            Ok(body) => body,
            Err(e) => {
                obs::emit_fault(&bound.id, &e);
                return AdapterResult::fault(e);
            }
        };

        let Some(matched) = extract(&body, &bound.selector, bound.attribute.as_deref()) else {
            obs::emit_fault(&bound.id, &NO_MATCH);
            return AdapterResult::fault(NO_MATCH);
        };

        let answer = bound
            .expected
            .as_deref()
            .map_or(true, |expected| expected == matched);
        obs::emit_evaluated(&bound.id, answer);
        let mut result = AdapterResult::new(answer).with_metadata(MATCHED_VALUE_KEY, matched);
        if let Some(attribute) = &bound.attribute {
            result = result.with_metadata(EXTRACTED_ATTRIBUTE_KEY, attribute.as_str());
        }
        result
    }
}

#[async_trait]
impl TruthAdapter for SelectorAdapter {
    type Params = SelectorParams;

    async fn configure(&self, config: AdapterConfig<SelectorParams>) -> Result<()> {
        let AdapterConfig { id, params, .. } = config;
        let selector = parse_selector(&params.selector)
            .map_err(|reason| AdapterError::invalid_config(id.as_str(), reason))?;
        obs::emit_configured(KIND, &id);
        self.slot.set(BoundSelector {
            id,
            url: params.url,
            selector,
            expected: params.expected_value,
            attribute: params.extract_attribute,
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

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <ul>
          <li class="item" data-id="1"> First </li>
          <li class="item" data-id="2">Second</li>
        </ul>
        <p class="empty" data-id=""></p>
    "#;

    fn select(body: &str, selector: &str, attribute: Option<&str>) -> Option<String> {
        extract(body, &parse_selector(selector).unwrap(), attribute)
    }

    #[test]
    fn text_of_all_matches_is_concatenated() {
        assert_eq!(select(PAGE, "li.item", None).as_deref(), Some("First Second"));
    }

    #[test]
    fn attribute_comes_from_first_match() {
        assert_eq!(select(PAGE, "li.item", Some("data-id")).as_deref(), Some("1"));
    }

    #[test]
    fn empty_or_missing_values_are_no_match() {
        assert_eq!(select(PAGE, ".missing", None), None);
        assert_eq!(select(PAGE, "p.empty", None), None);
        assert_eq!(select(PAGE, "p.empty", Some("data-id")), None);
        assert_eq!(select(PAGE, "li.item", Some("href")), None);
    }

    #[test]
    fn bad_selector_is_rejected_at_parse() {
        let err = parse_selector("li[").unwrap_err();
        assert!(err.contains("invalid selector 'li['"));
    }

    #[tokio::test]
    async fn selector_is_parsed_once_at_configure() {
        let fetcher = Arc::new(crate::fakes::StaticFetcher::always(PAGE));
        let adapter = SelectorAdapter::new(fetcher);
        adapter
            .configure(AdapterConfig::new(
                "s",
                "S",
                SelectorParams::new("http://test.com", "li.item").attribute("data-id"),
            ))
            .await
            .unwrap();

        let bound = adapter.slot.get().unwrap();
        assert_eq!(extract(PAGE, &bound.selector, None).as_deref(), Some("First Second"));

        let result = adapter.evaluate().await.unwrap();
        assert_eq!(result.get(MATCHED_VALUE_KEY), Some(&serde_json::json!("1")));
    }

    #[test]
    fn adapter_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SelectorAdapter>();
    }
}
