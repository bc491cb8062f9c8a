//! Observability tests for leaf adapter tracing.

use std::sync::Arc;

use tracing_test::traced_test;
use veracity_adapters::fakes::StaticFetcher;
use veracity_adapters::{FetchError, HtmlRegexAdapter, HtmlRegexParams};
use veracity_core::{AdapterConfig, TruthAdapter};

async fn regex_leaf(fetcher: StaticFetcher) -> HtmlRegexAdapter {
    let adapter = HtmlRegexAdapter::new(Arc::new(fetcher));
    adapter
        .configure(AdapterConfig::new(
            "obs-leaf",
            "Obs",
            HtmlRegexParams::new("http://test.com", "<b>(.*?)</b>"),
        ))
        .await
        .unwrap();
    adapter
}

#[tokio::test]
#[traced_test]
async fn fetch_fault_is_logged_as_warning() {
    let adapter = regex_leaf(StaticFetcher::failing(FetchError::Status(500))).await;
    adapter.evaluate().await.unwrap();

    assert!(logs_contain("adapter.fault"));
    assert!(logs_contain("WARN"));
    assert!(logs_contain("HTTP error! status: 500"));
}

#[tokio::test]
#[traced_test]
async fn evaluation_runs_inside_a_span() {
    let adapter = regex_leaf(StaticFetcher::always("<b>ok</b>")).await;
    adapter.evaluate().await.unwrap();

    assert!(logs_contain("veracity.evaluate"));
    assert!(logs_contain("evaluation.completed"));
    assert!(logs_contain("obs-leaf"));
}

#[tokio::test]
#[traced_test]
async fn dispose_is_logged() {
    let adapter = regex_leaf(StaticFetcher::always("<b>ok</b>")).await;
    adapter.dispose().await;

    assert!(logs_contain("adapter.disposed"));
}
