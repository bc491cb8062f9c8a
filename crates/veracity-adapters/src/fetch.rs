//! Page fetching for the markup-based adapters.
//!
//! Adapters depend on the [`PageFetcher`] trait; [`HttpFetcher`] is the
//! reqwest-backed implementation and `fakes::StaticFetcher` scripts
//! responses for tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;

/// Default per-request timeout when neither the adapter nor the environment sets one.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Retrieves the body of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its body as text.
    ///
    /// `timeout` bounds the whole request; `None` means the fetcher's default.
    async fn fetch(&self, url: &str, timeout: Option<Duration>) -> Result<String, FetchError>;
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpFetcherConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Request timeout used when the adapter does not set one (milliseconds)
    pub default_timeout_ms: u64,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        HttpFetcherConfig {
            user_agent: concat!("veracity/", env!("CARGO_PKG_VERSION")).to_string(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl HttpFetcherConfig {
    /// Read `VERACITY_USER_AGENT` and `VERACITY_HTTP_TIMEOUT_MS`, falling back
    /// to the defaults for unset or unparseable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        HttpFetcherConfig {
            user_agent: std::env::var("VERACITY_USER_AGENT").unwrap_or(defaults.user_agent),
            default_timeout_ms: std::env::var("VERACITY_HTTP_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_timeout_ms),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// reqwest-backed [`PageFetcher`].
///
/// Holds one connection pool; share it between adapters with an `Arc`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    config: HttpFetcherConfig,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(HttpFetcher { config, client })
    }

    /// Create a fetcher from environment variables
    pub fn from_env() -> Result<Self, FetchError> {
        Self::new(HttpFetcherConfig::from_env())
    }

    pub fn config(&self) -> &HttpFetcherConfig {
        &self.config
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout.as_millis() as u64)
    } else {
        FetchError::Request(err.to_string())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Option<Duration>) -> Result<String, FetchError> {
        let timeout = timeout.unwrap_or_else(|| self.config.default_timeout());
        debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "Fetching page");

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| classify(e, timeout))
    }
}
