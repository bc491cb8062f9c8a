//! In-memory fakes for the fetch and clock seams (testing only)

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::clock::Clock;
use crate::error::FetchError;
use crate::fetch::PageFetcher;

/// A request seen by [`StaticFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub timeout: Option<Duration>,
}

/// Fetcher replaying scripted responses in order.
///
/// Once the script runs out, the fallback response (if any) is repeated;
/// otherwise the fetch fails with a request error.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    script: Mutex<VecDeque<Result<String, FetchError>>>,
    fallback: Option<Result<String, FetchError>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher answering every request with `body`.
    pub fn always(body: impl Into<String>) -> Self {
        Self {
            fallback: Some(Ok(body.into())),
            ..Self::default()
        }
    }

    /// Fetcher failing every request with `error`.
    pub fn failing(error: FetchError) -> Self {
        Self {
            fallback: Some(Err(error)),
            ..Self::default()
        }
    }

    pub fn push_body(&self, body: impl Into<String>) -> &Self {
        self.script.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    pub fn push_error(&self, error: FetchError) -> &Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, timeout: Option<Duration>) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(FetchRequest {
            url: url.to_string(),
            timeout,
        });
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted.or_else(|| self.fallback.clone()) {
            Some(response) => response,
            None => Err(FetchError::Request(format!("no scripted response for {}", url))),
        }
    }
}

/// Clock frozen at a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock at noon UTC of the given day.
    pub fn on(year: i32, month: u32, day: u32) -> Self {
        let now = Utc
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("invalid fixed date {}-{}-{}", year, month, day));
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
