//! Construction of JSON-configured leaf adapters by kind.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use veracity_core::{DynAdapter, JsonAdapter};

use crate::clock::{Clock, SystemClock};
use crate::date::DateAdapter;
use crate::fetch::PageFetcher;
use crate::html_regex::HtmlRegexAdapter;
use crate::numeric_range::NumericRangeAdapter;
use crate::selector::SelectorAdapter;

/// The leaf adapters this crate provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafKind {
    Date,
    Range,
    Html,
    Select,
}

impl LeafKind {
    pub const ALL: [LeafKind; 4] = [LeafKind::Date, LeafKind::Range, LeafKind::Html, LeafKind::Select];

    pub fn as_str(self) -> &'static str {
        match self {
            LeafKind::Date => "date",
            LeafKind::Range => "range",
            LeafKind::Html => "html",
            LeafKind::Select => "select",
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeafKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeafKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown adapter kind '{}'", s))
    }
}

/// Shared collaborators handed to every leaf built by [`LeafEnv::build`].
#[derive(Clone)]
pub struct LeafEnv {
    pub fetcher: Arc<dyn PageFetcher>,
    pub clock: Arc<dyn Clock>,
}

impl LeafEnv {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// A fresh, unconfigured adapter of `kind` behind a JSON parameter bag.
    pub fn build(&self, kind: LeafKind) -> Arc<DynAdapter> {
        match kind {
            LeafKind::Date => Arc::new(JsonAdapter::new(DateAdapter::with_clock(Arc::clone(
                &self.clock,
            )))),
            LeafKind::Range => Arc::new(JsonAdapter::new(NumericRangeAdapter::new())),
            LeafKind::Html => Arc::new(JsonAdapter::new(HtmlRegexAdapter::new(Arc::clone(
                &self.fetcher,
            )))),
            LeafKind::Select => Arc::new(JsonAdapter::new(SelectorAdapter::new(Arc::clone(
                &self.fetcher,
            )))),
        }
    }
}
