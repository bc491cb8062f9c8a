//! Veracity Adapters: leaf truth sources
//!
//! Each adapter implements `veracity_core::TruthAdapter` and can be used on
//! its own or as a stage of a `ChainedAdapter`:
//!
//! - [`DateAdapter`]: is today a given (optionally yearly recurring) date
//! - [`NumericRangeAdapter`]: does a value lie within a range
//! - [`HtmlRegexAdapter`]: does a regex match a fetched page
//! - [`SelectorAdapter`]: what does a CSS selector extract from a fetched page
//!
//! Network access goes through the [`PageFetcher`] trait and time through
//! [`Clock`], so both can be replaced by the in-memory `fakes`.

mod clock;
mod date;
mod error;
mod factory;
mod fetch;
mod html_regex;
mod numeric_range;
mod selector;
mod slot;

pub mod fakes;

pub use clock::{Clock, SystemClock};
pub use date::{parse_target_date, DateAdapter, DateParams};
pub use error::FetchError;
pub use factory::{LeafEnv, LeafKind};
pub use fetch::{HttpFetcher, HttpFetcherConfig, PageFetcher, DEFAULT_TIMEOUT_MS};
pub use html_regex::{HtmlRegexAdapter, HtmlRegexParams};
pub use numeric_range::{NumericRangeAdapter, NumericRangeParams, MISSING_BOUNDS};
pub use selector::{extract, SelectorAdapter, SelectorParams, EXTRACTED_ATTRIBUTE_KEY};

/// Metadata key holding the value a page adapter extracted.
pub const MATCHED_VALUE_KEY: &str = "matchedValue";

/// Fault reported when a page adapter finds nothing to extract.
pub const NO_MATCH: &str = "No match found";
