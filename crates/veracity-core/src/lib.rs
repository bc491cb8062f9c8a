//! Veracity Core: truth adapter contract and composition engine
//!
//! Every truth source (a date check, a regex over a fetched page, a CSS
//! selector, a numeric range) implements [`TruthAdapter`]:
//! `configure` → `evaluate` → `dispose`. The [`ChainedAdapter`] composes two
//! adapters into a short-circuiting AND and may rewrite the second stage's
//! configuration from the first stage's result.
//!
//! ## Key Components
//!
//! - `AdapterConfig` / `AdapterResult`: the value records crossing the contract
//! - `TruthAdapter`: the async capability trait
//! - `ChainedAdapter`: the two-stage engine; nest chains for deeper pipelines
//! - `JsonAdapter` / `Prebound`: JSON-configured, type-erased stages
//! - `fakes`: in-memory adapters for tests

mod adapter;
pub mod chained;
mod config;
mod erased;
mod error;
pub mod fakes;
pub mod obs;
mod result;
pub mod telemetry;

pub use adapter::{DynAdapter, TruthAdapter};
pub use chained::{
    ChainParams, ChainedAdapter, ChainedAdapterConfig, TransformFn, SOURCE_FALSE_REASON,
};
pub use config::{AdapterConfig, JsonParams};
pub use erased::{JsonAdapter, Prebound};
pub use error::{AdapterError, Result, TransformError};
pub use result::{
    AdapterResult, Metadata, ERROR_KEY, NOT_CONFIGURED, REASON_KEY, SOURCE_RESULT_KEY,
    TARGET_RESULT_KEY,
};
pub use telemetry::init_tracing;
