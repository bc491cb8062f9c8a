//! Error types for veracity-adapters

use thiserror::Error;

/// Failures while fetching a page.
///
/// These never escape `evaluate`: adapters fold them into a false result
/// whose `error` metadata is this error's message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Server answered with a non-success status
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// No complete response within the allotted time (milliseconds)
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Connection, DNS, TLS or body decoding failure
    #[error("{0}")]
    Request(String),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
