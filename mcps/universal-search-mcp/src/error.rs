//! Error types for universal search
//!
//! Backends report failures as [`BackendError`]. Those never leave a
//! provider: the fail-open wrapper turns them into empty result lists.
//! [`SearchError`] and [`LookupError`] are what callers of the search
//! service and the ISBN lookup can see.

use std::time::Duration;
use thiserror::Error;

/// Failures inside a single provider backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// Provider requires an API key and none is configured
    #[error("API key not configured")]
    MissingCredential,

    /// Transport-level failure (connect, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("provider returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Leading part of the response body
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    Decode(String),

    /// Provider did not answer within the configured timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Building a request URL failed
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors surfaced by the search service
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SearchError {
    /// Query is empty after trimming whitespace
    #[error("query must not be empty")]
    EmptyQuery,
}

/// Errors surfaced by the ISBN book-details lookup
#[derive(Error, Debug)]
pub enum LookupError {
    /// ISBN is empty after trimming whitespace
    #[error("ISBN must not be empty")]
    EmptyIsbn,

    /// One of the lookup providers failed
    #[error("{provider} lookup failed: {source}")]
    Provider {
        /// Provider tag
        provider: &'static str,
        /// Underlying backend failure
        #[source]
        source: BackendError,
    },
}
