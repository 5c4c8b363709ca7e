//! Search error types.

use thiserror::Error;

/// Errors from the search client.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport-level failure.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search API returned a non-2xx status.
    #[error("search api error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The response body did not parse.
    #[error("malformed search response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;
