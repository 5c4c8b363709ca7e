//! Notification error types.

use thiserror::Error;

/// Delivery failures. Callers treat these as non-fatal; publication
/// never depends on a notification going out.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level failure.
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The delivery API rejected the message.
    #[error("notification rejected ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it was readable.
        message: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NotifyError>;
