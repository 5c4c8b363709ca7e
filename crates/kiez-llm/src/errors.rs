//! LLM client error types.

use thiserror::Error;

/// Errors from the completion client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (connection, timeout, body read).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-2xx status after retries were exhausted.
    #[error("api error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message parsed from the error envelope, or the raw body.
        message: String,
    },

    /// The response body did not parse as a Messages API response.
    #[error("malformed api response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The response carried no text content block.
    #[error("response contained no text content")]
    EmptyResponse,

    /// A forced tool call did not come back.
    #[error("response contained no tool_use block named {name}")]
    MissingToolCall {
        /// The tool that was requested.
        name: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LlmError>;
