//! Settings error types.

use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file contains invalid JSON or an invalid shape.
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SettingsError>;
