//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the record store.
///
/// A malformed or unreadable record file fails the whole scan it was part
/// of — the pool is small and hand-inspectable, so surfacing the broken
/// file beats silently skipping it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error with the path that caused it.
    #[error("io error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A record file exists but does not parse as the expected shape.
    #[error("malformed record {path}: {source}")]
    Malformed {
        /// The offending record file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A record failed to serialize (programming error, not disk state).
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The atomic rename of a temp file onto its final path failed.
    #[error("failed to persist record: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// An operation referenced an event id with no record behind it.
    #[error("event {id} not found in pool")]
    MissingEvent {
        /// The id that failed to resolve.
        id: String,
    },
}

impl StoreError {
    /// Attach a path to an I/O error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
