//! Pipeline error types.
//!
//! Only unrecoverable conditions live here. Critique failures, research
//! failures, and notifier failures are absorbed by their own layers and
//! never surface as pipeline errors.

use thiserror::Error;

/// Unrecoverable pipeline failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The scouting search produced no leads at all.
    #[error("no event leads found for {city}")]
    NoLeads {
        /// City that was searched.
        city: String,
    },

    /// The pool has no uncovered, still-running events.
    #[error("no available events in the pool; run scout first")]
    NoAvailableEvents,

    /// A chosen or requested event id has no record behind it.
    #[error("event {id} does not exist in the pool")]
    UnknownEvent {
        /// The id that failed to resolve.
        id: String,
    },

    /// The reflection window contains no articles.
    #[error("no articles found in period {start} to {end}")]
    NoArticlesInPeriod {
        /// Period start (ISO 8601).
        start: String,
        /// Period end (ISO 8601).
        end: String,
    },

    /// A forced tool call came back with an input the schema forbids.
    #[error("invalid tool input: {0}")]
    InvalidToolInput(#[from] serde_json::Error),

    /// A required completion failed (draft, expansion, title, lede).
    #[error(transparent)]
    Llm(#[from] kiez_llm::LlmError),

    /// Record store failure.
    #[error(transparent)]
    Store(#[from] kiez_store::StoreError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
