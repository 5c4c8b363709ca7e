//! # kiez-research
//!
//! Web search plumbing for the editorial pipeline:
//!
//! - [`TavilyClient`] and the [`SearchClient`] trait it implements
//! - [`research_event`]: concurrent four-angle research with per-query
//!   retry and degrade-to-empty semantics
//! - [`fetch_event_leads`]: the broad scouting search

#![deny(unsafe_code)]

pub mod errors;
pub mod leads;
pub mod research;
pub mod tavily;

pub use errors::{Result, SearchError};
pub use leads::{EventLead, fetch_event_leads};
pub use research::research_event;
pub use tavily::{SearchClient, SearchDepth, SearchRequest, SearchResult, TavilyClient};
