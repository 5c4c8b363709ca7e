//! The editorial agents: scout, curator, author, and reflector.
//!
//! Each agent is a free async function over the shared service traits
//! ([`kiez_llm::CompletionService`], [`kiez_research::SearchClient`]) and
//! the record store, so tests drive them with scripted fakes and the
//! binary wires in the real clients.
//!
//! - [`scout::scout_events`] — web search to candidate events.
//! - [`curator::curate_event`] — pick today's event from the pool.
//! - [`author::write_article`] — draft, critique, expand, lede.
//! - [`reflector::write_reflection`] — periodic self-analysis essay.

pub mod author;
pub mod curator;
pub mod errors;
pub mod prompts;
pub mod reflector;
pub mod scout;

#[cfg(test)]
pub(crate) mod testing;

pub use author::write_article;
pub use curator::curate_event;
pub use errors::{PipelineError, Result};
pub use reflector::write_reflection;
pub use scout::scout_events;
