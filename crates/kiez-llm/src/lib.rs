//! # kiez-llm
//!
//! Non-streaming client for the Anthropic Messages API.
//!
//! - Request/response types with a tagged content-block union
//! - Forced tool calls (`tool_choice: {type: "tool"}`) for structured
//!   output, with a lookup helper for the matching `tool_use` block
//! - Reqwest transport with bounded retry on 429/5xx/network failures
//! - [`CompletionService`] trait so callers can substitute scripted
//!   fakes in tests

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod types;

pub use client::{AnthropicClient, CompletionService, DEFAULT_BASE_URL};
pub use errors::{LlmError, Result};
pub use types::{
    CompletionRequest, ContentBlock, MessageParam, MessageResponse, Role, ToolChoice,
    ToolDefinition,
};
