//! Request and response types mirroring the Anthropic Messages API
//! (non-streaming).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{LlmError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Message author role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The caller.
    User,
    /// The model.
    Assistant,
}

/// One conversation message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageParam {
    /// Author role.
    pub role: Role,
    /// Plain-text content.
    pub content: String,
}

impl MessageParam {
    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message (for replaying prior turns).
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A tool the model may (or must) call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// What the tool is for.
    pub description: String,
    /// JSON Schema of the tool input.
    pub input_schema: Value,
}

/// Tool choice directive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    /// Model decides whether to call a tool.
    Auto,
    /// Model must call the named tool.
    Tool {
        /// Name of the required tool.
        name: String,
    },
}

/// A non-streaming completion request.
#[derive(Clone, Debug, Serialize)]
pub struct CompletionRequest {
    /// Model id.
    pub model: String,
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Conversation messages.
    pub messages: Vec<MessageParam>,
    /// Available tools.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    /// Tool choice directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl CompletionRequest {
    /// A plain text request with no tools.
    #[must_use]
    pub fn new(model: impl Into<String>, max_tokens: u32, messages: Vec<MessageParam>) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            system: None,
            messages,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    /// Set the system prompt.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Force a call to the given tool.
    #[must_use]
    pub fn with_forced_tool(mut self, tool: ToolDefinition) -> Self {
        self.tool_choice = Some(ToolChoice::Tool {
            name: tool.name.clone(),
        });
        self.tools = vec![tool];
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

/// One block of response content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// A tool invocation by the model.
    ToolUse {
        /// Block id.
        id: String,
        /// Name of the invoked tool.
        name: String,
        /// Tool input object.
        input: Map<String, Value>,
    },
    /// Any block type this client does not interpret (thinking, images).
    #[serde(other)]
    Unknown,
}

/// A complete (non-streaming) Messages API response.
#[derive(Clone, Debug, Deserialize)]
pub struct MessageResponse {
    /// Response content blocks.
    pub content: Vec<ContentBlock>,
    /// Model that produced the response.
    #[serde(default)]
    pub model: String,
    /// Why generation stopped.
    #[serde(default)]
    pub stop_reason: Option<String>,
}

impl MessageResponse {
    /// The first text block.
    pub fn first_text(&self) -> Result<&str> {
        self.content
            .iter()
            .find_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .ok_or(LlmError::EmptyResponse)
    }

    /// The input of the first `tool_use` block with the given name.
    pub fn tool_input(&self, name: &str) -> Result<&Map<String, Value>> {
        self.content
            .iter()
            .find_map(|b| match b {
                ContentBlock::ToolUse {
                    name: tool_name,
                    input,
                    ..
                } if tool_name == name => Some(input),
                _ => None,
            })
            .ok_or_else(|| LlmError::MissingToolCall {
                name: name.to_string(),
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text_response(text: &str) -> MessageResponse {
        MessageResponse {
            content: vec![ContentBlock::Text { text: text.into() }],
            model: "m".into(),
            stop_reason: Some("end_turn".into()),
        }
    }

    // ── Serialization ───────────────────────────────────────────────

    #[test]
    fn request_omits_empty_tools_and_system() {
        let req = CompletionRequest::new("m", 1024, vec![MessageParam::user("hi")]);
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("system").is_none());
        assert!(json.get("tool_choice").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn forced_tool_serializes_choice() {
        let tool = ToolDefinition {
            name: "pick".into(),
            description: "pick something".into(),
            input_schema: serde_json::json!({"type": "object"}),
        };
        let req = CompletionRequest::new("m", 64, vec![MessageParam::user("go")])
            .with_forced_tool(tool);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["tool_choice"]["type"], "tool");
        assert_eq!(json["tool_choice"]["name"], "pick");
        assert_eq!(json["tools"][0]["name"], "pick");
    }

    // ── Response parsing ────────────────────────────────────────────

    #[test]
    fn content_blocks_parse_by_tag() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "hello"},
                {"type": "tool_use", "id": "t1", "name": "pick", "input": {"k": 1}}
            ],
            "model": "m",
            "stop_reason": "tool_use"
        }"#;
        let resp: MessageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_text().unwrap(), "hello");
        assert_eq!(resp.tool_input("pick").unwrap()["k"], 1);
    }

    #[test]
    fn unknown_block_types_are_tolerated() {
        let json = r#"{
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "after"}
            ]
        }"#;
        let resp: MessageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.content[0], ContentBlock::Unknown);
        assert_eq!(resp.first_text().unwrap(), "after");
    }

    #[test]
    fn first_text_on_empty_content_errors() {
        let resp = MessageResponse {
            content: vec![],
            model: String::new(),
            stop_reason: None,
        };
        assert!(matches!(resp.first_text(), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn tool_input_requires_matching_name() {
        let resp = text_response("no tools here");
        let err = resp.tool_input("pick").unwrap_err();
        assert!(matches!(err, LlmError::MissingToolCall { name } if name == "pick"));
    }

    #[test]
    fn tool_input_skips_other_tools() {
        let json = r#"{
            "content": [
                {"type": "tool_use", "id": "a", "name": "other", "input": {}},
                {"type": "tool_use", "id": "b", "name": "pick", "input": {"x": true}}
            ]
        }"#;
        let resp: MessageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.tool_input("pick").unwrap()["x"], true);
    }
}
