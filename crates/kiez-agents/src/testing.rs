//! Scripted completion service shared by the agent tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use kiez_llm::{
    CompletionRequest, CompletionService, ContentBlock, LlmError, MessageResponse,
};

/// A completion service that replays a queue of scripted responses and
/// records every request it saw.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<MessageResponse, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<Result<MessageResponse, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request seen so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<MessageResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted llm ran out of responses")
    }
}

/// A plain text response.
pub fn text_response(text: &str) -> MessageResponse {
    MessageResponse {
        content: vec![ContentBlock::Text { text: text.into() }],
        model: "test-model".into(),
        stop_reason: Some("end_turn".into()),
    }
}

/// A response whose only content is a `tool_use` block.
pub fn tool_response(name: &str, input: Value) -> MessageResponse {
    let input = input
        .as_object()
        .expect("tool input must be a JSON object")
        .clone();
    MessageResponse {
        content: vec![ContentBlock::ToolUse {
            id: "toolu_test".into(),
            name: name.into(),
            input,
        }],
        model: "test-model".into(),
        stop_reason: Some("tool_use".into()),
    }
}

/// A transport-level failure.
pub fn api_error(status: u16) -> LlmError {
    LlmError::Api {
        status,
        message: "scripted failure".into(),
    }
}

/// A body of exactly `words` whitespace-separated tokens.
pub fn text_of_words(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}
