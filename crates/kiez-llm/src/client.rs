//! Reqwest transport for the Messages API, with bounded retry.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{LlmError, Result};
use crate::types::{CompletionRequest, MessageResponse};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Messages API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Transport attempts per request (1 initial + 2 retries).
const MAX_ATTEMPTS: u32 = 3;

/// Base delay for the linear backoff between attempts.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Anything that can run a completion request.
///
/// Agents depend on this trait, not on [`AnthropicClient`], so they can
/// be driven by scripted fakes in tests.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run one request to completion.
    async fn complete(&self, request: &CompletionRequest) -> Result<MessageResponse>;
}

/// API-key client for the Anthropic Messages API.
#[derive(Clone, Debug)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    /// Create a client against the production endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (tests, proxies).
    #[must_use]
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Create a client from `ANTHROPIC_API_KEY`, `None` if unset.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }

    async fn send_once(&self, request: &CompletionRequest) -> Result<MessageResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(LlmError::Api {
                status,
                message: parse_api_error(&body, status),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CompletionService for AnthropicClient {
    /// Run the request, retrying rate limits, server errors, and
    /// transport failures with linear backoff.
    async fn complete(&self, request: &CompletionRequest) -> Result<MessageResponse> {
        let mut attempt = 1;
        loop {
            match self.send_once(request).await {
                Ok(response) => {
                    debug!(model = %request.model, attempt, "completion ok");
                    return Ok(response);
                }
                Err(err) if attempt < MAX_ATTEMPTS && is_retryable(&err) => {
                    let delay = RETRY_BASE_DELAY * attempt;
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "completion failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Whether a failure is worth another attempt: 429, 5xx, or transport.
fn is_retryable(err: &LlmError) -> bool {
    match err {
        LlmError::Api { status, .. } => *status == 429 || *status >= 500,
        LlmError::Http(_) => true,
        _ => false,
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands the standard envelope `{"error": {"message", "type"}}`;
/// anything else falls back to the raw body.
fn parse_api_error(body: &str, status: u16) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = json["error"]["message"].as_str() {
            return msg.to_string();
        }
    }
    format!("HTTP {status}: {body}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageParam;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest::new("test-model", 256, vec![MessageParam::user("hi")])
    }

    fn ok_body() -> serde_json::Value {
        serde_json::json!({
            "content": [{"type": "text", "text": "hello"}],
            "model": "test-model",
            "stop_reason": "end_turn"
        })
    }

    #[tokio::test]
    async fn sends_headers_and_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "key-1"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::with_base_url("key-1", server.uri());
        let resp = client.complete(&request()).await.unwrap();
        assert_eq!(resp.first_text().unwrap(), "hello");
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"type": "invalid_request_error", "message": "bad request"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::with_base_url("k", server.uri());
        let err = client.complete(&request()).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad request");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn server_error_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::with_base_url("k", server.uri());
        let resp = client.complete(&request()).await.unwrap();
        assert_eq!(resp.first_text().unwrap(), "hello");
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(serde_json::json!({
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .expect(3)
            .mount(&server)
            .await;

        let client = AnthropicClient::with_base_url("k", server.uri());
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 529, .. }));
    }

    #[test]
    fn parse_api_error_falls_back_to_raw_body() {
        assert_eq!(parse_api_error("Overloaded", 529), "HTTP 529: Overloaded");
        assert_eq!(
            parse_api_error(r#"{"error":{"message":"nope"}}"#, 403),
            "nope"
        );
    }

    #[test]
    fn from_env_without_key_is_none() {
        // Key intentionally not set in the test environment.
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            assert!(AnthropicClient::from_env().is_none());
        }
    }
}
