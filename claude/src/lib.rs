//! Minimal Anthropic Claude API client.
//!
//! Text in, text out. Covers exactly what in-game NPC chatter needs from
//! the Messages API: a system prompt, a short alternating conversation and
//! a single non-streaming reply.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Errors that can occur when using the Claude client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured (set {API_KEY_VAR})")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Claude API client.
#[derive(Clone)]
pub struct Claude {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for Claude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Claude")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Claude {
    /// Create a client with the given API key and a 30 second request timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: build_http(Duration::from_secs(30)),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Create a client from the `ANTHROPIC_API_KEY` environment variable.
    /// An empty value counts as missing.
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(Error::NoApiKey),
        }
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = build_http(timeout);
        self
    }

    /// Point the client at another endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a request and return the reply.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        if request.turns.is_empty() {
            return Err(Error::Config("request has no messages".to_string()));
        }
        let body = self.wire_request(&request);

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;
        Ok(wire.into())
    }

    fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    fn wire_request<'a>(&'a self, request: &'a Request) -> WireRequest<'a> {
        WireRequest {
            model: request.model.as_deref().unwrap_or(&self.model),
            max_tokens: request.max_tokens,
            system: request.system.as_deref(),
            messages: request
                .turns
                .iter()
                .map(|t| WireMessage {
                    role: t.role.as_str(),
                    content: &t.text,
                })
                .collect(),
            temperature: request.temperature,
        }
    }
}

fn build_http(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

// ============================================================================
// Public types
// ============================================================================

/// A completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub model: Option<String>,
    pub max_tokens: usize,
    pub system: Option<String>,
    pub turns: Vec<Turn>,
    pub temperature: Option<f32>,
}

impl Request {
    /// Create a request from a conversation. The last turn should be the user's.
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            model: None,
            max_tokens: 256,
            system: None,
            turns,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A reply from Claude.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: String,
    pub model: String,
    /// Text blocks concatenated in order.
    pub text: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    Other,
}

impl From<Option<&str>> for StopReason {
    fn from(reason: Option<&str>) -> Self {
        match reason {
            Some("end_turn") => StopReason::EndTurn,
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            _ => StopReason::Other,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    id: String,
    model: String,
    content: Vec<WireBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

/// Only text blocks matter here; anything else is skipped.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl From<WireResponse> for Response {
    fn from(wire: WireResponse) -> Self {
        let text = wire
            .content
            .into_iter()
            .filter_map(|block| match block {
                WireBlock::Text { text } => Some(text),
                WireBlock::Other => None,
            })
            .collect::<String>();
        Response {
            id: wire.id,
            model: wire.model,
            text,
            stop_reason: StopReason::from(wire.stop_reason.as_deref()),
            usage: wire.usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let client = Claude::new("test-key");
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url, API_BASE);

        let client = client
            .with_model("claude-3-5-haiku-latest")
            .with_base_url("http://localhost:9000/v1/");
        assert_eq!(client.model(), "claude-3-5-haiku-latest");
        assert_eq!(client.base_url, "http://localhost:9000/v1");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = Claude::new("sk-secret");
        assert!(!format!("{client:?}").contains("sk-secret"));
    }

    #[test]
    fn test_wire_request_shape() {
        let client = Claude::new("test-key");
        let request = Request::new(vec![Turn::user("Hello"), Turn::assistant("Meow")])
            .with_system("You are a cat")
            .with_max_tokens(100)
            .with_temperature(0.5);

        let json = serde_json::to_value(client.wire_request(&request)).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["system"], "You are a cat");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Meow");
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    fn test_wire_request_omits_unset_fields() {
        let client = Claude::new("test-key");
        let request = Request::new(vec![Turn::user("Hi")]).with_model("other-model");
        let json = serde_json::to_value(client.wire_request(&request)).unwrap();
        assert_eq!(json["model"], "other-model");
        assert!(json.get("system").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let raw = r#"{
            "id": "msg_1",
            "model": "claude-test",
            "content": [
                {"type": "text", "text": "Meow. "},
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "Hurry up."}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 5}
        }"#;
        let wire: WireResponse = serde_json::from_str(raw).unwrap();
        let response = Response::from(wire);
        assert_eq!(response.text, "Meow. Hurry up.");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(StopReason::from(Some("max_tokens")), StopReason::MaxTokens);
        assert_eq!(StopReason::from(Some("tool_use")), StopReason::Other);
        assert_eq!(StopReason::from(None), StopReason::Other);
    }
}
