//! LLM Client: the single point of entry for all Claude API calls in the tailor service.
//!
//! ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
//! Everything above this layer talks to a `ModelTransport`, never to reqwest.
//!
//! Model: claude-sonnet-4-20250514 (hardcoded, do not make configurable to prevent drift)

use std::fmt;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every transformation.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed: {status} {message}")]
    Api {
        status: u16,
        /// Machine-readable error type from the response body, e.g. `rate_limit_error`.
        kind: Option<String>,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    /// A failure surfaced only as text, with no status or error type attached.
    #[allow(dead_code)]
    #[error("{0}")]
    Transport(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Credential
// ────────────────────────────────────────────────────────────────────────────

/// An API key, pre-encoded as the `x-api-key` header value.
///
/// Never printed: `Debug` is redacted and the header is flagged sensitive so
/// that reqwest/hyper tracing does not record it either.
#[derive(Clone)]
pub struct Credential {
    header: HeaderValue,
}

impl Credential {
    /// Builds a credential from a raw key. Only checks that the key can be sent;
    /// whether the service accepts it is learned on the first real request.
    pub fn new(raw: &str) -> Result<Self, LlmError> {
        if raw.is_empty() {
            return Err(LlmError::MalformedCredential(
                "API key must not be empty".to_string(),
            ));
        }

        let mut header = HeaderValue::from_str(raw).map_err(|_| {
            LlmError::MalformedCredential(
                "API key contains characters that cannot be sent in a header".to_string(),
            )
        })?;
        header.set_sensitive(true);

        Ok(Self { header })
    }

    pub(crate) fn header_value(&self) -> &HeaderValue {
        &self.header
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

/// One request to the Messages API: a model, an output bound, one user turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    pub model: &'static str,
    pub max_tokens: u32,
    pub messages: Vec<ModelMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMessage {
    pub role: &'static str,
    pub content: String,
}

impl ModelRequest {
    pub fn user_prompt(prompt: String, max_tokens: u32) -> Self {
        Self {
            model: MODEL,
            max_tokens,
            messages: vec![ModelMessage {
                role: "user",
                content: prompt,
            }],
        }
    }

    /// The assembled prompt carried by the single user turn.
    pub fn prompt(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub block_type: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter(|b| b.block_type.as_deref().map_or(true, |t| t == "text"))
            .find_map(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Transport
// ────────────────────────────────────────────────────────────────────────────

/// Sends one prompt to the model service and returns the first text segment.
///
/// Carried by `TransformationClient` as `Arc<dyn ModelTransport>` so prompt
/// building and failure classification never depend on the HTTP client.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn send(&self, credential: &Credential, request: &ModelRequest)
        -> Result<String, LlmError>;
}

/// Calls the Anthropic Messages API over HTTPS. Single attempt, no retries.
#[derive(Clone)]
pub struct AnthropicTransport {
    client: Client,
    api_url: String,
}

impl AnthropicTransport {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl ModelTransport for AnthropicTransport {
    async fn send(
        &self,
        credential: &Credential,
        request: &ModelRequest,
    ) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", credential.header_value().clone())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}", status);
            return Err(api_error(status.as_u16(), body));
        }

        let body = response.text().await?;
        let llm_response: LlmResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        llm_response
            .text()
            .map(str::to_owned)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Builds an `LlmError::Api` from a non-2xx body, keeping the service's error
/// type when the body is the documented `{"error": {...}}` shape.
fn api_error(status: u16, body: String) -> LlmError {
    match serde_json::from_str::<AnthropicError>(&body) {
        Ok(parsed) => LlmError::Api {
            status,
            kind: parsed.error.kind,
            message: parsed.error.message,
        },
        Err(_) => LlmError::Api {
            status,
            kind: None,
            message: body,
        },
    }
}
