//! HTTP client for the proxy's chat-completions endpoint.
//!
//! Sends the fixed diagnostic request shape (`model`, one user message,
//! `temperature`, `max_tokens`) with a bearer token and records wall-clock
//! latency per call. Response fields are all optional: the probes tolerate
//! partial bodies and report what was present.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProxyConfig;
use crate::error::{ProbeError, Result};

/// Completions endpoint path, appended to the configured base URL.
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// How much of an error body to keep in the report.
const ERROR_BODY_SNIPPET_LEN: usize = 200;

/// One chat message in the request or response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Response body; every field is optional so malformed or truncated
/// replies still produce an observation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub total_tokens: u64,
}

/// What one request revealed: who answered, what, how expensively, how fast.
#[derive(Debug, Clone)]
pub struct ChatObservation {
    /// Model name the proxy reported, or `unknown`.
    pub model: String,
    /// First choice's message content, when present.
    pub content: Option<String>,
    /// Total token usage the proxy reported; 0 when absent.
    pub total_tokens: u64,
    /// Wall-clock time for the full request.
    pub elapsed: Duration,
}

impl ChatObservation {
    fn from_response(response: ChatResponse, elapsed: Duration) -> Self {
        Self {
            model: response.model.unwrap_or_else(|| "unknown".to_string()),
            content: response
                .choices
                .first()
                .and_then(|c| c.message.as_ref())
                .map(|m| m.content.clone()),
            total_tokens: response.usage.map(|u| u.total_tokens).unwrap_or(0),
            elapsed,
        }
    }
}

/// Client bound to one proxy endpoint and request shape.
pub struct ProxyClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl std::fmt::Debug for ProxyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl ProxyClient {
    /// Build from the `[proxy]` config section.
    pub fn from_config(cfg: &ProxyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        })
    }

    /// The resolved completions URL.
    pub fn completions_url(&self) -> String {
        format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH)
    }

    /// The model name requests ask for.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one chat request with the given user prompt and time it.
    pub async fn chat(&self, prompt: &str) -> Result<ChatObservation> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = self.completions_url();
        debug!(url = %url, model = %self.model, "sending chat request");

        let mut request = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let elapsed = start.elapsed();

        if !status.is_success() {
            return Err(ProbeError::ProxyStatus {
                status: status.as_u16(),
                body: snippet(&text),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ProbeError::Parse(format!("unexpected chat response: {}", e)))?;
        Ok(ChatObservation::from_response(parsed, elapsed))
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= ERROR_BODY_SNIPPET_LEN {
        return trimmed.to_string();
    }
    let mut end = ERROR_BODY_SNIPPET_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ProxyClient {
        ProxyClient::from_config(&ProxyConfig::default()).unwrap()
    }

    #[test]
    fn test_completions_url_joins_without_double_slash() {
        let cfg = ProxyConfig {
            base_url: "http://localhost:4000/".to_string(),
            ..Default::default()
        };
        let client = ProxyClient::from_config(&cfg).unwrap();
        assert_eq!(
            client.completions_url(),
            "http://localhost:4000/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let cfg = ProxyConfig {
            api_key: "sk-supersecret".to_string(),
            ..Default::default()
        };
        let client = ProxyClient::from_config(&cfg).unwrap();
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: 0.1,
            max_tokens: 10,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert_eq!(json["max_tokens"], 10);
    }

    #[test]
    fn test_full_response_parses() {
        let raw = r#"{
            "model": "local-glm-4-5-air-mlx",
            "choices": [{"message": {"role": "assistant", "content": "Paris"}}],
            "usage": {"prompt_tokens": 18, "completion_tokens": 2, "total_tokens": 20}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let obs = ChatObservation::from_response(parsed, Duration::from_millis(120));
        assert_eq!(obs.model, "local-glm-4-5-air-mlx");
        assert_eq!(obs.content.as_deref(), Some("Paris"));
        assert_eq!(obs.total_tokens, 20);
    }

    #[test]
    fn test_partial_response_tolerated() {
        let parsed: ChatResponse = serde_json::from_str("{}").unwrap();
        let obs = ChatObservation::from_response(parsed, Duration::ZERO);
        assert_eq!(obs.model, "unknown");
        assert_eq!(obs.content, None);
        assert_eq!(obs.total_tokens, 0);
    }

    #[test]
    fn test_choice_without_message_tolerated() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": [{}]}"#).unwrap();
        let obs = ChatObservation::from_response(parsed, Duration::ZERO);
        assert_eq!(obs.content, None);
    }

    #[test]
    fn test_snippet_short_body_untouched() {
        assert_eq!(snippet("  short body \n"), "short body");
    }

    #[test]
    fn test_snippet_truncates_long_body() {
        let long = "x".repeat(500);
        let s = snippet(&long);
        assert!(s.ends_with("..."));
        assert_eq!(s.len(), ERROR_BODY_SNIPPET_LEN + 3);
    }

    #[test]
    fn test_model_accessor() {
        assert_eq!(client().model(), "local-glm-4-5-air-mlx");
    }
}
