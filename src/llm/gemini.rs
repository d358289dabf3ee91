//! Google Gemini `generateContent` driver.
//!
//! This module implements the [`LlmDriver`] trait for the Generative Language
//! API. Each call sends the whole conversation and waits for the complete
//! reply; there is no streaming.

use std::time::Duration;

use serde_json::{Value, json};

use crate::error::{BackendError, ConfigError};

use super::{LlmDriver, LlmRequest, Message, MessageRole};

/// Default API root for the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Connection and model settings for [`GeminiDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    /// API root, without the `/models` suffix.
    pub base_url: String,
    /// Model identifier (e.g., `gemini-pro`).
    pub model: String,
    /// Whole-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiSettings {
    /// Build the `generateContent` URL for the configured model.
    #[must_use]
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Driver for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiDriver {
    http: reqwest::Client,
    settings: GeminiSettings,
}

impl std::fmt::Debug for GeminiDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl GeminiDriver {
    /// Create a new driver with the given settings.
    pub fn new(settings: GeminiSettings) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { http, settings })
    }
}

#[async_trait::async_trait]
impl LlmDriver for GeminiDriver {
    async fn generate(&self, req: LlmRequest<'_>) -> Result<String, BackendError> {
        let url = self.settings.generate_url();
        let body = build_request_body(req.history, req.prompt, req.settings.creativity.temperature());

        tracing::debug!(
            model = %self.settings.model,
            history_len = req.history.len(),
            temperature = req.settings.creativity.temperature(),
            "Gemini API request"
        );

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", req.api_key.expose())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::RateLimited);
        }
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::debug!(status = status.as_u16(), error = %e, "Unreadable error body");
                    None
                }
            };
            return Err(status_error(status, body.as_deref()));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        parse_response(&json)
    }
}

/// Build the JSON request body: prior turns, then the new prompt.
fn build_request_body(history: &[Message], prompt: &str, temperature: f64) -> Value {
    let contents: Vec<Value> = history
        .iter()
        .map(|m| {
            let role = match m.role() {
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            json!({ "role": role, "parts": [{ "text": m.text() }] })
        })
        .chain(std::iter::once(
            json!({ "role": "user", "parts": [{ "text": prompt }] }),
        ))
        .collect();

    json!({
        "contents": contents,
        "generationConfig": { "temperature": temperature }
    })
}

/// Extract the reply text from a `generateContent` response.
fn parse_response(json: &Value) -> Result<String, BackendError> {
    let Some(first) = json["candidates"].as_array().and_then(|c| c.first()) else {
        if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
            return Err(BackendError::Blocked(reason.to_string()));
        }
        return Err(BackendError::MalformedResponse(
            "no candidates in response".to_string(),
        ));
    };

    let text: String = first["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = first["finishReason"].as_str().unwrap_or("UNKNOWN");
        if reason == "SAFETY" {
            return Err(BackendError::Blocked(reason.to_string()));
        }
        return Err(BackendError::MalformedResponse(format!(
            "candidate has no text (finish reason: {reason})"
        )));
    }

    Ok(text)
}

/// Error for a non-success status. Falls back to the status reason when the
/// body is missing or empty.
fn status_error(status: reqwest::StatusCode, body: Option<&str>) -> BackendError {
    let message = body
        .map(api_error_message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("no error details")
                .to_string()
        });
    BackendError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(ToString::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
