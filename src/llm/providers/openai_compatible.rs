//! OpenAI-compatible chat completion provider (`/chat/completions`).
//!
//! Serves DeepSeek, Volcano Engine, Kimi and Zhipu GLM, which all accept the
//! same request shape. Wire types are private to this module.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{ChatRequest, ProviderError};

use super::read_error_body;

/// Returned when a successful response carries no first-choice content.
pub const NO_CONTENT: &str = "No response content.";

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for one HTTP endpoint implementing chat completions.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiCompatibleProvider {
    /// `api_key` is sent as `Authorization: Bearer <key>`.
    pub fn new(client: Client, endpoint: String, model: String, api_key: String) -> Self {
        Self { client, endpoint, model, api_key }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One round-trip: `system` + `user` messages, no streaming.
    pub async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, ProviderError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: [
                Message { role: "system", content: request.system_instruction },
                Message { role: "user", content: request.prompt },
            ],
            temperature: request.temperature,
            stream: false,
        };

        debug!(
            endpoint = %self.endpoint,
            model = %payload.model,
            temperature = payload.temperature,
            prompt_len = request.prompt.len(),
            "sending chat completion request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full chat completion payload");
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "chat completion request failed (transport)");
                ProviderError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(ProviderError::Status { status: status.as_u16(), body });
        }

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize chat completion response");
            ProviderError::Malformed(e.to_string())
        })?;

        debug!(choices = parsed.choices.len(), "received chat completion response");

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_CONTENT.to_string()))
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
