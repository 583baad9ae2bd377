//! Native Gemini provider (`models/<model>:generateContent`).
//!
//! The system instruction travels in its own field rather than as a chat
//! message, and the key is sent in the `x-goog-api-key` header.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::llm::{ChatRequest, ProviderError};

use super::read_error_body;

/// Returned when a successful response carries no text.
pub const NO_RESPONSE: &str = "No response.";

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    /// Models base URL, e.g. `https://generativelanguage.googleapis.com/v1beta/models`.
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(client: Client, base_url: String, model: String, api_key: String) -> Self {
        Self { client, base_url, model, api_key }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }

    pub async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, ProviderError> {
        let payload = GenerateContentRequest {
            contents: [Content { role: Some("user"), parts: [Part { text: request.prompt }] }],
            system_instruction: Content {
                role: None,
                parts: [Part { text: request.system_instruction }],
            },
            generation_config: GenerationConfig { temperature: request.temperature },
        };

        let url = self.url();
        debug!(
            %url,
            temperature = request.temperature,
            prompt_len = request.prompt.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "generateContent request failed (transport)");
                ProviderError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(ProviderError::Status { status: status.as_u16(), body });
        }

        let parsed = response.json::<GenerateContentResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize generateContent response");
            ProviderError::Malformed(e.to_string())
        })?;

        let text = parsed.text();
        debug!(text_len = text.len(), "received generateContent response");
        if text.is_empty() {
            Ok(NO_RESPONSE.to_string())
        } else {
            Ok(text)
        }
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    system_instruction: Content<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default()
    }
}
