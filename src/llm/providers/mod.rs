//! LLM provider implementations.
//!
//! `build(info, model, api_key, client)` is the factory, called once per
//! request after the dispatcher has resolved the model and key.

pub mod gemini;
pub mod openai_compatible;

use reqwest::Client;
use tracing::warn;

use crate::llm::{LlmProvider, ProviderFamily, ProviderInfo};

/// Construct the provider for a catalog entry.
pub fn build(info: &ProviderInfo, model: String, api_key: String, client: Client) -> LlmProvider {
    let endpoint = info.endpoint.clone();
    match info.id.family() {
        ProviderFamily::Native => {
            LlmProvider::Gemini(gemini::GeminiProvider::new(client, endpoint, model, api_key))
        }
        ProviderFamily::OpenAiCompatible => LlmProvider::OpenAiCompatible(
            openai_compatible::OpenAiCompatibleProvider::new(client, endpoint, model, api_key),
        ),
    }
}

/// Read a non-2xx body as JSON, substituting `{}` when it is unreadable or
/// not JSON.
pub(crate) async fn read_error_body(response: reqwest::Response) -> serde_json::Value {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text)
        .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
    warn!(%status, %body, "provider returned HTTP error");
    body
}
