//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over the two provider families: the native
//! Gemini generate-content API and the OpenAI-compatible chat completion
//! endpoints (DeepSeek, Volcano, Kimi, GLM). Add a variant + module in
//! `providers/` for each additional family.
//!
//! Provider values are built per request from the catalog entry, the
//! resolved model name and the learner's key. They hold a cloned
//! `reqwest::Client`, so building one is cheap.

pub mod catalog;
pub mod providers;

use thiserror::Error;

pub use catalog::{Catalog, ProviderFamily, ProviderId, ProviderInfo, UnknownProvider};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection, DNS or timeout failure, or the client could not be built.
    #[error("{0}")]
    Transport(String),
    /// The endpoint answered with a non-2xx status. `body` is the parsed
    /// JSON error body, or `{}` when it was not JSON.
    #[error("API responded with {status}: {body}")]
    Status { status: u16, body: serde_json::Value },
    /// A 2xx response whose body could not be decoded.
    #[error("failed to parse response body: {0}")]
    Malformed(String),
}

// ── Request ───────────────────────────────────────────────────────────────────

/// One round-trip: a system instruction plus a single user prompt.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system_instruction: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Gemini(providers::gemini::GeminiProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `request` to the provider and return its text reply.
    ///
    /// An empty reply is not an error: each family substitutes its own
    /// placeholder text.
    pub async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Gemini(p) => p.complete(request).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(request).await,
        }
    }

    /// Model name this provider will request.
    pub fn model(&self) -> &str {
        match self {
            LlmProvider::Gemini(p) => p.model(),
            LlmProvider::OpenAiCompatible(p) => p.model(),
        }
    }
}
