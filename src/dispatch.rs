//! Request dispatcher: one learner request in, one provider call out.
//!
//! [`Dispatcher::dispatch`] resolves the selected provider's key and model
//! from the [`AiSettings`] passed in, builds the matching [`LlmProvider`](crate::llm::LlmProvider) and
//! awaits a single round-trip. Every failure comes back as a
//! [`DispatchError`] value; [`DispatchError::user_message`] renders it the way
//! the learner sees it.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::language::Language;
use crate::llm::catalog::{GEMINI_FLASH_MODEL, GEMINI_PRO_MODEL};
use crate::llm::{providers, Catalog, ChatRequest, ProviderError, ProviderFamily, ProviderId, ProviderInfo};
use crate::settings::AiSettings;

// ── Task kind ─────────────────────────────────────────────────────────────────

/// Functional category of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Concept,
    Creation,
    Review,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Concept => "concept",
            TaskKind::Creation => "creation",
            TaskKind::Review => "review",
        }
    }

    /// Sampling temperature: low for code generation, higher otherwise.
    pub fn temperature(self) -> f32 {
        match self {
            TaskKind::Creation => 0.2,
            TaskKind::Concept | TaskKind::Review => 0.7,
        }
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AiRequest {
    pub task: TaskKind,
    pub system_instruction: String,
    pub prompt: String,
    pub language: Language,
}

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DispatchError {
    /// No key stored for the selected provider. Nothing was sent.
    #[error("Please configure the API Key for {} in settings.", .provider.display_name())]
    MissingCredential { provider: ProviderId },

    #[error("{} Error: {message}", .provider.display_name())]
    Transport { provider: ProviderId, message: String },

    #[error("{} Error: API responded with {status}: {body}", .provider.display_name())]
    NonSuccessStatus { provider: ProviderId, status: u16, body: serde_json::Value },

    #[error("{} Error: failed to parse response body: {message}", .provider.display_name())]
    MalformedResponse { provider: ProviderId, message: String },
}

impl DispatchError {
    fn from_provider(provider: ProviderId, err: ProviderError) -> Self {
        match err {
            ProviderError::Status { status, body } => DispatchError::NonSuccessStatus { provider, status, body },
            ProviderError::Malformed(message) => DispatchError::MalformedResponse { provider, message },
            ProviderError::Transport(message) => DispatchError::Transport { provider, message },
        }
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            DispatchError::MissingCredential { provider }
            | DispatchError::Transport { provider, .. }
            | DispatchError::NonSuccessStatus { provider, .. }
            | DispatchError::MalformedResponse { provider, .. } => *provider,
        }
    }

    /// Display text for the learner. Only the missing-key hint is localized;
    /// provider errors carry the vendor's own wording.
    pub fn user_message(&self, language: Language) -> String {
        match (self, language) {
            (DispatchError::MissingCredential { provider }, Language::Cn) => {
                format!("请在设置中配置 {} 的 API 密钥。", provider.display_name())
            }
            _ => self.to_string(),
        }
    }
}

// ── Model resolution ──────────────────────────────────────────────────────────

/// Model name for a request.
///
/// Native family: fast tier for concept explanations, capable tier for
/// generation and review, unless `stored` is non-empty and differs from the
/// provider's default model, in which case `stored` wins for every task.
/// Chat completion family: `stored` if non-empty, else the default model.
pub fn resolve_model(info: &ProviderInfo, task: TaskKind, stored: &str) -> String {
    match info.id.family() {
        ProviderFamily::Native => {
            // TODO: split the explicit override from tier selection so an
            // override can target a single task kind.
            if !stored.is_empty() && stored != info.default_model() {
                return stored.to_string();
            }
            match task {
                TaskKind::Concept => GEMINI_FLASH_MODEL.to_string(),
                TaskKind::Creation | TaskKind::Review => GEMINI_PRO_MODEL.to_string(),
            }
        }
        ProviderFamily::OpenAiCompatible => {
            if stored.is_empty() {
                info.default_model().to_string()
            } else {
                stored.to_string()
            }
        }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Holds the provider catalog and a shared HTTP client. Cheap to clone;
/// concurrent calls share nothing mutable.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    catalog: Catalog,
}

impl Dispatcher {
    /// `timeout` of `None` leaves the transport's default in place.
    pub fn new(catalog: Catalog, timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, catalog })
    }

    /// Send `request` to the provider selected in `settings`.
    ///
    /// Performs at most one outbound call; none when the key is missing.
    pub async fn dispatch(&self, request: &AiRequest, settings: &AiSettings) -> Result<String, DispatchError> {
        let id = settings.provider;
        let api_key = settings.api_key(id);
        if api_key.is_empty() {
            warn!(provider = %id, "no API key configured");
            return Err(DispatchError::MissingCredential { provider: id });
        }

        let info = self.catalog.get(id);
        let model = resolve_model(info, request.task, settings.model_name(id));
        let provider = providers::build(info, model, api_key.to_string(), self.client.clone());

        debug!(
            provider = %id,
            model = provider.model(),
            task = request.task.as_str(),
            language = %request.language,
            "dispatching request"
        );

        let chat = ChatRequest {
            system_instruction: &request.system_instruction,
            prompt: &request.prompt,
            temperature: request.task.temperature(),
        };

        provider.complete(&chat).await.map_err(|e| {
            error!(provider = %id, model = provider.model(), error = %e, "AI request failed");
            DispatchError::from_provider(id, e)
        })
    }

    /// Like [`dispatch`](Self::dispatch), with failures rendered as text.
    pub async fn dispatch_text(&self, request: &AiRequest, settings: &AiSettings) -> String {
        self.dispatch(request, settings)
            .await
            .unwrap_or_else(|e| e.user_message(request.language))
    }
}
