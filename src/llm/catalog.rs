//! Provider catalog: the fixed set of supported providers, their display
//! names, default models and endpoints.
//!
//! Endpoints are the only mutable part, and only at startup
//! (`[llm.endpoints]` in the config). After that the catalog is read-only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fast native tier, used for concept explanations.
pub const GEMINI_FLASH_MODEL: &str = "gemini-2.5-flash";
/// Higher-capability native tier, used for code generation and review.
pub const GEMINI_PRO_MODEL: &str = "gemini-3-pro-preview";

/// Identifier of a supported provider. Serialized as its lowercase id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    Deepseek,
    Volcano,
    Kimi,
    Glm,
}

/// A provider name that matches no [`ProviderId`] or alias.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

/// Call shape used to reach a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// Vendor generate-content API with system instruction and model tiers.
    Native,
    /// `POST /chat/completions` with bearer auth.
    OpenAiCompatible,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::Gemini,
        ProviderId::Deepseek,
        ProviderId::Volcano,
        ProviderId::Kimi,
        ProviderId::Glm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::Deepseek => "deepseek",
            ProviderId::Volcano => "volcano",
            ProviderId::Kimi => "kimi",
            ProviderId::Glm => "glm",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderId::Gemini => "Google Gemini",
            ProviderId::Deepseek => "DeepSeek",
            ProviderId::Volcano => "Volcano Engine (Doubao)",
            ProviderId::Kimi => "Kimi (Moonshot)",
            ProviderId::Glm => "Zhipu GLM",
        }
    }

    /// Documented default model; what a fresh settings record stores.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderId::Gemini => GEMINI_FLASH_MODEL,
            ProviderId::Deepseek => "deepseek-chat",
            ProviderId::Volcano => "doubao-pro-4k",
            ProviderId::Kimi => "moonshot-v1-8k",
            ProviderId::Glm => "glm-4",
        }
    }

    pub fn family(self) -> ProviderFamily {
        match self {
            ProviderId::Gemini => ProviderFamily::Native,
            _ => ProviderFamily::OpenAiCompatible,
        }
    }

    fn default_endpoint(self) -> &'static str {
        match self {
            ProviderId::Gemini => "https://generativelanguage.googleapis.com/v1beta/models",
            ProviderId::Deepseek => "https://api.deepseek.com/chat/completions",
            ProviderId::Volcano => "https://ark.cn-beijing.volces.com/api/v3/chat/completions",
            ProviderId::Kimi => "https://api.moonshot.cn/v1/chat/completions",
            ProviderId::Glm => "https://open.bigmodel.cn/api/paas/v4/chat/completions",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderId::Gemini),
            "deepseek" => Ok(ProviderId::Deepseek),
            "volcano" | "doubao" => Ok(ProviderId::Volcano),
            "kimi" | "moonshot" => Ok(ProviderId::Kimi),
            "glm" | "zhipu" => Ok(ProviderId::Glm),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Catalog entry for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: ProviderId,
    /// For the native family this is the models base URL; the request URL
    /// is `<endpoint>/<model>:generateContent`.
    pub endpoint: String,
}

impl ProviderInfo {
    pub fn default_model(&self) -> &'static str {
        self.id.default_model()
    }
}

/// Immutable table of every provider, indexed by [`ProviderId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: [ProviderInfo; 5],
}

impl Catalog {
    /// The catalog with each vendor's public endpoint.
    pub fn builtin() -> Self {
        Self {
            entries: ProviderId::ALL.map(|id| ProviderInfo {
                id,
                endpoint: id.default_endpoint().to_string(),
            }),
        }
    }

    /// Replace one provider's endpoint (proxies, self-hosted gateways, tests).
    pub fn with_endpoint(mut self, id: ProviderId, endpoint: impl Into<String>) -> Self {
        self.entries[id.index()].endpoint = endpoint.into();
        self
    }

    pub fn get(&self, id: ProviderId) -> &ProviderInfo {
        &self.entries[id.index()]
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
