//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the file named by `GENLEARN_CONFIG`), then applies
//! `GENLEARN_WORK_DIR` and `GENLEARN_LOG_LEVEL` env overrides.
//!
//! API keys never live here: they belong to the learner's settings record
//! (see [`crate::settings`]).

use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::AppError;
use crate::language::Language;
use crate::llm::{Catalog, ProviderId};
use crate::logger;

/// LLM transport configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Per-request HTTP timeout. `None` leaves the client default.
    pub timeout_seconds: Option<u64>,
    /// Endpoint overrides from `[llm.endpoints]`.
    pub endpoints: BTreeMap<ProviderId, String>,
}

impl LlmConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// The built-in catalog with this config's endpoint overrides applied.
    pub fn catalog(&self) -> Catalog {
        self.endpoints
            .iter()
            .fold(Catalog::builtin(), |catalog, (id, url)| catalog.with_endpoint(*id, url.clone()))
    }
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the settings record (already expanded, no `~`).
    pub work_dir: PathBuf,
    /// Bare level or `EnvFilter` directives.
    pub log_level: String,
    /// `log_level` came from `GENLEARN_LOG_LEVEL` and beats `RUST_LOG`.
    pub log_level_pinned: bool,
    /// Default response language when none is given on the command line.
    pub language: Language,
    /// Directory with system instruction overrides; `None` = built-ins only.
    pub prompts_dir: Option<PathBuf>,
    pub llm: LlmConfig,
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    app: RawApp,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawApp {
    #[serde(default = "default_work_dir")]
    work_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    language: Language,
    #[serde(default)]
    prompts_dir: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawLlm {
    #[serde(default)]
    timeout_seconds: Option<u64>,
    /// Keys are provider ids, validated during resolution.
    #[serde(default)]
    endpoints: BTreeMap<String, String>,
}

fn default_work_dir() -> String {
    "~/.genlearn".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load config from `config/default.toml` (or `$GENLEARN_CONFIG`), then apply
/// env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let path = env::var("GENLEARN_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let work_dir_override = env::var("GENLEARN_WORK_DIR").ok();
    let log_level_override = env::var("GENLEARN_LOG_LEVEL").ok();
    load_from(
        Path::new(&path),
        work_dir_override.as_deref(),
        log_level_override.as_deref(),
    )
}

/// Internal loader. Accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let a = parsed.app;
    let work_dir = expand_home(work_dir_override.unwrap_or(&a.work_dir));
    let log_level = log_level_override.unwrap_or(&a.log_level).to_string();
    // Directives are checked when the filter is built.
    if !log_level.contains('=') {
        logger::parse_level(&log_level).map_err(|e| AppError::Config(format!("app.log_level: {e}")))?;
    }

    if parsed.llm.timeout_seconds == Some(0) {
        return Err(AppError::Config("llm.timeout_seconds must be greater than 0".into()));
    }

    let mut endpoints = BTreeMap::new();
    for (name, url) in parsed.llm.endpoints {
        let id: ProviderId = name
            .parse()
            .map_err(|e| AppError::Config(format!("[llm.endpoints] in {}: {e}", path.display())))?;
        endpoints.insert(id, url);
    }

    Ok(Config {
        work_dir,
        log_level,
        log_level_pinned: log_level_override.is_some(),
        language: a.language,
        prompts_dir: a.prompts_dir.map(|p| expand_home(&p)),
        llm: LlmConfig {
            timeout_seconds: parsed.llm.timeout_seconds,
            endpoints,
        },
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
