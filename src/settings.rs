//! Learner-editable AI settings and their on-disk record.
//!
//! [`AiSettings`] holds the selected provider plus one key and one model
//! name per provider. [`SettingsStore`] keeps it as a single JSON file under
//! the work directory: read at startup, overwritten whole on every save.
//!
//! ```text
//! ~/.genlearn/
//! └── ai_config.json
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppError;
use crate::llm::ProviderId;

/// Fixed file name of the settings record.
pub const SETTINGS_FILE: &str = "ai_config.json";

/// Selected provider, per-provider secrets and model names.
///
/// An empty key means "not configured"; an empty model name means "use the
/// provider default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSettings {
    pub provider: ProviderId,
    #[serde(default)]
    pub api_keys: BTreeMap<ProviderId, String>,
    #[serde(default)]
    pub model_names: BTreeMap<ProviderId, String>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: ProviderId::Gemini,
            api_keys: ProviderId::ALL.iter().map(|id| (*id, String::new())).collect(),
            model_names: ProviderId::ALL
                .iter()
                .map(|id| (*id, id.default_model().to_string()))
                .collect(),
        }
    }
}

impl AiSettings {
    pub fn api_key(&self, id: ProviderId) -> &str {
        self.api_keys.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn model_name(&self, id: ProviderId) -> &str {
        self.model_names.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn select(&mut self, id: ProviderId) {
        self.provider = id;
    }

    pub fn set_api_key(&mut self, id: ProviderId, key: impl Into<String>) {
        self.api_keys.insert(id, key.into());
    }

    pub fn set_model_name(&mut self, id: ProviderId, model: impl Into<String>) {
        self.model_names.insert(id, model.into());
    }

    /// Fill providers missing from a partially written record with defaults.
    fn complete(mut self) -> Self {
        for id in ProviderId::ALL {
            self.api_keys.entry(id).or_default();
            self.model_names
                .entry(id)
                .or_insert_with(|| id.default_model().to_string());
        }
        self
    }
}

/// File-backed store for [`AiSettings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store rooted at `work_dir`; the record lives at `work_dir/ai_config.json`.
    pub fn new(work_dir: &Path) -> Self {
        Self { path: work_dir.join(SETTINGS_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, or defaults when none has been saved yet.
    pub fn load(&self) -> Result<AiSettings, AppError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no saved settings, using defaults");
            return Ok(AiSettings::default());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Settings(format!("cannot read {}: {e}", self.path.display())))?;
        let parsed: AiSettings = serde_json::from_str(&raw)
            .map_err(|e| AppError::Settings(format!("parse error in {}: {e}", self.path.display())))?;
        Ok(parsed.complete())
    }

    /// Overwrite the record with `settings`.
    pub fn save(&self, settings: &AiSettings) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| AppError::Settings(format!("cannot create {}: {e}", dir.display())))?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Settings(format!("cannot serialize settings: {e}")))?;
        fs::write(&self.path, json)
            .map_err(|e| AppError::Settings(format!("cannot write {}: {e}", self.path.display())))?;

        // The record holds API keys.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                AppError::Settings(format!("cannot set permissions on {}: {e}", self.path.display()))
            })?;
        }

        info!(path = %self.path.display(), provider = %settings.provider, "settings saved");
        Ok(())
    }
}
