//! System instructions and prompt assembly.
//!
//! Each use case has a system instruction template: `concept.md`,
//! `creator.md` and `review.md`. A copy under the configured prompts
//! directory replaces the built-in text, so instructions can be tuned
//! without a rebuild. Templates take one variable, `{{lang_directive}}`,
//! which is empty for English.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatch::TaskKind;
use crate::language::Language;

const SEPARATOR: &str = "\n\n";

const CONCEPT_TEMPLATE: &str = include_str!("../config/prompts/concept.md");
const CREATOR_TEMPLATE: &str = include_str!("../config/prompts/creator.md");
const REVIEW_TEMPLATE: &str = include_str!("../config/prompts/review.md");

/// Fluent builder that joins prompt fragments with blank lines.
///
/// Variable substitution uses `{{key}}` syntax and is applied once, at
/// [`build()`](PromptBuilder::build) time.
pub struct PromptBuilder {
    prompts_dir: Option<PathBuf>,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    /// `prompts_dir` of `None` uses built-in text for every layer.
    pub fn new(prompts_dir: Option<&Path>) -> Self {
        Self {
            prompts_dir: prompts_dir.map(Path::to_path_buf),
            parts: Vec::new(),
            vars: HashMap::new(),
        }
    }

    /// Append `filename` from the prompts directory, or `fallback` when the
    /// directory is unset or the file is missing.
    pub fn layer(self, filename: &str, fallback: &str) -> Self {
        let loaded = self.prompts_dir.as_ref().and_then(|dir| {
            let path = dir.join(filename);
            match fs::read_to_string(&path) {
                Ok(text) => Some(text),
                Err(_) => {
                    tracing::debug!("prompt: layer '{}' not found, using built-in", path.display());
                    None
                }
            }
        });
        match loaded {
            Some(text) => self.append(text),
            None => self.append(fallback),
        }
    }

    /// Append a text fragment. Blank fragments are dropped.
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        }
        self
    }

    /// Register a single `{{key}}` → `value` substitution.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> String {
        let mut prompt = self.parts.join(SEPARATOR);
        for (k, v) in &self.vars {
            let placeholder = format!("{{{{{}}}}}", k);
            prompt = prompt.replace(&placeholder, v);
        }
        prompt.trim().to_string()
    }
}

/// System instruction for `task`, in `language`.
pub fn system_instruction(task: TaskKind, language: Language, prompts_dir: Option<&Path>) -> String {
    let (file, fallback, cn_directive) = match task {
        TaskKind::Concept => ("concept.md", CONCEPT_TEMPLATE, "5. REPLY IN CHINESE."),
        TaskKind::Creation => ("creator.md", CREATOR_TEMPLATE, "REPLY IN CHINESE (but keep code in English)."),
        TaskKind::Review => ("review.md", REVIEW_TEMPLATE, "REPLY IN CHINESE."),
    };
    let directive = match language {
        Language::En => "",
        Language::Cn => cn_directive,
    };
    PromptBuilder::new(prompts_dir)
        .layer(file, fallback)
        .var("lang_directive", directive)
        .build()
}
