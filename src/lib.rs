//! GenLearn: concept explanations, starter code and code reviews from a
//! learner-selected LLM provider.
//!
//! The binary entry point is `src/main.rs`; the library exposes the
//! dispatcher and its collaborators for the CLI and integration tests.

pub mod config;
pub mod curriculum;
pub mod dispatch;
pub mod error;
pub mod language;
pub mod llm;
pub mod logger;
pub mod prompt;
pub mod settings;
pub mod tutor;
