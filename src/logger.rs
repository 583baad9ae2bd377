//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after the config is loaded. Output goes to
//! stderr so that stdout carries only the model's Markdown.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Install the global subscriber for `level`.
///
/// `pinned` is set when the level came from `GENLEARN_LOG_LEVEL`: it then
/// beats `RUST_LOG`. A level from the config file yields to `RUST_LOG`.
pub fn init(level: &str, pinned: bool) -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level, pinned)?)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

fn filter(level: &str, pinned: bool) -> Result<EnvFilter, AppError> {
    let from_level = || {
        EnvFilter::try_new(level).map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
    };
    if pinned {
        from_level()
    } else {
        EnvFilter::try_from_default_env().or_else(|_| from_level())
    }
}

/// Parse a bare level name (`error` .. `trace`, `off`).
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}
