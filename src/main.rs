//! `genlearn`: command-line front end.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Load the learner's AI settings
//!   5. Run one command and print its Markdown to stdout
//!
//! # Usage
//!
//! ```text
//! genlearn [--lang en|cn] <command>
//!
//! Commands:
//!   topics                          list the curriculum
//!   explain <topic-id | text...>    explain a concept
//!   create <text...> [--context <file>]
//!                                   generate starter code
//!   review <file | ->               review code from a file or stdin
//!   config show                     print the current AI settings
//!   config provider <id>            select a provider
//!   config key <id> <secret>        store a provider's API key
//!   config model <id> <name>        store a provider's model name ("" = default)
//! ```

use std::io::Read;
use std::process;

use tracing::info;

use genlearn::config::{self, Config};
use genlearn::curriculum;
use genlearn::dispatch::{Dispatcher, TaskKind};
use genlearn::error::AppError;
use genlearn::language::Language;
use genlearn::llm::ProviderId;
use genlearn::logger;
use genlearn::prompt::system_instruction;
use genlearn::settings::{AiSettings, SettingsStore};
use genlearn::tutor;

// ── CLI arg parsing ────────────────────────────────────────────────────────

struct Args {
    lang: Option<String>,
    context: Option<String>,
    command: Option<String>,
    rest: Vec<String>,
}

fn parse_args() -> Args {
    let mut lang = None;
    let mut context = None;
    let mut command = None;
    let mut rest = Vec::new();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--lang" | "-l" => lang = iter.next(),
            "--context" | "-c" => context = iter.next(),
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--" => {
                rest.extend(iter);
                break;
            }
            _ if command.is_none() => command = Some(arg),
            _ => rest.push(arg),
        }
    }

    Args { lang, context, command, rest }
}

fn print_help() {
    eprintln!("usage: genlearn [--lang en|cn] <command>");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  topics                          list the curriculum");
    eprintln!("  explain <topic-id | text...>    explain a concept");
    eprintln!("  create <text...> [--context <file>]");
    eprintln!("                                  generate starter code");
    eprintln!("  review <file | ->               review code from a file or stdin");
    eprintln!("  config show                     print the current AI settings");
    eprintln!("  config provider <id>            select a provider");
    eprintln!("  config key <id> <secret>        store a provider's API key");
    eprintln!("  config model <id> <name>        store a provider's model name");
    eprintln!();
    eprintln!("providers: gemini, deepseek, volcano, kimi, glm");
}

// ── Entry ──────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let args = parse_args();
    let Some(command) = args.command.clone() else {
        print_help();
        process::exit(2);
    };

    let config = config::load()?;
    logger::init(&config.log_level, config.log_level_pinned)?;

    let language = match &args.lang {
        Some(l) => l.parse::<Language>().map_err(AppError::Config)?,
        None => config.language,
    };

    let store = SettingsStore::new(&config.work_dir);
    let mut settings = store.load()?;

    info!(
        work_dir = %config.work_dir.display(),
        provider = %settings.provider,
        %language,
        "genlearn ready"
    );

    match command.as_str() {
        "topics" => print_topics(language),
        "explain" | "create" | "review" => {
            let out = ask(&command, &args, &config, &settings, language).await?;
            println!("{out}");
        }
        "config" => configure(&args.rest, &store, &mut settings)?,
        other => {
            eprintln!("unknown command: {other}");
            print_help();
            process::exit(2);
        }
    }

    Ok(())
}

// ── Commands ───────────────────────────────────────────────────────────────

fn print_topics(language: Language) {
    for section in curriculum::knowledge_map(language) {
        println!("{}", section.title);
        for topic in section.children {
            println!("  {:<20} {}", topic.id, topic.title);
        }
    }
}

/// Run one AI command. Provider failures come back as printable text.
async fn ask(
    command: &str,
    args: &Args,
    config: &Config,
    settings: &AiSettings,
    language: Language,
) -> Result<String, AppError> {
    let dispatcher = Dispatcher::new(config.llm.catalog(), config.llm.timeout())?;
    let prompts_dir = config.prompts_dir.as_deref();
    let text = args.rest.join(" ");

    let out = match command {
        "explain" => {
            require(!text.is_empty(), "explain needs a topic")?;
            let topic: &str = match curriculum::find_topic(language, &text) {
                Some(t) => t.title,
                None => &text,
            };
            let system = system_instruction(TaskKind::Concept, language, prompts_dir);
            tutor::explain_concept_text(&dispatcher, topic, &system, language, settings).await
        }
        "create" => {
            require(!text.is_empty(), "create needs a description")?;
            let context = match &args.context {
                Some(path) => read_source(path)?,
                None => String::new(),
            };
            let system = system_instruction(TaskKind::Creation, language, prompts_dir);
            tutor::generate_code_text(&dispatcher, &text, &system, language, &context, settings).await
        }
        _ => {
            let path = args.rest.first().map(String::as_str).unwrap_or("-");
            let code = read_source(path)?;
            require(!code.trim().is_empty(), "nothing to review")?;
            let system = system_instruction(TaskKind::Review, language, prompts_dir);
            tutor::review_code_text(&dispatcher, &code, &system, language, settings).await
        }
    };
    Ok(out)
}

fn configure(rest: &[String], store: &SettingsStore, settings: &mut AiSettings) -> Result<(), AppError> {
    let sub = rest.first().map(String::as_str).unwrap_or("show");
    match (sub, &rest[rest.len().min(1)..]) {
        ("show", _) => {
            print_settings(settings);
            return Ok(());
        }
        ("provider", [id]) => settings.select(provider_id(id)?),
        ("key", [id, secret]) => settings.set_api_key(provider_id(id)?, secret.as_str()),
        ("model", [id]) => settings.set_model_name(provider_id(id)?, ""),
        ("model", [id, name]) => settings.set_model_name(provider_id(id)?, name.as_str()),
        _ => {
            return Err(AppError::Config(format!(
                "usage: genlearn config show | provider <id> | key <id> <secret> | model <id> <name>; got '{}'",
                rest.join(" ")
            )));
        }
    }
    store.save(settings)?;
    print_settings(settings);
    Ok(())
}

fn print_settings(settings: &AiSettings) {
    for id in ProviderId::ALL {
        let marker = if id == settings.provider { "*" } else { " " };
        let key = if settings.api_key(id).is_empty() { "not set" } else { "set" };
        let model = match settings.model_name(id) {
            "" => id.default_model(),
            m => m,
        };
        println!("{marker} {:<9} {:<24} key: {key:<8} model: {model}", id.as_str(), id.display_name());
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn provider_id(name: &str) -> Result<ProviderId, AppError> {
    name.parse::<ProviderId>().map_err(|e| AppError::Config(e.to_string()))
}

fn require(ok: bool, message: &str) -> Result<(), AppError> {
    if ok { Ok(()) } else { Err(AppError::Config(message.to_string())) }
}

/// Read a file, or stdin when `path` is `-`.
fn read_source(path: &str) -> Result<String, AppError> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}
