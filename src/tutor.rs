//! Learner-facing entry points: explain a concept, generate code, review code.
//!
//! Each wraps [`Dispatcher::dispatch`] with a fixed [`TaskKind`] and a
//! prompt template. The `*_text` variants never fail: errors come back as
//! the text the learner should see.

use crate::dispatch::{AiRequest, DispatchError, Dispatcher, TaskKind};
use crate::language::Language;
use crate::prompt::PromptBuilder;
use crate::settings::AiSettings;

pub fn concept_prompt(topic: &str, language: Language) -> String {
    let mut prompt =
        format!("Explain the frontend concept: \"{topic}\". Structured with Markdown. Include a code snippet.");
    if language == Language::Cn {
        prompt.push_str(" Respond in Chinese.");
    }
    prompt
}

/// `prior_context` is the code the learner already has; empty means none.
pub fn creation_prompt(request: &str, prior_context: &str, language: Language) -> String {
    let mut builder = PromptBuilder::new(None).append(format!("User Request: {request}"));
    if !prior_context.trim().is_empty() {
        builder = builder.append(format!("Current Code Context: {prior_context}"));
    }
    builder = builder.append(
        "Provide the output in a single markdown block with the language specified (e.g., ```tsx ...).",
    );
    if language == Language::Cn {
        builder = builder.append("Explain briefly in Chinese if needed, but keep code standard.");
    }
    builder.build()
}

pub fn review_prompt(code: &str, language: Language) -> String {
    match language {
        Language::En => {
            format!("Review this code for best practices, accessibility, and performance:\n\n{code}")
        }
        Language::Cn => format!(
            "Review this code for best practices, accessibility, and performance. Respond in Chinese:\n\n{code}"
        ),
    }
}

fn request(task: TaskKind, system_instruction: &str, prompt: String, language: Language) -> AiRequest {
    AiRequest {
        task,
        system_instruction: system_instruction.to_string(),
        prompt,
        language,
    }
}

pub async fn explain_concept(
    dispatcher: &Dispatcher,
    topic: &str,
    system_instruction: &str,
    language: Language,
    settings: &AiSettings,
) -> Result<String, DispatchError> {
    let req = request(TaskKind::Concept, system_instruction, concept_prompt(topic, language), language);
    dispatcher.dispatch(&req, settings).await
}

pub async fn generate_code(
    dispatcher: &Dispatcher,
    prompt: &str,
    system_instruction: &str,
    language: Language,
    prior_context: &str,
    settings: &AiSettings,
) -> Result<String, DispatchError> {
    let req = request(
        TaskKind::Creation,
        system_instruction,
        creation_prompt(prompt, prior_context, language),
        language,
    );
    dispatcher.dispatch(&req, settings).await
}

pub async fn review_code(
    dispatcher: &Dispatcher,
    code: &str,
    system_instruction: &str,
    language: Language,
    settings: &AiSettings,
) -> Result<String, DispatchError> {
    let req = request(TaskKind::Review, system_instruction, review_prompt(code, language), language);
    dispatcher.dispatch(&req, settings).await
}

pub async fn explain_concept_text(
    dispatcher: &Dispatcher,
    topic: &str,
    system_instruction: &str,
    language: Language,
    settings: &AiSettings,
) -> String {
    explain_concept(dispatcher, topic, system_instruction, language, settings)
        .await
        .unwrap_or_else(|e| e.user_message(language))
}

pub async fn generate_code_text(
    dispatcher: &Dispatcher,
    prompt: &str,
    system_instruction: &str,
    language: Language,
    prior_context: &str,
    settings: &AiSettings,
) -> String {
    generate_code(dispatcher, prompt, system_instruction, language, prior_context, settings)
        .await
        .unwrap_or_else(|e| e.user_message(language))
}

pub async fn review_code_text(
    dispatcher: &Dispatcher,
    code: &str,
    system_instruction: &str,
    language: Language,
    settings: &AiSettings,
) -> String {
    review_code(dispatcher, code, system_instruction, language, settings)
        .await
        .unwrap_or_else(|e| e.user_message(language))
}
