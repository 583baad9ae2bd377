//! Tests for system instruction templates under config/prompts

use std::fs;

#[test]
fn test_concept_prompt_file_exists() {
    assert!(fs::metadata("config/prompts/concept.md").is_ok(), "concept.md prompt file missing");
}

#[test]
fn test_creator_prompt_file_exists() {
    assert!(fs::metadata("config/prompts/creator.md").is_ok(), "creator.md prompt file missing");
}

#[test]
fn test_review_prompt_file_exists() {
    assert!(fs::metadata("config/prompts/review.md").is_ok(), "review.md prompt file missing");
}

#[test]
fn test_prompt_templates_take_lang_directive() {
    for name in ["concept.md", "creator.md", "review.md"] {
        let text = fs::read_to_string(format!("config/prompts/{name}")).unwrap();
        assert!(
            text.contains("{{lang_directive}}"),
            "{name} should contain {{{{lang_directive}}}} variable"
        );
    }
}
