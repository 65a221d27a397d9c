//! System prompts for every text-generation call.
//!
//! The prompts live in `prompts/*.txt` and are embedded at compile time with
//! `include_str!`, so they can be edited without dealing with Rust string syntax.

/// Full recipe extraction from OCR or pasted text.
pub const EXTRACT_RECIPE_PROMPT: &str = include_str!("prompts/extract_recipe.txt");

/// Steps-only extraction from the visible text of a web page.
pub const EXTRACT_STEPS_PROMPT: &str = include_str!("prompts/extract_steps.txt");

/// Recipe extraction from a spoken video transcript.
pub const EXTRACT_TRANSCRIPT_PROMPT: &str = include_str!("prompts/extract_transcript.txt");

pub const CONDENSE_STEPS_PROMPT: &str = include_str!("prompts/condense_steps.txt");

pub const CONTENT_GATE_PROMPT: &str = include_str!("prompts/content_gate.txt");

/// Contains `{{SOURCE}}` and `{{TARGET}}` placeholders, see [`build_translation_prompt`].
pub const TRANSLATE_PROMPT: &str = include_str!("prompts/translate.txt");

/// Fill the translation prompt with the language pair.
pub fn build_translation_prompt(source_language: &str, target_language: &str) -> String {
    TRANSLATE_PROMPT
        .replace("{{SOURCE}}", language_name(source_language))
        .replace("{{TARGET}}", language_name(target_language))
}

/// Follow-up instruction sent when a translation came back short.
pub fn build_translation_retry(text: &str, expected_steps: usize, found_steps: usize) -> String {
    format!(
        "The original recipe below has {expected_steps} instruction steps, but your previous translation only contained {found_steps}. \
Translate the complete recipe again and include all {expected_steps} steps.\n\n{text}"
    )
}

/// English name for common ISO 639-1 codes, falling back to the code itself.
pub fn language_name(code: &str) -> &str {
    match code.trim().to_ascii_lowercase().as_str() {
        "en" => "English",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "pl" => "Polish",
        "sv" => "Swedish",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "hi" => "Hindi",
        "ru" => "Russian",
        "tr" => "Turkish",
        "el" => "Greek",
        _ => code,
    }
}
