use log::{info, warn};
use std::sync::Arc;

use super::estimate_step_count;
use crate::error::{BoxError, IntakeWarning};
use crate::providers::prompt::{build_translation_prompt, build_translation_retry};
use crate::providers::{CompletionOptions, LlmProvider};

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub text: String,
    pub warning: Option<IntakeWarning>,
    /// Whether the single retry was sent
    pub retried: bool,
}

/// Translates recipe text and checks that no steps went missing.
pub struct TranslationValidator {
    provider: Arc<dyn LlmProvider>,
}

impl TranslationValidator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Translate `text` and compare step estimates on both sides.
    ///
    /// When the translation undercounts, exactly one retry is sent naming the
    /// missing count, and its output replaces the first attempt. A result
    /// that still undercounts is returned with a `TranslationIncomplete`
    /// warning. Only a failed first call is an error.
    pub async fn translate_and_validate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<TranslationOutcome, BoxError> {
        let system_prompt = build_translation_prompt(source_language, target_language);
        let expected = estimate_step_count(text);

        let mut translated = self.translate(&system_prompt, text).await?;
        let mut found = estimate_step_count(&translated);
        let mut retried = false;
        info!(
            "Translated {} -> {}: {} source steps, {} translated steps",
            source_language, target_language, expected, found
        );

        if expected > 0 && found < expected {
            warn!(
                "Translation has {} of {} steps, retrying once",
                found, expected
            );
            let retry_content = build_translation_retry(text, expected, found);
            retried = true;
            match self.translate(&system_prompt, &retry_content).await {
                Ok(second) => {
                    translated = second;
                    found = estimate_step_count(&translated);
                }
                Err(e) => warn!("Translation retry failed, keeping first attempt: {}", e),
            }
        }

        let warning = (expected > 0 && found < expected)
            .then_some(IntakeWarning::TranslationIncomplete { expected, found });

        Ok(TranslationOutcome {
            text: translated,
            warning,
            retried,
        })
    }

    async fn translate(&self, system_prompt: &str, content: &str) -> Result<String, BoxError> {
        let translated = self
            .provider
            .complete(system_prompt, content, CompletionOptions::text(0.1))
            .await?;
        let translated = translated.trim();
        if translated.is_empty() {
            return Err("translation came back empty".into());
        }
        Ok(translated.to_string())
    }
}
