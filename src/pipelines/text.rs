use log::{info, warn};
use std::sync::Arc;

use crate::error::{IntakeError, StageFailure};
use crate::extractors::{ExtractionMode, GenerativeExtractor};
use crate::model::RecipeDraft;
use crate::providers::prompt::CONTENT_GATE_PROMPT;
use crate::providers::{parse_json_object, CompletionOptions, LlmProvider};

/// Pasted or typed recipe text.
pub struct TextPipeline {
    provider: Arc<dyn LlmProvider>,
    extractor: GenerativeExtractor,
}

impl TextPipeline {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            extractor: GenerativeExtractor::new(provider.clone()),
            provider,
        }
    }

    /// Gate the text, then extract the full recipe from it.
    ///
    /// Text that only announces a recipe ("I want to add my lasagna") fails
    /// with `NoRecipeContent` before the extractor is called.
    pub async fn extract(&self, text: &str) -> Result<RecipeDraft, IntakeError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(IntakeError::NoRecipeContent);
        }

        if !self.has_recipe_content(text).await {
            info!("Text gate: no recipe content in {} chars", text.len());
            return Err(IntakeError::NoRecipeContent);
        }

        let draft = self
            .extractor
            .extract(text, ExtractionMode::Document)
            .await
            .map_err(|failure| match failure {
                StageFailure::NotApplicable(_) => IntakeError::NoRecipeContent,
                other => IntakeError::InsufficientContent(other.to_string()),
            })?;

        if !draft.is_well_formed() {
            return Err(IntakeError::InsufficientContent(
                "the text has no title or no ingredients and steps".to_string(),
            ));
        }

        info!(
            "Text extraction produced '{}' ({} ingredients, {} steps)",
            draft.title,
            draft.ingredients.len(),
            draft.steps.len()
        );
        Ok(draft)
    }

    /// Only a clear "no" stops the pipeline; a failed or unreadable gate lets
    /// extraction decide.
    async fn has_recipe_content(&self, text: &str) -> bool {
        let reply = match self
            .provider
            .complete(CONTENT_GATE_PROMPT, text, CompletionOptions::json(0.0))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Content gate failed, continuing to extraction: {}", e);
                return true;
            }
        };

        match parse_json_object(&reply).and_then(|v| v.get("has_recipe").and_then(|b| b.as_bool())) {
            Some(has_recipe) => has_recipe,
            None => {
                warn!("Content gate answer was unreadable, continuing to extraction");
                true
            }
        }
    }
}
