use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

use super::normalize_spoken_quantity;
use crate::error::StageFailure;
use crate::model::RecipeDraft;
use crate::providers::prompt::{EXTRACT_RECIPE_PROMPT, EXTRACT_STEPS_PROMPT, EXTRACT_TRANSCRIPT_PROMPT};
use crate::providers::{parse_json_object, string_list, CompletionOptions, LlmProvider};

/// What the model is asked to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Only the instruction steps of a web page's visible text
    PageSteps,
    /// A complete recipe from OCR output or pasted text
    Document,
    /// A complete recipe from spoken narration
    Transcript,
}

impl ExtractionMode {
    fn prompt(self) -> &'static str {
        match self {
            ExtractionMode::PageSteps => EXTRACT_STEPS_PROMPT,
            ExtractionMode::Document => EXTRACT_RECIPE_PROMPT,
            ExtractionMode::Transcript => EXTRACT_TRANSCRIPT_PROMPT,
        }
    }
}

/// Last-resort extraction through the text-generation collaborator.
pub struct GenerativeExtractor {
    provider: Arc<dyn LlmProvider>,
}

impl GenerativeExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn extract(
        &self,
        content: &str,
        mode: ExtractionMode,
    ) -> Result<RecipeDraft, StageFailure> {
        if content.trim().is_empty() {
            return Err(StageFailure::NotApplicable("no text to extract from".to_string()));
        }

        info!(
            "Generative extraction ({:?}) with {} over {} chars",
            mode,
            self.provider.provider_name(),
            content.len()
        );

        let reply = self
            .provider
            .complete(mode.prompt(), content, CompletionOptions::json(0.1))
            .await
            .map_err(|e| StageFailure::Upstream(e.to_string()))?;

        let value = parse_json_object(&reply)
            .ok_or_else(|| StageFailure::Malformed("reply contained no JSON object".to_string()))?;

        if let Some(error) = value
            .get("error")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|e| !e.is_empty())
        {
            debug!("Model reported no recipe: {}", error);
            return Err(StageFailure::NotApplicable(error.to_string()));
        }

        let mut draft = RecipeDraft {
            title: value
                .get("title")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            ingredients: string_list(&value, "ingredients"),
            steps: string_list(&value, "steps"),
            ..Default::default()
        };
        for tag in string_list(&value, "tags") {
            draft.add_tag(&tag);
        }

        if mode == ExtractionMode::Transcript {
            draft.ingredients = draft
                .ingredients
                .iter()
                .map(|i| normalize_spoken_quantity(i))
                .collect();
        }

        if draft.steps.is_empty() && draft.ingredients.is_empty() {
            return Err(StageFailure::Insufficient { valid_steps: 0 });
        }

        debug!(
            "Generative extraction returned {} ingredients and {} steps",
            draft.ingredients.len(),
            draft.steps.len()
        );
        Ok(draft)
    }
}
