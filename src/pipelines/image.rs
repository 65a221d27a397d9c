use log::{info, warn};
use std::sync::Arc;

use super::cascade::final_stage_error;
use crate::error::{IntakeError, IntakeWarning};
use crate::extractors::{ExtractionMode, GenerativeExtractor};
use crate::model::RecipeDraft;
use crate::providers::LlmProvider;
use crate::translation::TranslationValidator;

/// Text recovered upstream from a photographed cookbook page.
#[derive(Debug, Clone, Default)]
pub struct ImageInput {
    pub text: String,
    /// ISO 639-1 code reported by the OCR collaborator
    pub detected_language: Option<String>,
    pub cookbook_name: Option<String>,
    pub cookbook_page: Option<String>,
    pub image_url: Option<String>,
}

pub struct ImagePipeline {
    translator: TranslationValidator,
    extractor: GenerativeExtractor,
    target_language: String,
}

impl ImagePipeline {
    pub fn new(provider: Arc<dyn LlmProvider>, target_language: &str) -> Self {
        Self {
            translator: TranslationValidator::new(provider.clone()),
            extractor: GenerativeExtractor::new(provider),
            target_language: target_language.to_string(),
        }
    }

    /// Translate when needed, then extract the full recipe.
    ///
    /// An unavailable translation falls back to the original text with a
    /// warning rather than failing the import.
    pub async fn extract(
        &self,
        input: &ImageInput,
    ) -> Result<(RecipeDraft, Vec<IntakeWarning>), IntakeError> {
        if input.text.trim().is_empty() {
            return Err(IntakeError::InsufficientContent(
                "no text was recognised in the image".to_string(),
            ));
        }

        let mut retried = false;
        let mut warnings = Vec::new();
        let mut text = input.text.clone();

        if let Some(source) = input
            .detected_language
            .as_deref()
            .filter(|lang| !same_language(lang, &self.target_language))
        {
            match self
                .translator
                .translate_and_validate(&text, source, &self.target_language)
                .await
            {
                Ok(outcome) => {
                    retried = outcome.retried;
                    text = outcome.text;
                    warnings.extend(outcome.warning);
                }
                Err(e) => {
                    warn!("Translation from {} failed, using original text: {}", source, e);
                    warnings.push(IntakeWarning::TranslationUnavailable {
                        source_language: source.to_string(),
                    });
                }
            }
        }

        let mut draft = self
            .extractor
            .extract(&text, ExtractionMode::Document)
            .await
            .map_err(final_stage_error)?;

        if !draft.is_well_formed() {
            return Err(IntakeError::InsufficientContent(
                "the page did not contain a recognisable recipe".to_string(),
            ));
        }

        draft.cookbook_name = input.cookbook_name.clone();
        draft.cookbook_page = input.cookbook_page.clone();
        draft.image_url = input.image_url.clone();

        info!(
            "Image extraction produced '{}' ({} steps, translation retried: {}, {} warnings)",
            draft.title,
            draft.steps.len(),
            retried,
            warnings.len()
        );
        Ok((draft, warnings))
    }
}

/// Compare primary language subtags, so "en-GB" matches "en".
fn same_language(a: &str, b: &str) -> bool {
    let primary = |code: &str| {
        code.trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    };
    primary(a) == primary(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::providers::CompletionOptions;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const RECIPE_JSON: &str = r#"{"title": "Flammkuchen", "ingredients": ["200 g flour"], "steps": ["Roll out the dough very thin."], "tags": [], "error": ""}"#;

    /// Fails translation calls (text mode) when asked to, answers extraction calls with a recipe.
    struct Ocr {
        translation: Result<&'static str, &'static str>,
        translated_inputs: Mutex<Vec<String>>,
        extraction_inputs: Mutex<Vec<String>>,
    }

    impl Ocr {
        fn new(translation: Result<&'static str, &'static str>) -> Arc<Self> {
            Arc::new(Self {
                translation,
                translated_inputs: Mutex::new(Vec::new()),
                extraction_inputs: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for Ocr {
        fn provider_name(&self) -> &str {
            "ocr"
        }

        async fn complete(
            &self,
            _system_prompt: &str,
            user_content: &str,
            options: CompletionOptions,
        ) -> Result<String, BoxError> {
            if options.json_mode {
                self.extraction_inputs.lock().unwrap().push(user_content.to_string());
                Ok(RECIPE_JSON.to_string())
            } else {
                self.translated_inputs.lock().unwrap().push(user_content.to_string());
                self.translation.map(str::to_string).map_err(|e| e.into())
            }
        }
    }

    fn input(language: &str) -> ImageInput {
        ImageInput {
            text: "Flammkuchen\n200 g Mehl\nTeig dünn ausrollen.".to_string(),
            detected_language: Some(language.to_string()),
            cookbook_name: Some("Elsass".to_string()),
            cookbook_page: Some("42".to_string()),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_foreign_text_is_translated_first() {
        let provider = Ocr::new(Ok("Tarte flambée\n200 g flour\nRoll out the dough thin."));
        let pipeline = ImagePipeline::new(provider.clone(), "en");

        let (draft, warnings) = pipeline.extract(&input("de")).await.unwrap();

        assert!(warnings.is_empty());
        assert_eq!(draft.cookbook_page.as_deref(), Some("42"));
        assert_eq!(provider.translated_inputs.lock().unwrap().len(), 1);
        assert!(provider.extraction_inputs.lock().unwrap()[0].contains("Roll out"));
    }

    #[tokio::test]
    async fn test_target_language_skips_translation() {
        let provider = Ocr::new(Ok("unused"));
        let pipeline = ImagePipeline::new(provider.clone(), "en");

        pipeline.extract(&input("en-US")).await.unwrap();
        assert!(provider.translated_inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_translation_failure_falls_back_with_warning() {
        let provider = Ocr::new(Err("quota exceeded"));
        let pipeline = ImagePipeline::new(provider.clone(), "en");

        let (draft, warnings) = pipeline.extract(&input("de")).await.unwrap();

        assert_eq!(draft.title, "Flammkuchen");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind(), "translation_unavailable");
        assert!(provider.extraction_inputs.lock().unwrap()[0].contains("Mehl"));
    }

    #[tokio::test]
    async fn test_blank_text_is_insufficient() {
        let pipeline = ImagePipeline::new(Ocr::new(Ok("")), "en");
        let err = pipeline
            .extract(&ImageInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_content");
    }
}
