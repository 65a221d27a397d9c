use log::{debug, info};
use std::sync::Arc;

use super::cascade::final_stage_error;
use crate::config::FetchConfig;
use crate::error::IntakeError;
use crate::extractors::{ExtractionMode, GenerativeExtractor};
use crate::model::{RecipeDraft, VideoPlatform};
use crate::providers::LlmProvider;
use crate::steps::{StepCondenser, StepValidator};
use crate::url_to_text::guard::UrlGuard;

/// A video link plus whatever captions the transcription collaborator found.
#[derive(Debug, Clone, Default)]
pub struct VideoInput {
    pub url: String,
    pub title: Option<String>,
    pub transcript: Option<String>,
}

pub struct VideoPipeline {
    guard: UrlGuard,
    extractor: GenerativeExtractor,
    validator: Arc<StepValidator>,
    condenser: StepCondenser,
}

impl VideoPipeline {
    pub fn new(
        config: &FetchConfig,
        provider: Arc<dyn LlmProvider>,
        validator: Arc<StepValidator>,
    ) -> Self {
        Self {
            guard: UrlGuard::new(config),
            extractor: GenerativeExtractor::new(provider.clone()),
            validator,
            condenser: StepCondenser::new(provider),
        }
    }

    /// A video-only reference draft, with the link held to the same URL rules as extraction.
    pub fn reference(&self, input: &VideoInput, reason: &str) -> Result<RecipeDraft, IntakeError> {
        let url = self.guard.check_syntax(&input.url)?;
        Ok(RecipeDraft::video_reference(url.as_str(), "", reason))
    }

    /// Extract a recipe from the transcript.
    ///
    /// Without captions this fails with `NoTranscript`; callers that still
    /// want to keep the link use [`VideoPipeline::reference`].
    pub async fn extract(&self, input: &VideoInput) -> Result<RecipeDraft, IntakeError> {
        let url = self.guard.check_syntax(&input.url)?;
        let platform = VideoPlatform::from_url(url.as_str());

        let transcript = input
            .transcript
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(IntakeError::NoTranscript)?;

        let content = match input.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => format!("Video title: {title}\n\nTranscript:\n{transcript}"),
            None => format!("Transcript:\n{transcript}"),
        };

        let mut draft = self
            .extractor
            .extract(&content, ExtractionMode::Transcript)
            .await
            .map_err(final_stage_error)?;

        if draft.title.trim().is_empty() {
            draft.title = input.title.clone().unwrap_or_default().trim().to_string();
        }

        let extracted = draft.steps.len();
        draft.steps = self.validator.filter(&draft.steps);
        debug!("{} of {} transcript steps passed validation", draft.steps.len(), extracted);

        if !draft.is_well_formed() {
            return Err(IntakeError::InsufficientContent(
                "the narration did not describe a recipe".to_string(),
            ));
        }

        draft.steps = self.condenser.condense(draft.steps).await;
        draft.video_url = Some(url.to_string());
        draft.video_platform = Some(platform);

        info!(
            "Video extraction produced '{}' from {:?} ({} steps)",
            draft.title,
            platform,
            draft.steps.len()
        );
        Ok(draft)
    }
}
