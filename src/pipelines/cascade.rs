use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::{IntakeError, StageFailure};
use crate::model::{Confidence, ExtractionResult, RecipeDraft};
use crate::steps::StepValidator;

/// Fewest validated steps an accepted URL draft may have.
pub const MIN_VALID_STEPS: usize = 3;

/// Request-scoped scratch state shared by the stages of one cascade run.
#[derive(Debug, Default)]
pub struct CascadeContext {
    /// Valid step count per attempted stage, in order
    pub stage_steps: Vec<(&'static str, usize)>,
    partial: RecipeDraft,
}

impl CascadeContext {
    pub fn record(&mut self, stage: &'static str, valid_steps: usize) {
        self.stage_steps.push((stage, valid_steps));
    }

    pub fn best_step_count(&self) -> usize {
        self.stage_steps.iter().map(|(_, n)| *n).max().unwrap_or(0)
    }

    /// Keep what a rejected stage found so later stages can reuse it.
    pub fn remember(&mut self, draft: &RecipeDraft) {
        if self.partial.title.trim().is_empty() && !draft.title.trim().is_empty() {
            self.partial.title = draft.title.clone();
        }
        if self.partial.ingredients.is_empty() && !draft.ingredients.is_empty() {
            self.partial.ingredients = draft.ingredients.clone();
        }
        if self.partial.image_url.is_none() {
            self.partial.image_url = draft.image_url.clone();
        }
        self.partial.tags.extend(draft.tags.iter().cloned());
    }

    /// Fill fields a later stage left empty from earlier partial results.
    pub fn fill_missing(&self, draft: &mut RecipeDraft) {
        if draft.title.trim().is_empty() {
            draft.title = self.partial.title.clone();
        }
        if draft.ingredients.is_empty() {
            draft.ingredients = self.partial.ingredients.clone();
        }
        if draft.image_url.is_none() {
            draft.image_url = self.partial.image_url.clone();
        }
        draft.tags.extend(self.partial.tags.iter().cloned());
    }
}

/// One extraction stage over input `I`.
#[async_trait]
pub trait Strategy<I: Sync>: Send + Sync {
    fn name(&self) -> &'static str;

    fn confidence(&self) -> Confidence;

    async fn attempt(
        &self,
        input: &I,
        context: &mut CascadeContext,
    ) -> Result<RecipeDraft, StageFailure>;
}

/// Ordered strategies, cheapest and most deterministic first.
///
/// A stage's draft is accepted when it has a title and at least
/// [`MIN_VALID_STEPS`] steps pass the validator; later stages never run
/// after an accepted one.
pub struct Cascade<I: Sync> {
    stages: Vec<Box<dyn Strategy<I>>>,
    validator: Arc<StepValidator>,
}

impl<I: Sync> Cascade<I> {
    pub fn new(validator: Arc<StepValidator>) -> Self {
        Self {
            stages: Vec::new(),
            validator,
        }
    }

    pub fn with_stage(mut self, stage: impl Strategy<I> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(
        &self,
        input: &I,
        context: &mut CascadeContext,
    ) -> Result<ExtractionResult, IntakeError> {
        for stage in &self.stages {
            debug!("Cascade: trying {}", stage.name());
            let mut draft = match stage.attempt(input, context).await {
                Ok(draft) => draft,
                Err(failure) => {
                    warn!("Cascade: {} failed: {}", stage.name(), failure);
                    context.record(stage.name(), 0);
                    continue;
                }
            };

            context.fill_missing(&mut draft);
            draft.steps = self.validator.filter(&draft.steps);
            let valid_steps = draft.steps.len();
            context.record(stage.name(), valid_steps);

            if !draft.title.trim().is_empty() && valid_steps >= MIN_VALID_STEPS {
                info!(
                    "Cascade: accepted {} with {} valid steps",
                    stage.name(),
                    valid_steps
                );
                return Ok(ExtractionResult {
                    recipe: draft,
                    confidence: stage.confidence(),
                });
            }

            info!(
                "Cascade: {} gave {} valid steps (title present: {}), falling through",
                stage.name(),
                valid_steps,
                !draft.title.trim().is_empty()
            );
            context.remember(&draft);
        }

        Err(IntakeError::InsufficientContent(format!(
            "found at most {} usable steps, {} are needed",
            context.best_step_count(),
            MIN_VALID_STEPS
        )))
    }
}

/// Terminal mapping for a failed single-stage channel.
pub(crate) fn final_stage_error(failure: StageFailure) -> IntakeError {
    IntakeError::InsufficientContent(failure.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::Vocabulary;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        result: fn() -> Result<RecipeDraft, StageFailure>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Strategy<String> for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn confidence(&self) -> Confidence {
            Confidence::Html
        }

        async fn attempt(
            &self,
            _input: &String,
            _context: &mut CascadeContext,
        ) -> Result<RecipeDraft, StageFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn validator() -> Arc<StepValidator> {
        Arc::new(StepValidator::new(&Vocabulary::load_default().unwrap()).unwrap())
    }

    fn good_steps() -> Vec<String> {
        vec![
            "Preheat the oven to 200C with a rack in the middle.".to_string(),
            "Toss the potatoes with oil and plenty of salt.".to_string(),
            "Roast the potatoes for 40 minutes, turning once.".to_string(),
        ]
    }

    fn stage(
        name: &'static str,
        result: fn() -> Result<RecipeDraft, StageFailure>,
    ) -> (Fixed, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Fixed {
                name,
                result,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[tokio::test]
    async fn test_first_acceptable_stage_short_circuits() {
        let (first, first_calls) = stage("first", || {
            Ok(RecipeDraft {
                title: "Roast Potatoes".to_string(),
                steps: good_steps(),
                ..Default::default()
            })
        });
        let (second, second_calls) = stage("second", || Err(StageFailure::Upstream("x".into())));

        let cascade = Cascade::new(validator()).with_stage(first).with_stage(second);
        let mut context = CascadeContext::default();
        let result = cascade.run(&"page".to_string(), &mut context).await.unwrap();

        assert_eq!(result.recipe.steps.len(), 3);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_partial_results_carry_forward() {
        let (first, _) = stage("first", || {
            Ok(RecipeDraft {
                title: "Roast Potatoes".to_string(),
                ingredients: vec!["1 kg potatoes".to_string()],
                steps: vec!["Roast the potatoes until crisp and golden.".to_string()],
                ..Default::default()
            })
        });
        let (second, _) = stage("second", || {
            Ok(RecipeDraft {
                steps: good_steps(),
                ..Default::default()
            })
        });

        let cascade = Cascade::new(validator()).with_stage(first).with_stage(second);
        let mut context = CascadeContext::default();
        let result = cascade.run(&"page".to_string(), &mut context).await.unwrap();

        assert_eq!(result.recipe.title, "Roast Potatoes");
        assert_eq!(result.recipe.ingredients, vec!["1 kg potatoes"]);
        assert_eq!(context.stage_steps, vec![("first", 1), ("second", 3)]);
    }

    #[tokio::test]
    async fn test_exhausted_cascade_is_insufficient_content() {
        let (first, _) = stage("first", || Err(StageFailure::NotApplicable("none".into())));
        let (second, _) = stage("second", || Err(StageFailure::Malformed("junk".into())));

        let cascade = Cascade::new(validator()).with_stage(first).with_stage(second);
        let mut context = CascadeContext::default();
        let err = cascade.run(&"page".to_string(), &mut context).await.unwrap_err();

        assert_eq!(err.kind(), "insufficient_content");
        assert_eq!(context.stage_steps.len(), 2);
    }

    #[tokio::test]
    async fn test_title_is_required() {
        let (only, _) = stage("only", || {
            Ok(RecipeDraft {
                steps: good_steps(),
                ..Default::default()
            })
        });
        let cascade = Cascade::new(validator()).with_stage(only);
        let mut context = CascadeContext::default();
        assert!(cascade.run(&"page".to_string(), &mut context).await.is_err());
    }
}
