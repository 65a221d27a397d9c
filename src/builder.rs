use log::info;
use std::sync::Arc;

use crate::config::IntakeConfig;
use crate::embeddings::Embedder;
use crate::error::{IntakeError, IntakeWarning};
use crate::model::RecipeDraft;
use crate::pipelines::image::{ImageInput, ImagePipeline};
use crate::pipelines::text::TextPipeline;
use crate::pipelines::url::UrlPipeline;
use crate::pipelines::video::{VideoInput, VideoPipeline};
use crate::pipelines::Staged;
use crate::providers::{FallbackProvider, LlmProvider};
use crate::staging::{RecipeStore, StagingWorkflow};
use crate::steps::StepValidator;
use crate::tagging::TagClassifier;
use crate::url_to_text::fetchers::{DocumentFetcher, RequestFetcher};
use crate::url_to_text::guard::{HostResolver, SystemResolver};
use crate::vocabulary::Vocabulary;

/// Builder for wiring collaborators into a [`RecipeIntake`]
///
/// Anything not set is built from the configuration: the provider chain
/// from `[providers]` and `[fallback]`, a reqwest fetcher from `[fetch]`,
/// the system DNS resolver, and the built-in keyword tables.
#[derive(Default)]
pub struct RecipeIntakeBuilder {
    config: Option<IntakeConfig>,
    provider: Option<Arc<dyn LlmProvider>>,
    fetcher: Option<Arc<dyn DocumentFetcher>>,
    resolver: Option<Arc<dyn HostResolver>>,
    vocabulary: Option<Vocabulary>,
}

impl RecipeIntakeBuilder {
    pub fn config(mut self, config: IntakeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use this text-generation provider instead of the configured chain
    ///
    /// # Example
    /// ```no_run
    /// use recipe_intake::providers::OpenAIProvider;
    /// use recipe_intake::config::ProviderConfig;
    /// use recipe_intake::RecipeIntake;
    /// use std::sync::Arc;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    /// let config = ProviderConfig {
    ///     enabled: true,
    ///     model: "gpt-4.1-mini".to_string(),
    ///     temperature: 0.2,
    ///     max_tokens: 4000,
    ///     api_key: Some("sk-...".to_string()),
    ///     base_url: None,
    ///     timeout_secs: 60,
    /// };
    /// let intake = RecipeIntake::builder()
    ///     .provider(Arc::new(OpenAIProvider::new(&config)?))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replace the built-in keyword tables
    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Construct every collaborator and the four channel pipelines
    ///
    /// # Errors
    /// Returns `IntakeError` if:
    /// - no provider is set and none can be built from the configuration
    /// - the HTTP client cannot be constructed
    /// - the keyword tables fail to load or compile
    pub fn build(self) -> Result<RecipeIntake, IntakeError> {
        let config = self.config.unwrap_or_default();

        let provider: Arc<dyn LlmProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(
                FallbackProvider::new(&config).map_err(|e| IntakeError::Provider(e.to_string()))?,
            ),
        };
        let resolver: Arc<dyn HostResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(SystemResolver),
        };
        let fetcher: Arc<dyn DocumentFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(RequestFetcher::new(&config.fetch, resolver.clone())?),
        };
        let vocabulary = match self.vocabulary {
            Some(vocabulary) => vocabulary,
            None => Vocabulary::load(config.vocabulary_path.as_deref())?,
        };

        let validator = Arc::new(StepValidator::new(&vocabulary)?);
        let classifier = TagClassifier::new(&vocabulary)?;

        info!(
            "Recipe intake ready with provider '{}'",
            provider.provider_name()
        );

        Ok(RecipeIntake {
            url: UrlPipeline::new(
                &config.fetch,
                resolver,
                fetcher,
                provider.clone(),
                validator.clone(),
            ),
            image: ImagePipeline::new(provider.clone(), &config.translation.target_language),
            video: VideoPipeline::new(&config.fetch, provider.clone(), validator),
            text: TextPipeline::new(provider),
            classifier,
        })
    }
}

/// Entry point: one method per source channel, each returning a staged draft
pub struct RecipeIntake {
    url: UrlPipeline,
    image: ImagePipeline,
    video: VideoPipeline,
    text: TextPipeline,
    classifier: TagClassifier,
}

impl RecipeIntake {
    pub fn builder() -> RecipeIntakeBuilder {
        RecipeIntakeBuilder::default()
    }

    pub fn from_config(config: &IntakeConfig) -> Result<Self, IntakeError> {
        Self::builder().config(config.clone()).build()
    }

    /// Fetch a recipe page and stage what the cascade extracts from it
    ///
    /// # Example
    /// ```no_run
    /// # use recipe_intake::RecipeIntake;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let intake = RecipeIntake::from_config(&recipe_intake::config::load_config()?)?;
    /// let staged = intake
    ///     .from_url("https://example.com/recipe", "Sam")
    ///     .await?;
    /// println!("{}", staged.draft.title);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_url(&self, url: &str, contributor: &str) -> Result<Staged, IntakeError> {
        let draft = self.url.extract(url).await?;
        Ok(self.stage(draft, contributor, Vec::new()))
    }

    pub async fn from_image(
        &self,
        input: &ImageInput,
        contributor: &str,
    ) -> Result<Staged, IntakeError> {
        let (draft, warnings) = self.image.extract(input).await?;
        Ok(self.stage(draft, contributor, warnings))
    }

    /// Fails with `NoTranscript` when no captions were supplied; see
    /// [`RecipeIntake::video_reference`] for keeping the link anyway.
    pub async fn from_video(
        &self,
        input: &VideoInput,
        contributor: &str,
    ) -> Result<Staged, IntakeError> {
        let draft = self.video.extract(input).await?;
        Ok(self.stage(draft, contributor, Vec::new()))
    }

    /// Stage a video-only reference with no title, ingredients or steps.
    ///
    /// The link must pass the same scheme and address rules as [`RecipeIntake::from_video`].
    pub fn video_reference(
        &self,
        input: &VideoInput,
        contributor: &str,
        reason: &str,
    ) -> Result<Staged, IntakeError> {
        let mut draft = self.video.reference(input, reason)?;
        draft.contributor_name = contributor.trim().to_string();
        Ok(Staged::new(draft))
    }

    pub async fn from_text(&self, text: &str, contributor: &str) -> Result<Staged, IntakeError> {
        let draft = self.text.extract(text).await?;
        Ok(self.stage(draft, contributor, Vec::new()))
    }

    /// Commit workflow over the given storage and embedding collaborators
    pub fn commit_workflow(
        &self,
        store: Arc<dyn RecipeStore>,
        embedder: Arc<dyn Embedder>,
    ) -> StagingWorkflow {
        StagingWorkflow::new(store, embedder)
    }

    fn stage(
        &self,
        mut draft: RecipeDraft,
        contributor: &str,
        warnings: Vec<IntakeWarning>,
    ) -> Staged {
        draft.contributor_name = contributor.trim().to_string();
        Staged {
            draft: self.classifier.tag(&draft),
            warnings,
        }
    }
}
