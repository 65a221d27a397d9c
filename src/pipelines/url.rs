use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

use super::cascade::{Cascade, CascadeContext, Strategy};
use crate::config::FetchConfig;
use crate::error::{IntakeError, StageFailure};
use crate::extractors::{ExtractionMode, GenerativeExtractor};
use crate::model::{Confidence, RecipeDraft};
use crate::providers::LlmProvider;
use crate::steps::{StepCondenser, StepValidator};
use crate::url_to_text::fetchers::DocumentFetcher;
use crate::url_to_text::guard::{HostResolver, UrlGuard};
use crate::url_to_text::html::extractors::{
    page_title, Extractor, HtmlClassExtractor, JsonLdExtractor, MicroDataExtractor,
    ParsingContext,
};
use crate::url_to_text::text::{extract_page_text, MAX_PAGE_TEXT_CHARS};

/// A fetched page as the URL strategies see it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
}

/// Run extractors in order over one parse of the page.
///
/// Synchronous so the non-`Send` document never crosses an await.
fn parse_page(page: &FetchedPage, extractors: &[&dyn Extractor]) -> Result<RecipeDraft, StageFailure> {
    let context = ParsingContext::new(&page.url, &page.html);
    let mut last = StageFailure::NotApplicable("no extractor ran".to_string());
    for extractor in extractors {
        match extractor.parse(&context) {
            Ok(draft) => {
                info!("{} extracted '{}'", extractor.name(), draft.title);
                return Ok(draft);
            }
            Err(failure) => last = failure,
        }
    }
    Err(last)
}

/// Visible text for the model, plus the page heading it will not return.
fn page_text_and_title(page: &FetchedPage) -> (String, Option<String>) {
    let context = ParsingContext::new(&page.url, &page.html);
    (
        extract_page_text(&page.html, MAX_PAGE_TEXT_CHARS),
        page_title(&context.document),
    )
}

/// JSON-LD, then microdata.
pub struct SchemaStrategy;

#[async_trait]
impl Strategy<FetchedPage> for SchemaStrategy {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Schema
    }

    async fn attempt(
        &self,
        page: &FetchedPage,
        _context: &mut CascadeContext,
    ) -> Result<RecipeDraft, StageFailure> {
        parse_page(page, &[&JsonLdExtractor, &MicroDataExtractor])
    }
}

pub struct HtmlHeuristicStrategy;

#[async_trait]
impl Strategy<FetchedPage> for HtmlHeuristicStrategy {
    fn name(&self) -> &'static str {
        "html_heuristic"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Html
    }

    async fn attempt(
        &self,
        page: &FetchedPage,
        _context: &mut CascadeContext,
    ) -> Result<RecipeDraft, StageFailure> {
        parse_page(page, &[&HtmlClassExtractor])
    }
}

/// Steps only, from the page's visible text.
pub struct GenerativePageStrategy {
    extractor: GenerativeExtractor,
}

#[async_trait]
impl Strategy<FetchedPage> for GenerativePageStrategy {
    fn name(&self) -> &'static str {
        "generative"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Generative
    }

    async fn attempt(
        &self,
        page: &FetchedPage,
        _context: &mut CascadeContext,
    ) -> Result<RecipeDraft, StageFailure> {
        let (text, title) = page_text_and_title(page);
        let mut draft = self.extractor.extract(&text, ExtractionMode::PageSteps).await?;
        if draft.title.trim().is_empty() {
            draft.title = title.unwrap_or_default();
        }
        Ok(draft)
    }
}

pub struct UrlPipeline {
    guard: UrlGuard,
    resolver: Arc<dyn HostResolver>,
    fetcher: Arc<dyn DocumentFetcher>,
    cascade: Cascade<FetchedPage>,
    condenser: StepCondenser,
}

impl UrlPipeline {
    pub fn new(
        config: &FetchConfig,
        resolver: Arc<dyn HostResolver>,
        fetcher: Arc<dyn DocumentFetcher>,
        provider: Arc<dyn LlmProvider>,
        validator: Arc<StepValidator>,
    ) -> Self {
        let cascade = Cascade::new(validator)
            .with_stage(SchemaStrategy)
            .with_stage(HtmlHeuristicStrategy)
            .with_stage(GenerativePageStrategy {
                extractor: GenerativeExtractor::new(provider.clone()),
            });
        debug!("URL cascade stages: {:?}", cascade.stage_names());

        Self {
            guard: UrlGuard::new(config),
            resolver,
            fetcher,
            cascade,
            condenser: StepCondenser::new(provider),
        }
    }

    /// Validate, fetch and extract one page.
    ///
    /// Policy violations are rejected before any request is issued.
    pub async fn extract(&self, url: &str) -> Result<RecipeDraft, IntakeError> {
        let checked = self.guard.check(url, self.resolver.as_ref()).await?;

        let document = self.fetcher.fetch(checked.as_str()).await.map_err(|e| {
            warn!("Fetching {} failed: {}", checked, e);
            IntakeError::FetchFailed(e.to_string())
        })?;
        if !document.is_success() {
            return Err(IntakeError::FetchFailed(format!(
                "server answered with status {}",
                document.status
            )));
        }

        let page = FetchedPage {
            url: document.final_url,
            html: document.body,
        };
        let mut context = CascadeContext::default();
        let result = self.cascade.run(&page, &mut context).await?;
        info!(
            "Extracted '{}' from {} with {} confidence",
            result.recipe.title, checked, result.confidence
        );

        let mut draft = result.recipe;
        draft.steps = self.condenser.condense(draft.steps).await;
        draft.source_url = Some(checked.to_string());
        Ok(draft)
    }
}
