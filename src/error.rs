use thiserror::Error;

/// Boxed error returned by external collaborators (LLM, embedder, fetcher, store).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while turning a source into a recipe or committing it
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Every extraction stage ran and fewer than the required valid steps survived
    #[error("Not enough recipe content could be extracted: {0}")]
    InsufficientContent(String),

    /// The video has no captions or transcript to extract from
    #[error("No transcript is available for this video")]
    NoTranscript,

    /// The URL was rejected by the fetch policy before any request was made
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// The document could be requested but not retrieved
    #[error("Failed to fetch document: {0}")]
    FetchFailed(String),

    /// Pasted text expresses an intent to add a recipe but carries no recipe
    #[error("The text does not contain a recipe")]
    NoRecipeContent,

    /// No target collection was given and the user has no default collection
    #[error("No collection available for this recipe")]
    NoCollection,

    /// The acting user cannot read the target collection
    #[error("Access denied to collection {0}")]
    AccessDenied(String),

    /// The acting user can read but not contribute to the target collection
    #[error("Not allowed to add recipes to collection {0}")]
    WriteForbidden(String),

    /// The authenticated principal is not the user the request claims to act for
    #[error("Authenticated identity does not match the acting user")]
    IdentityMismatch,

    /// Embedding generation failed, nothing was written
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    /// The storage collaborator failed an access check or the insert
    #[error("Storage error: {0}")]
    StorageFailed(String),

    /// A staged draft was driven through a transition its state does not allow
    #[error("Cannot move a draft from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Collaborator construction error
    #[error("Provider error: {0}")]
    Provider(String),

    /// A keyword table could not be loaded or compiled
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl IntakeError {
    /// Stable machine-readable kind, suitable for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::InsufficientContent(_) => "insufficient_content",
            IntakeError::NoTranscript => "no_transcript",
            IntakeError::InvalidSource(_) => "invalid_source",
            IntakeError::FetchFailed(_) => "fetch_failed",
            IntakeError::NoRecipeContent => "no_recipe_content",
            IntakeError::NoCollection => "no_collection",
            IntakeError::AccessDenied(_) => "access_denied",
            IntakeError::WriteForbidden(_) => "write_forbidden",
            IntakeError::IdentityMismatch => "identity_mismatch",
            IntakeError::EmbeddingFailed(_) => "embedding_failed",
            IntakeError::StorageFailed(_) => "storage_failed",
            IntakeError::InvalidTransition { .. } => "invalid_transition",
            IntakeError::Provider(_) => "provider_error",
            IntakeError::Vocabulary(_) => "vocabulary_error",
            IntakeError::Config(_) => "config_error",
        }
    }

    /// Human-readable explanation for the person who submitted the source.
    ///
    /// Never includes upstream bodies or internal error chains.
    pub fn user_message(&self) -> String {
        match self {
            IntakeError::InsufficientContent(_) => {
                "We couldn't find a complete recipe on that page. Try pasting the recipe text instead."
                    .to_string()
            }
            IntakeError::NoTranscript => {
                "This video has no captions. You can still save it as a video-only recipe."
                    .to_string()
            }
            IntakeError::InvalidSource(_) => {
                "That link can't be imported. Use a public http or https address.".to_string()
            }
            IntakeError::FetchFailed(_) => {
                "We couldn't load that page. Check the link and try again.".to_string()
            }
            IntakeError::NoRecipeContent => {
                "Paste the recipe itself (ingredients and steps) and we'll take it from there."
                    .to_string()
            }
            IntakeError::NoCollection => {
                "Create or choose a collection before saving this recipe.".to_string()
            }
            IntakeError::AccessDenied(_) => "You don't have access to that collection.".to_string(),
            IntakeError::WriteForbidden(_) => {
                "You can view that collection but not add recipes to it.".to_string()
            }
            IntakeError::IdentityMismatch => {
                "Your session doesn't match this request. Sign in again and retry.".to_string()
            }
            IntakeError::EmbeddingFailed(_) => {
                "Saving failed before anything was stored. Please confirm again.".to_string()
            }
            IntakeError::StorageFailed(_) => {
                "The recipe couldn't be saved. Please try again.".to_string()
            }
            IntakeError::InvalidTransition { .. } => {
                "This recipe has already been handled.".to_string()
            }
            IntakeError::Provider(_) | IntakeError::Vocabulary(_) | IntakeError::Config(_) => {
                "Recipe import is not configured correctly.".to_string()
            }
        }
    }
}

/// Why a single cascade stage did not produce an acceptable draft.
///
/// Stays inside the pipeline; the cascade turns the last one into an [`IntakeError`].
#[derive(Error, Debug)]
pub enum StageFailure {
    /// The stage found nothing it knows how to read (no markup, no lists)
    #[error("nothing to extract: {0}")]
    NotApplicable(String),

    /// The stage produced a draft but too few steps passed validation
    #[error("only {valid_steps} valid steps")]
    Insufficient { valid_steps: usize },

    /// The collaborator answered with something that could not be parsed
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The collaborator call itself failed or timed out
    #[error("upstream failure: {0}")]
    Upstream(String),
}

/// Non-terminal conditions attached to a staged draft for the caller to review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeWarning {
    /// The translation appears to contain fewer steps than the source
    TranslationIncomplete { expected: usize, found: usize },
    /// Translation could not be obtained; the untranslated text was used
    TranslationUnavailable { source_language: String },
}

impl IntakeWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeWarning::TranslationIncomplete { .. } => "translation_incomplete",
            IntakeWarning::TranslationUnavailable { .. } => "translation_unavailable",
        }
    }

    pub fn message(&self) -> String {
        match self {
            IntakeWarning::TranslationIncomplete { expected, found } => format!(
                "The original appears to have {expected} steps but the translation has {found}. Please check that no steps are missing."
            ),
            IntakeWarning::TranslationUnavailable { source_language } => format!(
                "The recipe could not be translated from {source_language}; it was imported in its original language."
            ),
        }
    }
}

impl std::fmt::Display for IntakeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}
