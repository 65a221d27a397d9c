pub mod builder;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractors;
pub mod model;
pub mod pipelines;
pub mod providers;
pub mod staging;
pub mod steps;
pub mod tagging;
pub mod translation;
pub mod url_to_text;
pub mod vocabulary;

// Re-export key types for convenience
pub use builder::{RecipeIntake, RecipeIntakeBuilder};
pub use config::{load_config, IntakeConfig};
pub use error::{BoxError, IntakeError, IntakeWarning};
pub use model::{Confidence, PersistedRecipe, RecipeDraft, RecipeInsert, VideoPlatform};
pub use pipelines::image::ImageInput;
pub use pipelines::video::VideoInput;
pub use pipelines::Staged;
pub use staging::{DraftState, RecipeStore, StagedDraft, StagingWorkflow};
