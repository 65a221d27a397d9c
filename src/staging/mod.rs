mod store;
mod workflow;

pub use store::RecipeStore;
pub use workflow::{DraftState, StagedDraft, StagingWorkflow};
