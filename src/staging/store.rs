use async_trait::async_trait;

use crate::error::BoxError;
use crate::model::{PersistedRecipe, RecipeInsert};

/// Storage and permission collaborator consumed by the commit workflow.
///
/// Collections and users are opaque ids; membership semantics stay with the
/// implementor, which only answers yes or no.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn insert_recipe(&self, payload: RecipeInsert) -> Result<PersistedRecipe, BoxError>;

    async fn check_read_access(&self, user_id: &str, collection_id: &str) -> Result<bool, BoxError>;

    async fn check_write_access(&self, user_id: &str, collection_id: &str)
        -> Result<bool, BoxError>;

    async fn resolve_default_collection(&self, user_id: &str) -> Result<Option<String>, BoxError>;

    /// The principal behind the current session, if any.
    async fn authenticated_identity(&self) -> Result<Option<String>, BoxError>;
}
