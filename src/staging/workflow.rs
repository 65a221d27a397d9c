use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;

use super::RecipeStore;
use crate::embeddings::Embedder;
use crate::error::{BoxError, IntakeError, IntakeWarning};
use crate::model::{PersistedRecipe, RecipeDraft, RecipeInsert};
use crate::pipelines::Staged;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// Returned to the caller, nothing persisted
    Staged,
    /// Accepted by the caller, commit checks running
    Confirmed,
    Committed,
    Rejected,
}

impl DraftState {
    fn name(self) -> &'static str {
        match self {
            DraftState::Staged => "staged",
            DraftState::Confirmed => "confirmed",
            DraftState::Committed => "committed",
            DraftState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DraftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A draft under review. Lives with the caller; the core keeps no staging table.
#[derive(Debug, Clone)]
pub struct StagedDraft {
    pub draft: RecipeDraft,
    pub warnings: Vec<IntakeWarning>,
    state: DraftState,
}

impl StagedDraft {
    pub fn new(draft: RecipeDraft) -> Self {
        Self {
            draft,
            warnings: Vec::new(),
            state: DraftState::Staged,
        }
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    /// Discard the draft. Only a staged draft can be rejected.
    pub fn reject(&mut self) -> Result<(), IntakeError> {
        self.transition(DraftState::Staged, DraftState::Rejected)
    }

    fn transition(&mut self, from: DraftState, to: DraftState) -> Result<(), IntakeError> {
        if self.state != from {
            return Err(IntakeError::InvalidTransition {
                from: self.state.name(),
                to: to.name(),
            });
        }
        debug!("Draft '{}': {} -> {}", self.draft.title, from, to);
        self.state = to;
        Ok(())
    }
}

impl From<Staged> for StagedDraft {
    fn from(staged: Staged) -> Self {
        Self {
            warnings: staged.warnings,
            ..StagedDraft::new(staged.draft)
        }
    }
}

/// Second phase of an import: authorization, embedding, then exactly one insert.
pub struct StagingWorkflow {
    store: Arc<dyn RecipeStore>,
    embedder: Arc<dyn Embedder>,
}

impl StagingWorkflow {
    pub fn new(store: Arc<dyn RecipeStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Confirm a staged draft and commit it.
    ///
    /// Checks run in a fixed order: collection, read access, write access,
    /// embedding, identity, insert. Any failure puts the draft back in
    /// `Staged` so the caller may confirm again; the state becomes
    /// `Committed` only after the insert succeeds.
    pub async fn confirm(
        &self,
        staged: &mut StagedDraft,
        acting_user_id: &str,
        collection_id: Option<&str>,
    ) -> Result<PersistedRecipe, IntakeError> {
        staged.transition(DraftState::Staged, DraftState::Confirmed)?;
        let confirming = Confirming { staged };

        match self
            .commit(&confirming.staged.draft, acting_user_id, collection_id)
            .await
        {
            Ok(persisted) => {
                confirming.staged.state = DraftState::Committed;
                info!(
                    "Committed '{}' as {} in collection {}",
                    persisted.draft.title, persisted.id, persisted.group_id
                );
                Ok(persisted)
            }
            Err(e) => {
                warn!(
                    "Commit of '{}' failed ({}): {}",
                    confirming.staged.draft.title,
                    e.kind(),
                    e
                );
                Err(e)
            }
        }
    }

    async fn commit(
        &self,
        draft: &RecipeDraft,
        acting_user_id: &str,
        collection_id: Option<&str>,
    ) -> Result<PersistedRecipe, IntakeError> {
        let collection = match collection_id.map(str::trim).filter(|c| !c.is_empty()) {
            Some(id) => id.to_string(),
            None => self
                .store
                .resolve_default_collection(acting_user_id)
                .await
                .map_err(storage_error)?
                .ok_or(IntakeError::NoCollection)?,
        };

        if !self
            .store
            .check_read_access(acting_user_id, &collection)
            .await
            .map_err(storage_error)?
        {
            return Err(IntakeError::AccessDenied(collection));
        }

        if !self
            .store
            .check_write_access(acting_user_id, &collection)
            .await
            .map_err(storage_error)?
        {
            return Err(IntakeError::WriteForbidden(collection));
        }

        let embedding = self
            .embedder
            .embed(&draft.canonical_text())
            .await
            .map_err(|e| IntakeError::EmbeddingFailed(e.to_string()))?;
        if embedding.len() != self.embedder.dimensions() {
            return Err(IntakeError::EmbeddingFailed(format!(
                "expected {} dimensions, got {}",
                self.embedder.dimensions(),
                embedding.len()
            )));
        }

        let identity = self
            .store
            .authenticated_identity()
            .await
            .map_err(storage_error)?;
        if identity.as_deref() != Some(acting_user_id) {
            return Err(IntakeError::IdentityMismatch);
        }

        let payload = RecipeInsert {
            draft: draft.clone(),
            owner_user_id: acting_user_id.to_string(),
            group_id: collection,
            embedding,
        };
        self.store.insert_recipe(payload).await.map_err(storage_error)
    }
}

/// Puts a draft still in `Confirmed` back to `Staged` when dropped.
///
/// Covers both a failed commit and a confirm future dropped mid-await.
struct Confirming<'a> {
    staged: &'a mut StagedDraft,
}

impl Drop for Confirming<'_> {
    fn drop(&mut self) {
        if self.staged.state == DraftState::Confirmed {
            debug!("Draft '{}': confirmed -> staged", self.staged.draft.title);
            self.staged.state = DraftState::Staged;
        }
    }
}

fn storage_error(e: BoxError) -> IntakeError {
    IntakeError::StorageFailed(e.to_string())
}
