pub mod cascade;
pub mod image;
pub mod text;
pub mod url;
pub mod video;

use serde::Serialize;

use crate::error::IntakeWarning;
use crate::model::RecipeDraft;

/// A draft handed back to the caller for review, with anything worth flagging.
#[derive(Debug, Clone, Serialize)]
pub struct Staged {
    pub draft: RecipeDraft,
    #[serde(skip)]
    pub warnings: Vec<IntakeWarning>,
}

impl Staged {
    pub fn new(draft: RecipeDraft) -> Self {
        Self {
            draft,
            warnings: Vec::new(),
        }
    }
}
