use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The in-flight recipe record produced by every source channel.
///
/// Serializes to the preview shape handed back to the caller for review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    /// Each entry keeps its inline quantity and unit text
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    /// Lowercased and deduplicated
    pub tags: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_platform: Option<VideoPlatform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookbook_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookbook_page: Option<String>,
    pub contributor_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub incomplete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RecipeDraft {
    /// A reference to a video whose recipe could not be extracted.
    ///
    /// Title, ingredients and steps are left empty and the draft is marked incomplete.
    pub fn video_reference(
        video_url: impl Into<String>,
        contributor_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let video_url = video_url.into();
        RecipeDraft {
            video_platform: Some(VideoPlatform::from_url(&video_url)),
            video_url: Some(video_url),
            contributor_name: contributor_name.into(),
            incomplete: true,
            reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Complete drafts need a title and at least one of ingredients or steps.
    pub fn is_well_formed(&self) -> bool {
        if self.incomplete {
            return true;
        }
        !self.title.trim().is_empty() && (!self.ingredients.is_empty() || !self.steps.is_empty())
    }

    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() {
            self.tags.insert(tag);
        }
    }

    /// Labeled-section text used as the embedding input.
    pub fn canonical_text(&self) -> String {
        let mut text = format!("Title: {}\n", self.title.trim());

        text.push_str("Ingredients:\n");
        for ingredient in &self.ingredients {
            text.push_str("- ");
            text.push_str(ingredient.trim());
            text.push('\n');
        }

        text.push_str("Steps:\n");
        for (i, step) in self.steps.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, step.trim()));
        }

        text.push_str("Tags: ");
        text.push_str(&self.tags.iter().cloned().collect::<Vec<_>>().join(", "));
        text
    }
}

/// Video hosting platform, derived from the video URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoPlatform {
    Youtube,
    Tiktok,
    Instagram,
    Facebook,
    Vimeo,
    Other,
}

impl VideoPlatform {
    pub fn from_url(url: &str) -> Self {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
            .unwrap_or_default();
        let host = host.trim_start_matches("www.").trim_start_matches("m.");

        match host {
            "youtube.com" | "youtu.be" | "music.youtube.com" => VideoPlatform::Youtube,
            "tiktok.com" | "vm.tiktok.com" => VideoPlatform::Tiktok,
            "instagram.com" => VideoPlatform::Instagram,
            "facebook.com" | "fb.watch" => VideoPlatform::Facebook,
            "vimeo.com" | "player.vimeo.com" => VideoPlatform::Vimeo,
            _ => VideoPlatform::Other,
        }
    }
}

/// How a draft was obtained, ordered from most to least deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Schema,
    Html,
    Generative,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Confidence::Schema => "schema",
            Confidence::Html => "html",
            Confidence::Generative => "generative",
        };
        f.write_str(name)
    }
}

/// Output of one cascade stage.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub recipe: RecipeDraft,
    pub confidence: Confidence,
}

/// Pre-insert payload built by the commit workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInsert {
    #[serde(flatten)]
    pub draft: RecipeDraft,
    pub owner_user_id: String,
    pub group_id: String,
    pub embedding: Vec<f32>,
}

/// A stored recipe as returned by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecipe {
    pub id: String,
    #[serde(flatten)]
    pub draft: RecipeDraft,
    pub owner_user_id: String,
    pub group_id: String,
    pub embedding: Vec<f32>,
    pub created_at: String,
    pub updated_at: String,
}
