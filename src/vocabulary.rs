//! Keyword tables for tagging and step validation.
//!
//! The tables are data, not code: a default set is compiled in from
//! `vocabulary.toml` and a replacement can be loaded from disk. Both go
//! through the `config` crate so the file format matches the main config.

use config::{Config, File, FileFormat};
use serde::Deserialize;

use crate::error::IntakeError;

const DEFAULT_VOCABULARY: &str = include_str!("vocabulary.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Vocabulary {
    pub proteins: Vec<ProteinCategory>,
    pub diet: DietTables,
    pub steps: StepTables,
    #[serde(default)]
    pub cuisines: Vec<CuisineParents>,
}

/// One protein tag and the keywords that earn it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProteinCategory {
    pub tag: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DietTables {
    #[serde(default)]
    pub other_meat: Vec<String>,
    #[serde(default)]
    pub animal_byproducts: Vec<String>,
    #[serde(default)]
    pub plant_based_exceptions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepTables {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    pub cooking_verbs: Vec<String>,
    #[serde(default)]
    pub rejections: Vec<RejectionGroup>,
}

/// Patterns that mark a string as narrative rather than an instruction.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectionGroup {
    pub kind: String,
    pub patterns: Vec<String>,
}

/// A regional cuisine and the broader cuisines it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct CuisineParents {
    pub name: String,
    pub parents: Vec<String>,
}

fn default_min_length() -> usize {
    20
}

impl Vocabulary {
    /// The built-in tables.
    pub fn load_default() -> Result<Self, IntakeError> {
        Self::from_toml(DEFAULT_VOCABULARY)
    }

    pub fn from_toml(source: &str) -> Result<Self, IntakeError> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Load replacement tables from a TOML file.
    pub fn from_path(path: &str) -> Result<Self, IntakeError> {
        let settings = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Either the file named in config or the built-in tables.
    pub fn load(path: Option<&str>) -> Result<Self, IntakeError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::load_default(),
        }
    }
}

/// Whole-word, case-insensitive alternation of `words`, with an optional plural suffix.
///
/// Returns `None` for an empty list so callers can treat "no keywords" as "never matches".
pub(crate) fn keyword_regex(words: &[String]) -> Result<Option<regex::Regex>, IntakeError> {
    let mut alternatives: Vec<String> = words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(&w))
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    // Longest first so "egg white" wins over "egg"
    alternatives.sort_by_key(|w| std::cmp::Reverse(w.len()));

    let pattern = format!(r"(?i)\b(?:{})(?:s|es)?\b", alternatives.join("|"));
    regex::Regex::new(&pattern)
        .map(Some)
        .map_err(|e| IntakeError::Vocabulary(e.to_string()))
}
