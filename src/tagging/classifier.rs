use log::debug;
use regex::Regex;
use std::collections::BTreeSet;

use super::CuisineHierarchy;
use crate::error::IntakeError;
use crate::model::RecipeDraft;
use crate::vocabulary::{keyword_regex, Vocabulary};

pub const VEGETARIAN_TAG: &str = "vegetarian";
pub const VEGAN_TAG: &str = "vegan";

struct ProteinMatcher {
    tag: String,
    keywords: Option<Regex>,
}

/// Deterministic ingredient-keyword tagging plus cuisine expansion.
pub struct TagClassifier {
    proteins: Vec<ProteinMatcher>,
    other_meat: Option<Regex>,
    byproducts: Option<Regex>,
    exceptions: Option<Regex>,
    cuisines: CuisineHierarchy,
}

impl TagClassifier {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, IntakeError> {
        let proteins = vocabulary
            .proteins
            .iter()
            .map(|category| {
                Ok(ProteinMatcher {
                    tag: category.tag.trim().to_lowercase(),
                    keywords: keyword_regex(&category.keywords)?,
                })
            })
            .collect::<Result<Vec<_>, IntakeError>>()?;

        Ok(Self {
            proteins,
            other_meat: keyword_regex(&vocabulary.diet.other_meat)?,
            byproducts: keyword_regex(&vocabulary.diet.animal_byproducts)?,
            exceptions: keyword_regex(&vocabulary.diet.plant_based_exceptions)?,
            cuisines: CuisineHierarchy::new(&vocabulary.cuisines),
        })
    }

    /// Protein and diet tags for an ingredient list.
    ///
    /// Each protein category is checked on its own. Vegetarian means no
    /// meat, fish or seafood keyword at all; vegan additionally means no
    /// animal byproduct. With no ingredients there is nothing to judge the
    /// diet by, so neither tag is given.
    pub fn classify(&self, ingredients: &[String]) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        if ingredients.iter().all(|i| i.trim().is_empty()) {
            return tags;
        }

        let text = self.normalized_text(ingredients);

        for protein in &self.proteins {
            if matches(&protein.keywords, &text) {
                tags.insert(protein.tag.clone());
            }
        }

        let has_meat = !tags.is_empty() || matches(&self.other_meat, &text);
        if !has_meat {
            tags.insert(VEGETARIAN_TAG.to_string());
            if !matches(&self.byproducts, &text) {
                tags.insert(VEGAN_TAG.to_string());
            }
        }

        tags
    }

    pub fn expand_cuisines(&self, tags: &BTreeSet<String>) -> BTreeSet<String> {
        self.cuisines.expand(tags)
    }

    /// Return a copy of the draft with classified and expanded tags merged in.
    ///
    /// The input is left untouched so callers can keep the untagged version.
    pub fn tag(&self, draft: &RecipeDraft) -> RecipeDraft {
        let mut tags: BTreeSet<String> = draft
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        tags.extend(self.classify(&draft.ingredients));
        let tags = self.expand_cuisines(&tags);

        debug!("Tagged '{}' with {:?}", draft.title, tags);

        RecipeDraft {
            tags,
            ..draft.clone()
        }
    }

    fn normalized_text(&self, ingredients: &[String]) -> String {
        let joined = ingredients.join("\n").to_lowercase();
        match &self.exceptions {
            Some(exceptions) => exceptions.replace_all(&joined, " ").into_owned(),
            None => joined,
        }
    }
}

fn matches(regex: &Option<Regex>, text: &str) -> bool {
    regex.as_ref().is_some_and(|r| r.is_match(text))
}
