use log::debug;
use scraper::{ElementRef, Html};

use super::{element_text, page_title, selector, Extractor, ParsingContext};
use crate::error::StageFailure;
use crate::model::RecipeDraft;

/// Recipe-plugin class names and a few generic fallbacks.
pub struct HtmlClassExtractor;

#[derive(Clone, Copy)]
enum Field {
    Title,
    Ingredients,
    Instructions,
}

impl Field {
    /// Class names emitted by common recipe plugins (WPRM, Tasty, Mediavine, WPZoom, ...).
    fn exact_classes(self) -> &'static [&'static str] {
        match self {
            Field::Title => &[
                "wprm-recipe-name",
                "tasty-recipes-title",
                "mv-create-title",
                "wpzoom-recipe-card-title",
                "recipe-card-title",
                "recipe-title",
                "recipe-name",
            ],
            Field::Ingredients => &[
                "wprm-recipe-ingredients-container",
                "tasty-recipes-ingredients",
                "mv-create-ingredients",
                "wpzoom-recipe-ingredients",
                "structured-ingredients",
                "recipe-ingredients",
                "ingredients-list",
                "ingredients",
            ],
            Field::Instructions => &[
                "wprm-recipe-instructions-container",
                "tasty-recipes-instructions",
                "mv-create-instructions",
                "wpzoom-recipe-instructions",
                "structured-project__steps",
                "recipe-instructions",
                "recipe-directions",
                "instructions",
                "directions",
            ],
        }
    }

    fn fuzzy_patterns(self) -> &'static [&'static str] {
        match self {
            Field::Title => &[],
            Field::Ingredients => &["ingredient"],
            Field::Instructions => &["instruction", "direction", "method", "step"],
        }
    }

    fn label(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Ingredients => "ingredients",
            Field::Instructions => "instructions",
        }
    }
}

impl HtmlClassExtractor {
    fn find_title(&self, document: &Html) -> Option<String> {
        Field::Title
            .exact_classes()
            .iter()
            .filter_map(|class| selector(&format!(".{class}")))
            .find_map(|s| document.select(&s).map(element_text).find(|t| !t.is_empty()))
            .or_else(|| page_title(document))
    }

    fn extract_list_items(&self, document: &Html, field: Field) -> Vec<String> {
        for class_name in field.exact_classes() {
            let Some(container_selector) = selector(&format!(".{class_name}")) else {
                continue;
            };
            let items: Vec<String> = document
                .select(&container_selector)
                .flat_map(container_items)
                .collect();
            if !items.is_empty() {
                debug!("Found {} {} using class: {}", items.len(), field.label(), class_name);
                return items;
            }
        }

        for pattern in field.fuzzy_patterns() {
            let Some(fuzzy) = selector(&format!("[class*='{pattern}']")) else {
                continue;
            };
            // Outermost match only; nested matches would repeat items.
            let items: Vec<String> = document
                .select(&fuzzy)
                .filter(|el| !has_matching_ancestor(*el, pattern))
                .flat_map(container_items)
                .collect();
            if !items.is_empty() {
                debug!(
                    "Found {} {} using fuzzy class pattern: {}",
                    items.len(),
                    field.label(),
                    pattern
                );
                return items;
            }
        }

        Vec::new()
    }
}

/// `li` children first, then `p`/`div` blocks of plausible size.
fn container_items(container: ElementRef) -> Vec<String> {
    let items: Vec<String> = selector("li")
        .map(|li| {
            container
                .select(&li)
                .map(element_text)
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();
    if !items.is_empty() {
        return items;
    }

    selector("p, div")
        .map(|blocks| {
            container
                .select(&blocks)
                .filter(|el| !el.children().filter_map(ElementRef::wrap).any(is_block))
                .map(element_text)
                .filter(|t| t.len() > 5 && t.len() < 500)
                .collect()
        })
        .unwrap_or_default()
}

fn is_block(element: ElementRef) -> bool {
    matches!(element.value().name(), "p" | "div" | "ul" | "ol" | "section")
}

fn has_matching_ancestor(element: ElementRef, pattern: &str) -> bool {
    element.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        ancestor
            .value()
            .attr("class")
            .is_some_and(|class| class.contains(pattern))
    })
}

/// Items of the `<ol>` with the most entries.
fn longest_ordered_list(document: &Html) -> Vec<String> {
    let (Some(ol), Some(li)) = (selector("ol"), selector("li")) else {
        return Vec::new();
    };
    document
        .select(&ol)
        .map(|list| {
            list.select(&li)
                .map(element_text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
        })
        .max_by_key(Vec::len)
        .unwrap_or_default()
}

impl Extractor for HtmlClassExtractor {
    fn name(&self) -> &'static str {
        "html_class"
    }

    fn parse(&self, context: &ParsingContext) -> Result<RecipeDraft, StageFailure> {
        debug!("Attempting to extract recipe using HTML class matchers");
        let document = &context.document;

        let title = self.find_title(document).unwrap_or_default();
        let ingredients = self.extract_list_items(document, Field::Ingredients);
        let mut steps = self.extract_list_items(document, Field::Instructions);
        if steps.is_empty() {
            steps = longest_ordered_list(document);
            debug!("Falling back to longest <ol> with {} items", steps.len());
        }

        if ingredients.is_empty() && steps.is_empty() {
            return Err(StageFailure::NotApplicable(
                "could not extract recipe content from HTML".to_string(),
            ));
        }

        debug!(
            "HTML class extraction: title '{}', {} ingredients, {} steps",
            title,
            ingredients.len(),
            steps.len()
        );

        Ok(RecipeDraft {
            title,
            ingredients,
            steps,
            source_url: Some(context.url.clone()),
            ..Default::default()
        })
    }
}
