use log::debug;
use scraper::{ElementRef, Html};

use super::{
    decode_html_symbols, element_text, selector, split_instruction_block, split_tags, Extractor,
    ParsingContext,
};
use crate::error::StageFailure;
use crate::model::RecipeDraft;

pub struct MicroDataExtractor;

impl MicroDataExtractor {
    fn find_recipe_container<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let scope = selector("[itemscope]")?;
        document.select(&scope).find(|element| {
            element.value().attr("itemtype").is_some_and(|itemtype| {
                itemtype.contains("schema.org/Recipe")
                    || itemtype.contains("data-vocabulary.org/Recipe")
            })
        })
    }

    fn get_itemprop(&self, root: ElementRef, prop: &str) -> Option<String> {
        self.get_itemprop_list(root, prop).into_iter().next()
    }

    /// Values of every `itemprop`, taken from `content` (as on `<meta>`) before element text.
    fn get_itemprop_list(&self, root: ElementRef, prop: &str) -> Vec<String> {
        let Some(prop_selector) = selector(&format!("[itemprop='{prop}']")) else {
            return Vec::new();
        };
        root.select(&prop_selector)
            .map(itemprop_value)
            .filter(|text| !text.is_empty())
            .collect()
    }

    fn get_image(&self, root: ElementRef) -> Option<String> {
        let image_selector = selector("[itemprop='image']")?;
        let element = root.select(&image_selector).next()?;
        let value = element.value();
        value
            .attr("src")
            .or_else(|| value.attr("content"))
            .or_else(|| value.attr("href"))
            .map(str::to_string)
            .or_else(|| Some(element_text(element)))
            .filter(|url| !url.is_empty())
    }
}

fn itemprop_value(element: ElementRef) -> String {
    match element.value().attr("content") {
        Some(content) => decode_html_symbols(content).trim().to_string(),
        None => element_text(element),
    }
}

impl Extractor for MicroDataExtractor {
    fn name(&self) -> &'static str {
        "microdata"
    }

    fn parse(&self, context: &ParsingContext) -> Result<RecipeDraft, StageFailure> {
        debug!("Attempting to extract recipe using MicroData extractor");

        // Unscoped itemprop lookups pick up site names and author bios.
        let container = self
            .find_recipe_container(&context.document)
            .ok_or_else(|| StageFailure::NotApplicable("no microdata Recipe container".to_string()))?;

        let title = self.get_itemprop(container, "name").unwrap_or_default();

        let mut ingredients = self.get_itemprop_list(container, "recipeIngredient");
        if ingredients.is_empty() {
            ingredients = self.get_itemprop_list(container, "ingredients");
        }

        let mut instructions = self.get_itemprop_list(container, "recipeInstructions");
        if instructions.is_empty() {
            instructions = self.get_itemprop_list(container, "instructions");
        }
        let steps = if instructions.len() == 1 {
            split_instruction_block(&instructions[0])
        } else {
            instructions
        };

        if ingredients.is_empty() && steps.is_empty() {
            return Err(StageFailure::NotApplicable(
                "microdata container has no recipe content".to_string(),
            ));
        }

        let mut draft = RecipeDraft {
            title,
            ingredients,
            steps,
            source_url: Some(context.url.clone()),
            image_url: self.get_image(container),
            ..Default::default()
        };

        let tag_sources: Vec<String> = ["recipeCuisine", "recipeCategory", "keywords"]
            .iter()
            .flat_map(|prop| self.get_itemprop_list(container, prop))
            .collect();
        for tag in split_tags(&tag_sources) {
            draft.add_tag(&tag);
        }

        Ok(draft)
    }
}
