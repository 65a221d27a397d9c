use log::debug;
use serde::Deserialize;
use serde_json::Value;

use super::{
    decode_html_symbols, selector, split_instruction_block, split_tags, Extractor, ParsingContext,
};
use crate::error::StageFailure;
use crate::model::RecipeDraft;

pub struct JsonLdExtractor;

#[derive(Debug, Deserialize)]
struct JsonLdRecipe {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    image: Option<Value>,
    #[serde(rename = "recipeIngredient", default)]
    recipe_ingredient: Option<OneOrMany>,
    #[serde(rename = "recipeInstructions", default)]
    recipe_instructions: Option<Value>,
    #[serde(rename = "recipeCuisine", default)]
    recipe_cuisine: Option<OneOrMany>,
    #[serde(rename = "recipeCategory", default)]
    recipe_category: Option<OneOrMany>,
    #[serde(default)]
    keywords: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

impl TryFrom<&Value> for JsonLdRecipe {
    type Error = serde_json::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value.clone())
    }
}

impl JsonLdExtractor {
    fn convert_to_draft(&self, recipe: JsonLdRecipe, url: &str) -> RecipeDraft {
        let mut draft = RecipeDraft {
            title: recipe
                .name
                .map(|n| decode_html_symbols(&n))
                .unwrap_or_default(),
            source_url: Some(url.to_string()),
            ..Default::default()
        };

        if let Some(ingredients) = recipe.recipe_ingredient {
            draft.ingredients = ingredients
                .into_vec()
                .iter()
                .map(|i| decode_html_symbols(i))
                .filter(|i| !i.is_empty())
                .collect();
        }

        if let Some(instructions) = &recipe.recipe_instructions {
            draft.steps = instruction_texts(instructions);
        }

        draft.image_url = recipe.image.as_ref().and_then(first_image);

        let mut tag_sources = Vec::new();
        for field in [recipe.recipe_cuisine, recipe.recipe_category, recipe.keywords]
            .into_iter()
            .flatten()
        {
            tag_sources.extend(field.into_vec());
        }
        for tag in split_tags(&tag_sources) {
            draft.add_tag(&tag);
        }

        draft
    }
}

/// Flatten every instruction shape schema.org allows into step strings.
fn instruction_texts(value: &Value) -> Vec<String> {
    let mut steps = Vec::new();
    collect_instructions(value, &mut steps);
    steps
        .iter()
        .map(|s| decode_html_symbols(s))
        .filter(|s| !s.is_empty())
        .collect()
}

fn collect_instructions(value: &Value, steps: &mut Vec<String>) {
    match value {
        Value::String(text) => steps.extend(split_instruction_block(text)),
        Value::Array(items) => {
            for item in items {
                collect_instructions(item, steps);
            }
        }
        Value::Object(object) => {
            if let Some(items) = object.get("itemListElement") {
                collect_instructions(items, steps);
            } else if let Some(text) = object.get("text").and_then(Value::as_str) {
                steps.push(text.to_string());
            } else if let Some(name) = object.get("name").and_then(Value::as_str) {
                steps.push(name.to_string());
            }
        }
        _ => {}
    }
}

fn first_image(value: &Value) -> Option<String> {
    match value {
        Value::String(url) if !url.trim().is_empty() => Some(decode_html_symbols(url)),
        Value::Array(items) => items.iter().find_map(first_image),
        Value::Object(object) => object
            .get("url")
            .or_else(|| object.get("contentUrl"))
            .and_then(first_image),
        _ => None,
    }
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("recipe"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case("recipe")),
        _ => false,
    }
}

fn find_recipe(json_ld: &Value) -> Option<&Value> {
    if is_recipe_type(json_ld) {
        return Some(json_ld);
    }
    if let Some(items) = json_ld.as_array() {
        return items.iter().find_map(find_recipe);
    }
    if let Some(graph) = json_ld.get("@graph") {
        return find_recipe(graph);
    }
    None
}

/// Strip HTML comment / CDATA wrappers and trailing commas that break `serde_json`.
fn sanitize_json(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_start_matches("<!--")
        .trim_end_matches("-->")
        .trim()
        .trim_start_matches("//<![CDATA[")
        .trim_end_matches("//]]>")
        .trim();

    let mut cleaned = String::with_capacity(trimmed.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = trimmed.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                // raw newlines inside strings are invalid JSON
                '\n' | '\r' => {
                    cleaned.push(' ');
                    continue;
                }
                _ => {}
            }
            cleaned.push(c);
            continue;
        }

        match c {
            '"' => in_string = true,
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if matches!(next, Some('}') | Some(']')) {
                    debug!("Dropping trailing comma in JSON-LD");
                    continue;
                }
            }
            _ => {}
        }
        cleaned.push(c);
    }

    cleaned
}

impl Extractor for JsonLdExtractor {
    fn name(&self) -> &'static str {
        "json_ld"
    }

    fn parse(&self, context: &ParsingContext) -> Result<RecipeDraft, StageFailure> {
        debug!("JsonLdExtractor: Starting parse for URL: {}", context.url);
        let Some(script_selector) = selector("script[type='application/ld+json']") else {
            return Err(StageFailure::NotApplicable("invalid selector".to_string()));
        };

        let scripts: Vec<_> = context.document.select(&script_selector).collect();
        debug!("JsonLdExtractor: Found {} JSON-LD script tags", scripts.len());

        for (index, script) in scripts.iter().enumerate() {
            let cleaned = sanitize_json(&script.inner_html());
            let json_ld = match serde_json::from_str::<Value>(&cleaned) {
                Ok(json_ld) => json_ld,
                Err(e) => {
                    debug!("JsonLdExtractor: Failed to parse JSON-LD {}: {}", index, e);
                    continue;
                }
            };

            let Some(recipe) = find_recipe(&json_ld) else {
                debug!("JsonLdExtractor: No recipe found in JSON-LD {}", index);
                continue;
            };

            match JsonLdRecipe::try_from(recipe) {
                Ok(recipe) => return Ok(self.convert_to_draft(recipe, &context.url)),
                Err(e) => {
                    debug!("JsonLdExtractor: Failed to convert JSON-LD {}: {}", index, e);
                }
            }
        }

        Err(StageFailure::NotApplicable(
            "no valid recipe found in any JSON-LD script".to_string(),
        ))
    }
}
