mod anthropic;
mod factory;
mod fallback;
mod open_ai;
pub mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use fallback::FallbackProvider;
pub use open_ai::OpenAIProvider;

use crate::error::BoxError;
use async_trait::async_trait;
use serde_json::Value;

/// Per-call generation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompletionOptions {
    /// Overrides the provider's configured temperature
    pub temperature: Option<f32>,
    /// Overrides the provider's configured token limit
    pub max_tokens: Option<u32>,
    /// Ask the model for a single JSON object
    pub json_mode: bool,
}

impl CompletionOptions {
    pub fn json(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: None,
            json_mode: true,
        }
    }

    pub fn text(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: None,
            json_mode: false,
        }
    }
}

/// Unified trait for all text-generation providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Run one system + user exchange and return the model's text.
    ///
    /// The text may be empty or malformed; callers parse defensively.
    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
        options: CompletionOptions,
    ) -> Result<String, BoxError>;
}

/// Pull the first JSON object out of a model reply.
///
/// Tolerates markdown code fences and leading chatter. Returns `None` when
/// no object parses.
pub fn parse_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    if let Ok(value) = serde_json::from_str::<Value>(unfenced) {
        return value.is_object().then_some(value);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&unfenced[start..=end])
        .ok()
        .filter(Value::is_object)
}

/// Collect the string members of a JSON array field, skipping blanks.
pub fn string_list(value: &Value, field: &str) -> Vec<String> {
    value[field]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
