use crate::config::ProviderConfig;
use crate::error::BoxError;
use crate::providers::{CompletionOptions, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const JSON_ONLY_SUFFIX: &str =
    "\n\nRespond with a single JSON object and nothing else. Do not wrap it in markdown.";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self, BoxError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or("ANTHROPIC_API_KEY not found in config or environment")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(AnthropicProvider {
            client,
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        AnthropicProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 4000,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
        options: CompletionOptions,
    ) -> Result<String, BoxError> {
        // No native JSON mode on the messages API
        let system = if options.json_mode {
            format!("{system_prompt}{JSON_ONLY_SUFFIX}")
        } else {
            system_prompt.to_string()
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": options.max_tokens.unwrap_or(self.max_tokens),
                "temperature": options.temperature.unwrap_or(self.temperature),
                "system": system,
                "messages": [
                    {
                        "role": "user",
                        "content": user_content
                    }
                ]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Anthropic request failed with status: {status}").into());
        }

        let response_body: Value = response.json().await?;
        debug!("{:?}", response_body);

        let text = response_body["content"][0]["text"]
            .as_str()
            .ok_or("Failed to extract content from Anthropic response")?
            .to_string();

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_complete_json_mode_appends_instruction() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_body(Matcher::Regex("single JSON object".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": [{"type": "text", "text": "{\"has_recipe\": true}"}]}"#)
            .create_async()
            .await;

        let provider = AnthropicProvider::with_base_url(
            "test-key".to_string(),
            server.url(),
            "claude-sonnet-4-5".to_string(),
        );
        let result = provider
            .complete("Classify.", "2 eggs, whisk", CompletionOptions::json(0.0))
            .await
            .unwrap();

        assert_eq!(result, r#"{"has_recipe": true}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .create_async()
            .await;

        let provider = AnthropicProvider::with_base_url(
            "test-key".to_string(),
            server.url(),
            "claude-sonnet-4-5".to_string(),
        );
        let result = provider
            .complete("system", "user", CompletionOptions::text(0.2))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_new_reads_config_key() {
        let config = ProviderConfig {
            enabled: true,
            model: "claude-sonnet-4-5".to_string(),
            temperature: 0.2,
            max_tokens: 4000,
            api_key: Some("test-key".to_string()),
            base_url: None,
            timeout_secs: 30,
        };

        let provider = AnthropicProvider::new(&config).unwrap();
        assert_eq!(provider.provider_name(), "anthropic");
        assert_eq!(provider.base_url, "https://api.anthropic.com");
    }
}
