use crate::config::IntakeConfig;
use crate::error::BoxError;
use crate::providers::{CompletionOptions, LlmProvider, ProviderFactory};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

pub struct FallbackProvider {
    providers: Vec<Box<dyn LlmProvider>>,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl FallbackProvider {
    /// Create a new fallback provider from configuration
    pub fn new(config: &IntakeConfig) -> Result<Self, BoxError> {
        if !config.fallback.enabled {
            // If fallback is disabled, just use the default provider
            let default_provider = ProviderFactory::get_default_provider(config)?;
            return Ok(FallbackProvider {
                providers: vec![default_provider],
                retry_attempts: 1,
                retry_delay_ms: 0,
            });
        }

        let mut providers = Vec::new();

        // Create providers in fallback order
        for provider_name in &config.fallback.order {
            if let Some(provider_config) = config.providers.get(provider_name) {
                if provider_config.enabled {
                    match ProviderFactory::create(provider_name, provider_config) {
                        Ok(provider) => {
                            info!("Added '{}' to fallback chain", provider_name);
                            providers.push(provider);
                        }
                        Err(e) => {
                            warn!("Failed to initialize provider '{}': {}", provider_name, e);
                        }
                    }
                }
            } else {
                warn!(
                    "Provider '{}' in fallback order not found in configuration",
                    provider_name
                );
            }
        }

        Self::from_providers(providers, config.fallback.retry_attempts, config.fallback.retry_delay_ms)
    }

    /// Chain already-constructed providers.
    pub fn from_providers(
        providers: Vec<Box<dyn LlmProvider>>,
        retry_attempts: u32,
        retry_delay_ms: u64,
    ) -> Result<Self, BoxError> {
        if providers.is_empty() {
            return Err("No providers available in fallback configuration".into());
        }

        Ok(FallbackProvider {
            providers,
            retry_attempts: retry_attempts.max(1),
            retry_delay_ms,
        })
    }

    /// Try a provider with linear backoff between attempts
    async fn try_provider_with_retry(
        &self,
        provider: &dyn LlmProvider,
        system_prompt: &str,
        user_content: &str,
        options: CompletionOptions,
    ) -> Result<String, String> {
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=self.retry_attempts {
            debug!(
                "Attempting completion with {} (attempt {}/{})",
                provider.provider_name(),
                attempt,
                self.retry_attempts
            );

            match provider.complete(system_prompt, user_content, options).await {
                Ok(result) => {
                    debug!("Completion succeeded using {}", provider.provider_name());
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        "Provider {} failed (attempt {}/{}): {}",
                        provider.provider_name(),
                        attempt,
                        self.retry_attempts,
                        e
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < self.retry_attempts {
                let delay = Duration::from_millis(self.retry_delay_ms * attempt as u64);
                debug!("Waiting {:?} before retry", delay);
                sleep(delay).await;
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    fn provider_name(&self) -> &str {
        "fallback"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
        options: CompletionOptions,
    ) -> Result<String, BoxError> {
        let mut all_errors: Vec<String> = Vec::new();

        for provider in &self.providers {
            match self
                .try_provider_with_retry(provider.as_ref(), system_prompt, user_content, options)
                .await
            {
                Ok(result) => return Ok(result),
                Err(e) => {
                    all_errors.push(format!("{}: {}", provider.provider_name(), e));
                }
            }
        }

        Err(format!("All providers failed:\n{}", all_errors.join("\n")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FallbackConfig, ProviderConfig};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Flaky {
        name: &'static str,
        failures_before_success: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LlmProvider for Flaky {
        fn provider_name(&self) -> &str {
            self.name
        }

        async fn complete(
            &self,
            _system_prompt: &str,
            _user_content: &str,
            _options: CompletionOptions,
        ) -> Result<String, BoxError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err("temporarily unavailable".into())
            } else {
                Ok(format!("{} answered", self.name))
            }
        }
    }

    fn provider_config(key: &str) -> ProviderConfig {
        ProviderConfig {
            enabled: true,
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.2,
            max_tokens: 2000,
            api_key: Some(key.to_string()),
            base_url: None,
            timeout_secs: 30,
        }
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let flaky = Flaky {
            name: "primary",
            failures_before_success: 2,
            calls: calls.clone(),
        };
        let fallback = FallbackProvider::from_providers(vec![Box::new(flaky)], 3, 0).unwrap();

        let result = fallback
            .complete("s", "u", CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(result, "primary answered");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_provider() {
        let primary_calls = Arc::new(AtomicUsize::new(0));
        let secondary_calls = Arc::new(AtomicUsize::new(0));
        let fallback = FallbackProvider::from_providers(
            vec![
                Box::new(Flaky {
                    name: "primary",
                    failures_before_success: usize::MAX,
                    calls: primary_calls.clone(),
                }),
                Box::new(Flaky {
                    name: "secondary",
                    failures_before_success: 0,
                    calls: secondary_calls.clone(),
                }),
            ],
            2,
            0,
        )
        .unwrap();

        let result = fallback
            .complete("s", "u", CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(result, "secondary answered");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 2);
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fallback_disabled_uses_default_provider() {
        let mut providers = HashMap::new();
        providers.insert("openai".to_string(), provider_config("test-key"));
        let config = IntakeConfig {
            providers,
            ..Default::default()
        };

        let fallback = FallbackProvider::new(&config).unwrap();
        assert_eq!(fallback.providers.len(), 1);
        assert_eq!(fallback.retry_attempts, 1);
        assert_eq!(fallback.provider_name(), "fallback");
    }

    #[test]
    fn test_fallback_no_providers() {
        let config = IntakeConfig {
            fallback: FallbackConfig {
                enabled: true,
                order: vec!["openai".to_string()],
                retry_attempts: 3,
                retry_delay_ms: 100,
            },
            ..Default::default()
        };

        let result = FallbackProvider::new(&config);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("No providers available"));
        }
    }

    #[test]
    fn test_fallback_multiple_providers() {
        let mut providers = HashMap::new();
        providers.insert("openai".to_string(), provider_config("test-key-1"));
        let mut anthropic = provider_config("test-key-2");
        anthropic.model = "claude-sonnet-4-5".to_string();
        providers.insert("anthropic".to_string(), anthropic);

        let config = IntakeConfig {
            providers,
            fallback: FallbackConfig {
                enabled: true,
                order: vec!["openai".to_string(), "anthropic".to_string()],
                retry_attempts: 2,
                retry_delay_ms: 50,
            },
            ..Default::default()
        };

        let fallback = FallbackProvider::new(&config).unwrap();
        assert_eq!(fallback.providers.len(), 2);
    }
}
