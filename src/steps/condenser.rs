use log::{debug, warn};
use serde_json::json;
use std::sync::Arc;

use crate::providers::prompt::CONDENSE_STEPS_PROMPT;
use crate::providers::{parse_json_object, string_list, CompletionOptions, LlmProvider};

/// Best-effort rewrite of validated steps into shorter instructions.
///
/// Any failure returns the input unchanged: a missing, malformed or
/// differently-sized answer never drops or reorders a step.
pub struct StepCondenser {
    provider: Arc<dyn LlmProvider>,
}

impl StepCondenser {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn condense(&self, steps: Vec<String>) -> Vec<String> {
        if steps.is_empty() {
            return steps;
        }

        let user_content = json!({ "steps": steps }).to_string();
        let reply = match self
            .provider
            .complete(CONDENSE_STEPS_PROMPT, &user_content, CompletionOptions::json(0.2))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Step condensing failed, keeping original steps: {}", e);
                return steps;
            }
        };

        let Some(value) = parse_json_object(&reply) else {
            warn!("Step condensing returned no JSON, keeping original steps");
            return steps;
        };

        let condensed = string_list(&value, "steps");
        if condensed.len() != steps.len() {
            warn!(
                "Step condensing returned {} steps for {}, keeping original steps",
                condensed.len(),
                steps.len()
            );
            return steps;
        }

        debug!("Condensed {} steps", condensed.len());
        condensed
    }
}
