use log::debug;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::IntakeError;
use crate::vocabulary::Vocabulary;

/// Tells real cooking instructions apart from narrative noise.
///
/// Conservative: a step is kept only when it is long enough, matches no
/// rejection pattern and contains a known cooking verb. Dropping a real step
/// is cheaper than keeping noise, because the cascade falls through to the
/// next stage when too few steps survive.
pub struct StepValidator {
    min_length: usize,
    verbs: Regex,
    rejections: Vec<(String, Regex)>,
}

impl StepValidator {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, IntakeError> {
        let tables = &vocabulary.steps;

        let mut rejections = Vec::new();
        for group in &tables.rejections {
            for pattern in &group.patterns {
                let regex = Regex::new(&format!("(?i){pattern}")).map_err(|e| {
                    IntakeError::Vocabulary(format!("bad {} pattern '{}': {}", group.kind, pattern, e))
                })?;
                rejections.push((group.kind.clone(), regex));
            }
        }

        Ok(Self {
            min_length: tables.min_length,
            verbs: verb_regex(&tables.cooking_verbs)?,
            rejections,
        })
    }

    pub fn is_valid_step(&self, text: &str) -> bool {
        self.reject_reason(text).is_none()
    }

    /// Why a step is rejected, or `None` when it is a valid instruction.
    pub fn reject_reason(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.chars().count() < self.min_length {
            return Some("too_short".to_string());
        }
        if let Some((kind, _)) = self.rejections.iter().find(|(_, re)| re.is_match(text)) {
            return Some(kind.clone());
        }
        if !self.verbs.is_match(text) {
            return Some("no_cooking_verb".to_string());
        }
        None
    }

    /// Clean every step and keep the valid ones, in order.
    pub fn filter(&self, steps: &[String]) -> Vec<String> {
        steps
            .iter()
            .map(|step| clean_step(step))
            .filter(|step| match self.reject_reason(step) {
                None => true,
                Some(reason) => {
                    debug!("Rejected step ({}): {}", reason, step);
                    false
                }
            })
            .collect()
    }
}

/// Collapse whitespace and strip list numbering or bullets.
pub fn clean_step(text: &str) -> String {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let marker = MARKER.get_or_init(|| {
        Regex::new(r"(?i)^(?:step\s*\d+\s*[:.)\-]?\s*|\d{1,2}\s*[.):]\s+|[•\-–*·]\s+)").ok()
    });
    match marker {
        Some(marker) => marker.replace(&collapsed, "").trim().to_string(),
        None => collapsed,
    }
}

/// Whole-word verb match, allowing common inflections ("chopped", "baking", "stirs").
fn verb_regex(verbs: &[String]) -> Result<Regex, IntakeError> {
    let mut alternatives = Vec::new();
    for verb in verbs {
        let verb = verb.trim().to_lowercase();
        if verb.is_empty() {
            continue;
        }
        alternatives.push(format!(
            "{}(?:s|es|d|ed|ing|[a-z]ed|[a-z]ing)?",
            regex::escape(&verb)
        ));
        if let Some(stem) = verb.strip_suffix('e') {
            alternatives.push(format!("{}(?:ing|ed)", regex::escape(stem)));
        }
    }
    if alternatives.is_empty() {
        return Err(IntakeError::Vocabulary(
            "cooking verb list is empty".to_string(),
        ));
    }

    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
        .map_err(|e| IntakeError::Vocabulary(e.to_string()))
}
