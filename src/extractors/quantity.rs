use regex::Regex;
use std::sync::OnceLock;

fn rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?i)\b(\d+)\s+and\s+a\s+half\b", "${1}.5"),
            (r"(?i)\b(?:half\s+an?|a\s+half)\b", "0.5"),
            (r"(?i)\ba\s+couple(?:\s+of)?\b", "2"),
            (r"(?i)\ba\s+few(?:\s+of)?\b", "3"),
            (
                r"(?i)\b(\d+(?:[.,]\d+)?)\s+(?:to|or)\s+(\d+(?:[.,]\d+)?)\b",
                "${1}-${2}",
            ),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
        .collect()
    })
}

/// Rewrite spoken quantities into numbers.
///
/// "a couple eggs" becomes "2 eggs" and "3 to 4 tablespoons fish sauce"
/// becomes "3-4 tablespoons fish sauce".
pub fn normalize_spoken_quantity(ingredient: &str) -> String {
    let mut text = ingredient.trim().to_string();
    for (pattern, replacement) in rules() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
