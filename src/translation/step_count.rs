use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

struct Heuristics {
    numbered_line: Regex,
    step_word: Regex,
    cjk_ordinal: Regex,
    korean_stage: Regex,
}

fn heuristics() -> Option<&'static Heuristics> {
    static HEURISTICS: OnceLock<Option<Heuristics>> = OnceLock::new();
    HEURISTICS
        .get_or_init(|| {
            Some(Heuristics {
                numbered_line: Regex::new(r"(?m)^\s*(\d{1,2})[.)]\s+\S").ok()?,
                step_word: Regex::new(
                    r"(?i)\b(?:step|schritt|étape|etape|paso|passo|stap|krok|steg)\s*(\d{1,2})\b",
                )
                .ok()?,
                cjk_ordinal: Regex::new(r"第\s*([一二三四五六七八九十]+|\d{1,2})\s*[步歩]").ok()?,
                korean_stage: Regex::new(r"(\d{1,2})\s*단계").ok()?,
            })
        })
        .as_ref()
}

/// Conservative estimate of the number of instruction steps in a text.
///
/// Three heuristics run independently and the largest count wins: numbered
/// lines, "Step N" words in several languages, and CJK ordinals (including
/// circled digits). Prose without any numbering counts as zero.
pub fn estimate_step_count(text: &str) -> usize {
    let Some(h) = heuristics() else {
        return 0;
    };

    let numbered = h.numbered_line.captures_iter(text).count();
    let step_words = distinct_numbers(&h.step_word, text);
    let cjk = distinct_numbers(&h.cjk_ordinal, text)
        + distinct_numbers(&h.korean_stage, text)
        + circled_digits(text);

    numbered.max(step_words).max(cjk)
}

/// "Step 2" mentioned twice is still one step.
fn distinct_numbers(pattern: &Regex, text: &str) -> usize {
    pattern
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect::<BTreeSet<_>>()
        .len()
}

fn circled_digits(text: &str) -> usize {
    text.chars()
        .filter(|c| ('\u{2460}'..='\u{2473}').contains(c))
        .collect::<BTreeSet<_>>()
        .len()
}
