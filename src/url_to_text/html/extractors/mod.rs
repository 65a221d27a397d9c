use html_escape::decode_html_entities;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

use crate::error::StageFailure;
use crate::model::RecipeDraft;

mod html_class;
mod json_ld;
mod microdata;

pub use html_class::HtmlClassExtractor;
pub use json_ld::JsonLdExtractor;
pub use microdata::MicroDataExtractor;

/// A parsed page. `Html` is not `Send`, so a context lives inside one
/// synchronous call and is never held across an await.
pub struct ParsingContext {
    pub url: String,
    pub document: Html,
}

impl ParsingContext {
    pub fn new(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            document: Html::parse_document(html),
        }
    }
}

pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn parse(&self, context: &ParsingContext) -> Result<RecipeDraft, StageFailure>;
}

pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Some sites double-encode entities, so decode twice.
pub(crate) fn decode_html_symbols(text: &str) -> String {
    let decoded = decode_html_entities(&decode_html_entities(text)).into_owned();
    strip_tags(&decoded)
}

fn strip_tags(text: &str) -> String {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    let collapsed = match TAG.get_or_init(|| Regex::new(r"<[^>]{0,200}>").ok()) {
        Some(tag) => tag.replace_all(text, " ").into_owned(),
        None => text.to_string(),
    };
    collapsed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Page title: first `h1`, then `og:title`, then `<title>`.
pub(crate) fn page_title(document: &Html) -> Option<String> {
    let h1 = selector("h1")
        .and_then(|s| document.select(&s).map(element_text).find(|t| !t.is_empty()));
    if h1.is_some() {
        return h1;
    }

    let og = selector("meta[property='og:title']").and_then(|s| {
        document
            .select(&s)
            .filter_map(|el| el.value().attr("content"))
            .map(decode_html_symbols)
            .find(|t| !t.is_empty())
    });
    if og.is_some() {
        return og;
    }

    selector("title")
        .and_then(|s| document.select(&s).map(element_text).find(|t| !t.is_empty()))
}

/// Split comma separated keyword strings into lowercase tags.
pub(crate) fn split_tags(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(|t| decode_html_symbols(t).trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Break one instruction blob into steps.
///
/// Line breaks win, then inline numbering ("1. ... 2. ..."), then sentence
/// boundaries.
pub(crate) fn split_instruction_block(text: &str) -> Vec<String> {
    let lines: Vec<String> = text
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() > 1 {
        return lines;
    }

    static NUMBERED: OnceLock<Option<Regex>> = OnceLock::new();
    if let Some(numbered) = NUMBERED.get_or_init(|| Regex::new(r"(?:^|\s)\d{1,2}[.)]\s+").ok()) {
        if numbered.find_iter(text).count() > 1 {
            return numbered
                .split(text)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    split_sentences(text)
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(idx, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let next_is_space = chars.get(i + 1).is_some_and(|(_, n)| n.is_whitespace());
        let next_word_upper = chars[i + 1..]
            .iter()
            .find(|(_, n)| !n.is_whitespace())
            .is_some_and(|(_, n)| n.is_uppercase());
        if next_is_space && next_word_upper {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}
