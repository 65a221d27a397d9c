//! Visible page text for the generative fallback.

use scraper::{ElementRef, Html, Node};

/// Upper bound on characters sent to the text-generation collaborator.
pub const MAX_PAGE_TEXT_CHARS: usize = 30_000;

/// Visible text of a page, one block per line, truncated to `max_chars`.
pub fn extract_page_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let mut pieces = Vec::new();
    extract_text_from_element(&document.root_element(), &mut pieces);

    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => current.push(text),
            Piece::Break => flush(&mut current, &mut blocks),
        }
    }
    flush(&mut current, &mut blocks);

    truncate_chars(&blocks.join("\n"), max_chars)
}

enum Piece {
    Text(String),
    Break,
}

fn flush(current: &mut Vec<String>, blocks: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let merged = current.join(" ").trim().to_string();
    if !merged.is_empty() {
        blocks.push(merged);
    }
    current.clear();
}

fn extract_text_from_element(element: &ElementRef, result: &mut Vec<Piece>) {
    if is_hidden(element) || should_skip_element(element) {
        return;
    }

    let tag_name = element.value().name().to_ascii_lowercase();
    if tag_name == "br" {
        result.push(Piece::Break);
        return;
    }

    let block = is_block_element(&tag_name);
    if block {
        result.push(Piece::Break);
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !normalized.is_empty() {
                    result.push(Piece::Text(normalized));
                }
            }
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    extract_text_from_element(&child_ref, result);
                }
            }
            _ => {}
        }
    }

    if block {
        result.push(Piece::Break);
    }
}

fn is_hidden(element: &ElementRef) -> bool {
    let value = element.value();
    value.attr("hidden").is_some()
        || value.attr("aria-hidden") == Some("true")
        || value.attr("style").is_some_and(|style| {
            let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
}

fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "td"
            | "tr"
            | "ul"
    )
}

fn should_skip_element(element: &ElementRef) -> bool {
    matches!(
        element.value().name().to_ascii_lowercase().as_str(),
        "script" | "style" | "noscript" | "iframe" | "canvas" | "svg" | "template" | "head"
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
