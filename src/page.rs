//! Readable text extraction from fetched web pages.
//!
//! Pages come back through the relay chain as raw HTML. The text handed on
//! to summarization is the page title plus headings, paragraphs and list
//! items in document order. Pages with none of those fall back to plain tag
//! stripping.

use crate::parser::html::strip_markup;
use crate::utils::{collapse_whitespace, truncate_chars};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Upper bound on extracted page text, in characters.
pub const PAGE_TEXT_MAX_CHARS: usize = 15_000;

const TEXT_BLOCKS: &[&str] = &["title", "h1", "h2", "h3", "p", "li"];

static TEXT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(&TEXT_BLOCKS.join(", ")).unwrap());

/// Plain text of `html`, whitespace-collapsed and capped at `max_chars`.
pub fn readable_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let blocks: Vec<String> = document
        .select(&TEXT_SELECTOR)
        .filter(|el| !inside_text_block(el))
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();

    let text = if blocks.is_empty() {
        strip_markup(html)
    } else {
        blocks.join("\n")
    };
    truncate_chars(&text, max_chars).trim().to_string()
}

/// Nested blocks (a `<p>` inside an `<li>`) are covered by their ancestor.
fn inside_text_block(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| TEXT_BLOCKS.contains(&a.value().name()))
}
