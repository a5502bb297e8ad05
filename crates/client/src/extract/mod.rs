//! Documentation page extraction.
//!
//! ### Regions
//! - Main region: first `article`, `main` or `.md-content`, else `body`.
//! - Removed everywhere: `nav`, `footer`, `script`, `style`, `.md-sidebar`,
//!   `.md-header`.
//!
//! ### Output
//! - Title: first `h1` inside the main region, else the `<title>` text before
//!   " - ", else "Untitled".
//! - Content: markdown via htmd (atx headings, `-` bullets, fenced code).
//! - Snippet: first paragraph of the main region, else the start of the
//!   content, capped at [`SNIPPET_CHARS`] characters.

mod markdown;

pub use markdown::{clean_html, to_markdown};

use scraper::{ElementRef, Html, Selector};

/// Maximum snippet length in characters.
pub const SNIPPET_CHARS: usize = 200;

const REMOVED_TAGS: &[&str] = &["nav", "footer", "script", "style", "noscript", "template"];
const REMOVED_CLASSES: &[&str] = &["md-sidebar", "md-header"];

/// Extracted fields of one documentation page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub content: String,
    pub snippet: String,
}

/// True for chrome that never contributes text.
pub(crate) fn is_removed(el: &ElementRef<'_>) -> bool {
    let value = el.value();
    REMOVED_TAGS.contains(&value.name()) || value.classes().any(|c| REMOVED_CLASSES.contains(&c))
}

/// True if `el` or one of its ancestors is removed chrome.
fn within_removed(el: &ElementRef<'_>) -> bool {
    is_removed(el) || el.ancestors().filter_map(ElementRef::wrap).any(|a| is_removed(&a))
}

fn first_visible<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).expect("invalid selector");
    document.select(&selector).find(|el| !within_removed(el))
}

/// Text of an element with runs of whitespace collapsed.
fn plain_text(el: &ElementRef<'_>) -> String {
    el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Extract title, content and snippet from an HTML page.
pub fn extract_page(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let heading = first_visible(&document, "article h1, main h1, .md-content h1")
        .map(|h1| plain_text(&h1))
        .filter(|t| !t.is_empty());
    let page_title = first_visible(&document, "title")
        .map(|t| plain_text(&t).split(" - ").next().unwrap_or_default().trim().to_string())
        .filter(|t| !t.is_empty());
    let title = heading.or(page_title).unwrap_or_else(|| "Untitled".to_string());

    let content = first_visible(&document, "article, main, .md-content")
        .or_else(|| first_visible(&document, "body"))
        .map(|region| to_markdown(&region))
        .unwrap_or_default();

    let first_paragraph = first_visible(&document, "article p, main p, .md-content p")
        .map(|p| plain_text(&p))
        .filter(|t| !t.is_empty());
    let snippet = match first_paragraph {
        Some(p) => truncate_chars(&p, SNIPPET_CHARS),
        None => truncate_chars(&content, SNIPPET_CHARS),
    };

    ExtractedPage { title, content, snippet }
}
