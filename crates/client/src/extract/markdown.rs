//! HTML to markdown through htmd.
//!
//! The region is first re-serialized without removed chrome, then converted
//! with atx headings, fenced code blocks and `-` bullets.

use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, Options};
use scraper::{ElementRef, Node};

use super::{REMOVED_TAGS, is_removed, plain_text};

const VOID_ELEMENTS: &[&str] =
    &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

fn converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .skip_tags(REMOVED_TAGS.to_vec())
        .options(Options {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            bullet_list_marker: BulletListMarker::Dash,
            ul_bullet_spacing: 1,
            ..Default::default()
        })
        .build()
}

/// Render `root` as markdown.
///
/// Falls back to the region's plain text if conversion fails.
pub fn to_markdown(root: &ElementRef<'_>) -> String {
    let html = clean_html(root);
    match converter().convert(&html) {
        Ok(markdown) => markdown.trim().to_string(),
        Err(error) => {
            tracing::warn!(%error, "markdown conversion failed, keeping plain text");
            plain_text(root)
        }
    }
}

/// Serialize the children of `root`, dropping removed chrome.
pub fn clean_html(root: &ElementRef<'_>) -> String {
    let mut out = String::new();
    write_children(root, &mut out);
    out
}

fn write_children(el: &ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_escaped(out, text, false),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child)
                    && !is_removed(&child)
                {
                    write_element(&child, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(el: &ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in el.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        push_escaped(out, value, true);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }
    write_children(el, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_escaped(out: &mut String, text: &str, in_attr: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
