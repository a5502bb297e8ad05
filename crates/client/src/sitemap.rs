//! Sitemap parsing.
//!
//! Only `<url>` entries with their `<loc>` and optional `<lastmod>` are read.
//! Sitemap index files and other extensions are ignored. CDATA sections are
//! unwrapped before parsing, since the HTML parser reads them as comments.

use std::borrow::Cow;

use docmirror_core::SitemapEntry;
use scraper::{Html, Selector};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Replace every CDATA section with its text, escaped as character data.
///
/// An unterminated section runs to the end of the input.
fn unwrap_cdata(xml: &str) -> Cow<'_, str> {
    if !xml.contains(CDATA_OPEN) {
        return Cow::Borrowed(xml);
    }

    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = rest.find(CDATA_OPEN) {
        out.push_str(&rest[..start]);
        let body = &rest[start + CDATA_OPEN.len()..];
        let (text, after) = match body.find(CDATA_CLOSE) {
            Some(end) => (&body[..end], &body[end + CDATA_CLOSE.len()..]),
            None => (body, ""),
        };
        for ch in text.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                c => out.push(c),
            }
        }
        rest = after;
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Parse a `urlset` sitemap document into entries, in document order.
///
/// Entries with an empty `<loc>` are skipped. An empty `<lastmod>` is treated
/// as absent.
pub fn parse_sitemap(xml: &str) -> Vec<SitemapEntry> {
    let document = Html::parse_document(&unwrap_cdata(xml));
    let url_sel = Selector::parse("url").expect("invalid selector");
    let loc_sel = Selector::parse("loc").expect("invalid selector");
    let lastmod_sel = Selector::parse("lastmod").expect("invalid selector");

    document
        .select(&url_sel)
        .filter_map(|url| {
            let loc = url.select(&loc_sel).next()?.text().collect::<String>().trim().to_string();
            if loc.is_empty() {
                return None;
            }
            let lastmod = url
                .select(&lastmod_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty());
            Some(SitemapEntry { loc, lastmod })
        })
        .collect()
}
