//! Navigation tree grouping pages by path segment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Listing projection of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PageSummary {
    pub path: String,
    pub title: String,
    pub url: String,
}

/// One node of the section tree.
///
/// Serializes as `{"_pages": [...], "<segment>": {...}, ...}`. Child keys
/// come from [`section_key`], so no segment can shadow `_pages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionNode {
    #[serde(rename = "_pages")]
    pub pages: Vec<PageSummary>,
    #[serde(flatten)]
    pub children: BTreeMap<String, SectionNode>,
}

/// Key of the child node for path segment `part`.
///
/// Segments starting with `_` get one more leading `_`, which keeps every
/// key distinct from `_pages` and from each other.
pub fn section_key(part: &str) -> String {
    if part.starts_with('_') { format!("_{part}") } else { part.to_string() }
}

/// Group `pages` into a tree keyed by path segments.
///
/// A page lands in the node named by its last segment; the root path `/`
/// lands in the root node.
pub fn build_section_tree(pages: &[PageSummary]) -> SectionNode {
    let mut root = SectionNode::default();

    for page in pages {
        let mut node = &mut root;
        for part in page.path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.entry(section_key(part)).or_default();
        }
        node.pages.push(page.clone());
    }

    root
}
