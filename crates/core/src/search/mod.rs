//! In-memory full-text index over the current page generation.
//!
//! Backed by a tantivy RAM index: title, content and path are searchable and
//! title matches carry a 2x boost. Query tokens match terms exactly, by
//! prefix, or within an edit distance of about 20% of their length. The
//! index also keeps its own copy of every page, keyed by path, for
//! full-content retrieval.

pub mod index;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::cache::Page;
pub use index::{IndexState, TITLE_BOOST, fuzzy_distance};

/// Default number of results returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// One ranked hit. Scores are only comparable within a single result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchResult {
    pub path: String,
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
}

/// Queryable index plus the page lookup table it was built from.
///
/// A fresh `SearchIndex` has no tantivy index behind it and answers every
/// query with no results.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    state: Option<IndexState>,
    pages: BTreeMap<String, Page>,
}

fn by_path(pages: Vec<Page>) -> BTreeMap<String, Page> {
    pages.into_iter().map(|p| (p.path.clone(), p)).collect()
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index over `pages`.
    pub fn from_pages(pages: Vec<Page>) -> Result<Self, Error> {
        let state = IndexState::build(&pages)?;
        Ok(Self { state: Some(state), pages: by_path(pages) })
    }

    /// Discard all prior state and index `pages`.
    ///
    /// On error the previous state is kept.
    pub fn build(&mut self, pages: Vec<Page>) -> Result<(), Error> {
        *self = Self::from_pages(pages)?;
        Ok(())
    }

    /// Up to `limit` results ordered by descending score.
    ///
    /// Empty queries and queries without matches return an empty vector.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, Error> {
        let Some(state) = &self.state else {
            return Ok(Vec::new());
        };

        let hits = state.search(query, limit)?;
        Ok(hits
            .into_iter()
            .filter_map(|(path, score)| {
                let page = self.pages.get(&path)?;
                Some(SearchResult {
                    path,
                    url: page.url.clone(),
                    title: page.title.clone(),
                    snippet: page.snippet.clone(),
                    score,
                })
            })
            .collect())
    }

    /// Encode the index files so it can be restored without re-tokenizing.
    pub fn serialize(&self) -> Result<String, Error> {
        match &self.state {
            Some(state) => state.to_json(),
            None => IndexState::build(&[])?.to_json(),
        }
    }

    /// Rebuild from a blob produced by [`SearchIndex::serialize`], attaching
    /// `pages` as the full-content lookup table.
    ///
    /// # Errors
    ///
    /// `CorruptIndex` if `blob` is not a valid serialization.
    pub fn restore(&mut self, blob: &str, pages: Vec<Page>) -> Result<(), Error> {
        let state = IndexState::from_json(blob)?;
        *self = Self { state: Some(state), pages: by_path(pages) };
        Ok(())
    }

    pub fn get_page(&self, path: &str) -> Option<&Page> {
        self.pages.get(path)
    }

    /// Every page of the current generation, ordered by path.
    pub fn get_all_pages(&self) -> Vec<Page> {
        self.pages.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
