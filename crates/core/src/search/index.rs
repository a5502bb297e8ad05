//! Tantivy index over page title, content and path.
//!
//! Each query token is matched three ways per field: as an exact term
//! (BM25 scored), as a fuzzy term within an edit distance of about 20% of
//! its length, and, for the trailing token, as a prefix. Title clauses are
//! boosted by [`TITLE_BOOST`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tantivy::collector::TopDocs;
use tantivy::directory::error::OpenReadError;
use tantivy::directory::{Directory, RamDirectory};
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, STORED, Schema, TEXT, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, Score, TantivyDocument, Term, doc};

use crate::Error;
use crate::cache::Page;

/// Weight of title clauses relative to content and path.
pub const TITLE_BOOST: Score = 2.0;

const SNAPSHOT_VERSION: u32 = 1;
const META_FILE: &str = "meta.json";
const WRITER_MEMORY_BYTES: usize = 50_000_000;
const FUZZY_RATIO: f64 = 0.2;
// largest distance tantivy builds Levenshtein automata for
const MAX_FUZZY_DISTANCE: u8 = 2;

#[derive(Debug, Clone, Copy)]
struct Fields {
    path: Field,
    title: Field,
    content: Field,
}

fn build_schema() -> Schema {
    let mut builder = Schema::builder();
    builder.add_text_field("path", TEXT | STORED);
    builder.add_text_field("title", TEXT);
    builder.add_text_field("content", TEXT);
    builder.build()
}

fn fields_from_schema(schema: &Schema) -> Result<Fields, Error> {
    Ok(Fields { path: schema.get_field("path")?, title: schema.get_field("title")?, content: schema.get_field("content")? })
}

/// Edit distance tolerated for a query token.
pub fn fuzzy_distance(token: &str) -> u8 {
    let scaled = (token.chars().count() as f64 * FUZZY_RATIO).round();
    (scaled as u8).min(MAX_FUZZY_DISTANCE)
}

/// Persisted form of the RAM directory backing an index.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    files: BTreeMap<String, Vec<u8>>,
}

/// Committed in-RAM index plus a reader on it.
#[derive(Clone)]
pub struct IndexState {
    index: Index,
    reader: IndexReader,
    fields: Fields,
}

impl fmt::Debug for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexState").field("docs", &self.doc_count()).finish()
    }
}

impl IndexState {
    /// Index `pages` in order with a single writer thread, so doc ids follow
    /// input order and repeated builds rank identically.
    pub fn build(pages: &[Page]) -> Result<Self, Error> {
        let schema = build_schema();
        let fields = fields_from_schema(&schema)?;
        let index = Index::create_in_ram(schema);

        let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
        for page in pages {
            writer.add_document(doc!(
                fields.path => page.path.as_str(),
                fields.title => page.title.as_str(),
                fields.content => page.content.as_str(),
            ))?;
        }
        writer.commit()?;

        Self::open(index)
    }

    fn open(index: Index) -> Result<Self, Error> {
        let fields = fields_from_schema(&index.schema())?;
        let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
        Ok(Self { index, reader, fields })
    }

    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Tokens of `query` under the same analyzer the fields were indexed with.
    pub fn query_terms(&self, query: &str) -> Result<Vec<String>, Error> {
        let mut analyzer = self.index.tokenizer_for_field(self.fields.content)?;
        let mut terms = Vec::new();
        let mut stream = analyzer.token_stream(query);
        stream.process(&mut |token| terms.push(token.text.clone()));
        Ok(terms)
    }

    fn build_query(&self, terms: &[String]) -> BooleanQuery {
        let weighted = [(self.fields.title, TITLE_BOOST), (self.fields.content, 1.0), (self.fields.path, 1.0)];
        let last = terms.len().saturating_sub(1);
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for (position, text) in terms.iter().enumerate() {
            let distance = fuzzy_distance(text);
            for (field, boost) in weighted {
                let term = Term::from_field_text(field, text);
                let mut alternatives: Vec<(Occur, Box<dyn Query>)> =
                    vec![(Occur::Should, Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs)))];
                if distance > 0 {
                    alternatives.push((Occur::Should, Box::new(FuzzyTermQuery::new(term.clone(), distance, true))));
                }
                if position == last {
                    alternatives.push((Occur::Should, Box::new(FuzzyTermQuery::new_prefix(term, 0, true))));
                }
                let per_field: Box<dyn Query> = Box::new(BooleanQuery::new(alternatives));
                clauses.push((Occur::Should, Box::new(BoostQuery::new(per_field, boost))));
            }
        }

        BooleanQuery::new(clauses)
    }

    /// Up to `limit` `(path, score)` pairs, best first; equal scores keep
    /// doc address order.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<(String, f64)>, Error> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let terms = self.query_terms(query)?;
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let mut hits: Vec<(Score, DocAddress)> = searcher.search(&self.build_query(&terms), &TopDocs::with_limit(limit))?;
        hits.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| (a.1.segment_ord, a.1.doc_id).cmp(&(b.1.segment_ord, b.1.doc_id)))
        });

        hits.into_iter()
            .map(|(score, address)| {
                let doc: TantivyDocument = searcher.doc(address)?;
                let path = doc.get_first(self.fields.path).and_then(|v| v.as_str()).unwrap_or_default().to_string();
                Ok((path, f64::from(score)))
            })
            .collect()
    }

    /// Snapshot the committed segment files and `meta.json` as versioned JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        let directory = self.index.directory();
        let mut paths = vec![PathBuf::from(META_FILE)];
        for segment in self.index.searchable_segment_metas()? {
            paths.extend(segment.list_files());
        }

        let mut files = BTreeMap::new();
        for path in paths {
            match directory.atomic_read(&path) {
                Ok(bytes) => {
                    files.insert(path.to_string_lossy().into_owned(), bytes);
                }
                // components a segment never wrote (no deletes, temp store)
                Err(OpenReadError::FileDoesNotExist(_)) => {}
                Err(e) => return Err(Error::Index(e.to_string())),
            }
        }

        Ok(serde_json::to_string(&Snapshot { version: SNAPSHOT_VERSION, files })?)
    }

    /// Reopen an index from [`IndexState::to_json`] output.
    pub fn from_json(blob: &str) -> Result<Self, Error> {
        let corrupt = |e: &dyn fmt::Display| Error::CorruptIndex(e.to_string());

        let snapshot: Snapshot = serde_json::from_str(blob).map_err(|e| corrupt(&e))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::CorruptIndex(format!("unsupported index version {}", snapshot.version)));
        }
        if !snapshot.files.contains_key(META_FILE) {
            return Err(Error::CorruptIndex(format!("snapshot has no {META_FILE}")));
        }

        let directory = RamDirectory::create();
        for (name, bytes) in &snapshot.files {
            directory.atomic_write(Path::new(name), bytes).map_err(|e| corrupt(&e))?;
        }
        let index = Index::open(directory).map_err(|e| corrupt(&e))?;
        Self::open(index).map_err(|e| corrupt(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(path: &str, title: &str, content: &str) -> Page {
        Page {
            path: path.into(),
            url: format!("https://docs.example.com{path}"),
            title: title.into(),
            content: content.into(),
            snippet: String::new(),
        }
    }

    fn paths(hits: &[(String, f64)]) -> Vec<&str> {
        hits.iter().map(|(p, _)| p.as_str()).collect()
    }

    #[test]
    fn test_fuzzy_distance() {
        assert_eq!(fuzzy_distance("ci"), 0);
        assert_eq!(fuzzy_distance("diff"), 1);
        assert_eq!(fuzzy_distance("schema"), 1);
        assert_eq!(fuzzy_distance("lineage"), 1);
        assert_eq!(fuzzy_distance("enviroments"), 2);
        assert_eq!(fuzzy_distance("internationalization"), MAX_FUZZY_DISTANCE);
    }

    #[test]
    fn test_query_terms_use_field_analyzer() {
        let state = IndexState::build(&[]).unwrap();
        let terms = state.query_terms("Schema-Diff: /getting-started Über").unwrap();
        assert_eq!(terms, vec!["schema", "diff", "getting", "started", "über"]);
        assert!(state.query_terms(" -- ?! ").unwrap().is_empty());
    }

    #[test]
    fn test_title_boost_outranks_content() {
        let state = IndexState::build(&[
            page("/a", "Overview", "Models are compared here."),
            page("/b", "Models", "Overview of the page."),
        ])
        .unwrap();

        let hits = state.search("models", 5).unwrap();

        assert_eq!(paths(&hits), vec!["/b", "/a"]);
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn test_prefix_only_on_trailing_token() {
        let state = IndexState::build(&[
            page("/install", "Install", "Installation steps."),
            page("/config", "Configure", "Configuration reference."),
        ])
        .unwrap();

        assert_eq!(paths(&state.search("config", 5).unwrap()), vec!["/config"]);
        // "config" is not trailing here, so it needs an exact or fuzzy match
        assert_eq!(paths(&state.search("config install", 5).unwrap()), vec!["/install"]);
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let state = IndexState::build(&[
            page("/one", "Same", "identical body"),
            page("/two", "Same", "identical body"),
            page("/three", "Same", "identical body"),
        ])
        .unwrap();

        let hits = state.search("identical", 5).unwrap();

        assert_eq!(paths(&hits), vec!["/one", "/two", "/three"]);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let state = IndexState::build(&[page("/a", "Alpha", "first page"), page("/b", "Beta", "second page")]).unwrap();

        let restored = IndexState::from_json(&state.to_json().unwrap()).unwrap();

        assert_eq!(restored.doc_count(), 2);
        assert_eq!(restored.search("page", 5).unwrap(), state.search("page", 5).unwrap());
    }

    #[test]
    fn test_snapshot_rejects_unknown_version() {
        let blob = r#"{"version":99,"files":{"meta.json":[]}}"#;
        assert!(matches!(IndexState::from_json(blob), Err(Error::CorruptIndex(_))));
    }

    #[test]
    fn test_snapshot_rejects_garbage_meta() {
        let blob = r#"{"version":1,"files":{"meta.json":[110,111,112,101]}}"#;
        assert!(matches!(IndexState::from_json(blob), Err(Error::CorruptIndex(_))));
    }

    #[test]
    fn test_snapshot_rejects_missing_segments() {
        let state = IndexState::build(&[page("/a", "Alpha", "first page")]).unwrap();
        let mut snapshot: Snapshot = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        snapshot.files.retain(|name, _| name == META_FILE);
        let blob = serde_json::to_string(&snapshot).unwrap();

        assert!(matches!(IndexState::from_json(&blob), Err(Error::CorruptIndex(_))));
    }
}
