//! Record-level membership filter and field extraction.
//!
//! Each snapshot line is one JSON work record. A record is kept when its
//! topic-tag set intersects the configured target set; kept records flatten
//! into a [`Document`] plus one [`CitationEdge`] per outgoing reference.
//! Anything that fails to parse is dropped line-by-line.

use serde::Deserialize;
use std::collections::HashSet;

use citegraph_core::types::{CitationEdge, Document};

#[derive(Debug, Deserialize)]
struct RawWork {
    id: String,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publication_year: Option<i32>,
    #[serde(default)]
    cited_by_count: Option<i64>,
    #[serde(default)]
    authorships: Vec<RawAuthorship>,
    #[serde(default)]
    primary_location: Option<RawLocation>,
    #[serde(default)]
    abstract_inverted_index: Option<serde_json::Value>,
    #[serde(default)]
    concepts: Vec<RawConcept>,
    #[serde(default)]
    referenced_works: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawAuthorship {
    #[serde(default)]
    author: Option<RawAuthor>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    #[serde(default)]
    source: Option<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawConcept {
    #[serde(default)]
    id: Option<String>,
}

/// Identifiers in the snapshot are full URLs; the canonical form is the last
/// path segment (`https://.../W123` -> `W123`).
fn short_id(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

pub struct RecordFilter {
    target_tags: HashSet<String>,
}

impl RecordFilter {
    pub fn new<I>(target_tags: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self { target_tags: target_tags.into_iter().collect() }
    }

    /// Parse one snapshot line. `None` for records outside the target topics
    /// and for lines that do not parse; a malformed line never aborts its
    /// shard.
    pub fn parse_line(&self, line: &str) -> Option<(Document, Vec<CitationEdge>)> {
        let work: RawWork = serde_json::from_str(line).ok()?;

        let tags: HashSet<String> = work
            .concepts
            .iter()
            .filter_map(|c| c.id.as_deref())
            .map(short_id)
            .collect();
        if tags.is_disjoint(&self.target_tags) {
            return None;
        }

        let id = short_id(&work.id);
        let first_author = work
            .authorships
            .first()
            .and_then(|a| a.author.as_ref())
            .and_then(|a| a.display_name.clone());
        let venue = work
            .primary_location
            .as_ref()
            .and_then(|l| l.source.as_ref())
            .and_then(|s| s.display_name.clone());
        let abstract_json = work.abstract_inverted_index.as_ref().map(|v| v.to_string());

        let citations = work
            .referenced_works
            .iter()
            .map(|target| CitationEdge { source_id: id.clone(), target_id: short_id(target) })
            .collect();

        let document = Document {
            id,
            doi: work.doi,
            title: work.title,
            year: work.publication_year,
            cited_by_count: work.cited_by_count,
            first_author,
            venue,
            abstract_json,
        };
        Some((document, citations))
    }
}
