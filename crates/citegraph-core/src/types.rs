//! Domain types shared by the ingestion pipeline and the serving layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocumentId = String;

/// A bibliographic record retained after topic filtering.
///
/// `id` is the canonical identifier from the source snapshot (the last path
/// segment of the record URL) and is immutable once stored. Every other field
/// may be absent in the source record and stays `None` rather than failing.
/// `abstract_json` keeps the source's inverted-index representation verbatim;
/// use [`decode_abstract`] to turn it back into plain text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub doi: Option<String>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub cited_by_count: Option<i64>,
    pub first_author: Option<String>,
    pub venue: Option<String>,
    pub abstract_json: Option<String>,
}

/// Directed reference: `source_id` cites `target_id`.
///
/// Edges are append-only and carry no uniqueness constraint; traversal
/// correctness depends on presence, not multiplicity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationEdge {
    pub source_id: DocumentId,
    pub target_id: DocumentId,
}

/// Labels the origin of an edge in an ego view so consumers can style or
/// filter the two sources independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EdgeKind {
    Citation,
    Similarity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source_id: DocumentId,
    pub target_id: DocumentId,
    pub kind: EdgeKind,
}

/// Bounded-radius subgraph around one focal document. Nodes are unique by
/// id; edges are not deduplicated across kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EgoView {
    pub nodes: Vec<Document>,
    pub edges: Vec<GraphEdge>,
}

/// One similarity ranking entry. Higher is more similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scored {
    pub id: DocumentId,
    pub score: f32,
}

/// The text fields of one document handed to the embedding cache.
#[derive(Debug, Clone)]
pub struct PaperText {
    pub id: DocumentId,
    pub title: Option<String>,
    pub abstract_json: Option<String>,
}

impl PaperText {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            abstract_json: doc.abstract_json.clone(),
        }
    }

    /// Encoder input: title and decoded abstract joined by a single space.
    /// Absent fields contribute nothing; the result may be empty.
    pub fn embedding_text(&self) -> String {
        let title = self.title.as_deref().unwrap_or("");
        match self.abstract_json.as_deref().and_then(decode_abstract) {
            Some(abs) if !title.is_empty() => format!("{} {}", title, abs),
            Some(abs) => abs,
            None => title.to_string(),
        }
    }
}

/// Rebuild plain abstract text from the snapshot's inverted index
/// (word -> list of token positions). Returns `None` when the JSON does not
/// parse as an inverted index or decodes to nothing.
pub fn decode_abstract(json: &str) -> Option<String> {
    let index: HashMap<String, Vec<u32>> = serde_json::from_str(json).ok()?;
    let mut positions: Vec<(u32, &str)> = Vec::new();
    for (word, posns) in &index {
        for &p in posns {
            positions.push((p, word.as_str()));
        }
    }
    if positions.is_empty() {
        return None;
    }
    positions.sort_unstable();
    let words: Vec<&str> = positions.iter().map(|(_, w)| *w).collect();
    Some(words.join(" "))
}
