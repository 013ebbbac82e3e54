//! Serving-side composition: the bounded ego view around one document,
//! title/DOI search, and a status probe.
//!
//! Expansion merges two edge sources: citation edges as stored, and
//! similarity edges computed on demand from cached vectors. The similarity
//! side is strictly best-effort; when the encoder or vector store is
//! unavailable the citation-only view is still returned.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use citegraph_core::types::{Document, EdgeKind, EgoView, GraphEdge, PaperText};
use citegraph_core::{Error, Result};
use citegraph_store::{EmbeddingCache, Store};
use citegraph_text::TitleSearch;

pub const CITATION_CAP: usize = 20;
pub const SIMILAR_CAP: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub hardware: String,
    pub status: &'static str,
}

pub struct GraphService {
    store: Store,
    cache: EmbeddingCache,
    titles: Option<TitleSearch>,
    pub citation_cap: usize,
    pub similar_cap: usize,
}

impl GraphService {
    pub fn new(store: Store, cache: EmbeddingCache) -> Self {
        Self {
            store,
            cache,
            titles: None,
            citation_cap: CITATION_CAP,
            similar_cap: SIMILAR_CAP,
        }
    }

    /// Attach a title index for [`GraphService::search`].
    pub fn with_title_search(mut self, titles: TitleSearch) -> Self {
        self.titles = Some(titles);
        self
    }

    /// The ego view around `id`: the focal document, up to `citation_cap`
    /// documents it cites and that cite it, and up to `similar_cap`
    /// semantically similar documents. Nodes are unique; a citation edge and
    /// a similarity edge between the same pair both appear, distinguishably
    /// tagged. An unknown focal id is a typed not-found, not a failure.
    pub async fn expand(&self, id: &str) -> Result<EgoView> {
        let focal = self
            .store
            .get_document(id)
            .await
            .map_err(op_err)?
            .ok_or_else(|| Error::NotFound(format!("document {}", id)))?;

        let mut view = EgoView::default();
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(focal.id.clone());
        view.nodes.push(focal.clone());

        let outgoing = self
            .store
            .citations_from(id, self.citation_cap)
            .await
            .map_err(op_err)?;
        let incoming = self
            .store
            .citations_to(id, self.citation_cap)
            .await
            .map_err(op_err)?;

        let mut neighbor_ids: Vec<String> = outgoing.iter().map(|e| e.target_id.clone()).collect();
        neighbor_ids.extend(incoming.iter().map(|e| e.source_id.clone()));
        let neighbors = self.documents_by_id(&neighbor_ids).await.map_err(op_err)?;

        // Edges join against stored documents; a reference to an unknown
        // document contributes neither node nor edge.
        for edge in outgoing.iter().chain(incoming.iter()) {
            let other = if edge.source_id == id { &edge.target_id } else { &edge.source_id };
            let Some(doc) = neighbors.get(other) else { continue };
            if seen.insert(doc.id.clone()) {
                view.nodes.push(doc.clone());
            }
            view.edges.push(GraphEdge {
                source_id: edge.source_id.clone(),
                target_id: edge.target_id.clone(),
                kind: EdgeKind::Citation,
            });
        }

        match self.similar_documents(&focal).await {
            Ok(similar) => {
                for doc in similar {
                    view.edges.push(GraphEdge {
                        source_id: focal.id.clone(),
                        target_id: doc.id.clone(),
                        kind: EdgeKind::Similarity,
                    });
                    if seen.insert(doc.id.clone()) {
                        view.nodes.push(doc);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("semantic expansion failed for {}: {:#}", id, e);
            }
        }

        Ok(view)
    }

    /// Fill the cache for the focal document, then rank its neighbors in
    /// vector space. Only similar ids with a stored document survive.
    async fn similar_documents(&self, focal: &Document) -> anyhow::Result<Vec<Document>> {
        let paper = PaperText::from_document(focal);
        self.cache
            .get_embeddings(std::slice::from_ref(&paper))
            .await
            .map_err(anyhow::Error::new)?;

        let ranked = self.store.similar_to(&focal.id, self.similar_cap).await?;
        let ids: Vec<String> = ranked.iter().map(|s| s.id.clone()).collect();
        let docs = self.documents_by_id(&ids).await?;
        Ok(ids.into_iter().filter_map(|id| docs.get(&id).cloned()).collect())
    }

    async fn documents_by_id(&self, ids: &[String]) -> anyhow::Result<HashMap<String, Document>> {
        let docs = self.store.get_documents(ids).await?;
        Ok(docs.into_iter().map(|d| (d.id.clone(), d)).collect())
    }

    /// Ranked document search. DOI-shaped queries resolve directly against
    /// the store; everything else goes through the title FTS index.
    pub async fn search(&self, query: &str) -> Result<Vec<Document>> {
        let query = query.trim();
        if query.contains("10.") && query.contains('/') {
            if let Some(doc) = self.store.find_by_doi(query).await.map_err(op_err)? {
                return Ok(vec![doc]);
            }
        }

        let Some(titles) = &self.titles else {
            return Err(Error::InvalidConfig("title index not available".to_string()));
        };
        let hits = titles.search(query, 20).map_err(op_err)?;
        let ids: Vec<String> = hits.iter().map(|h| h.id.clone()).collect();
        let docs = self.documents_by_id(&ids).await.map_err(op_err)?;
        Ok(hits.iter().filter_map(|h| docs.get(&h.id).cloned()).collect())
    }

    /// Availability and hardware info; compute detection is delegated to the
    /// encoder crate.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus { hardware: citegraph_embed::device_info(), status: "online" }
    }
}

fn op_err(e: anyhow::Error) -> Error {
    Error::Operation(format!("{:#}", e))
}
