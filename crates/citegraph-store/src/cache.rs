//! Lazily-filled embedding cache keyed by document id.
//!
//! Per id the lifecycle is {uncached -> computing -> cached}; there is no
//! invalidation path. A batch request reads every cached vector first, then
//! encodes all misses in ONE encoder call and persists the new vectors under
//! replace-on-conflict before returning. Concurrent first access to the same
//! id may compute twice; the store's upsert makes that wasteful, not wrong.

use anyhow::anyhow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use citegraph_core::traits::Embedder;
use citegraph_core::types::PaperText;

use crate::schema::EMBEDDING_DIM;
use crate::store::Store;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The encoder failed for the uncached sub-batch. `cached` carries every
    /// vector that was already resolvable so callers still receive them.
    #[error("encoder failed for {missing} uncached documents: {source}")]
    Encode {
        cached: HashMap<String, Vec<f32>>,
        missing: usize,
        source: anyhow::Error,
    },

    #[error("vector store error: {0}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for CacheError {
    fn from(e: anyhow::Error) -> Self {
        CacheError::Store(e)
    }
}

pub struct EmbeddingCache {
    store: Store,
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingCache {
    pub fn new(store: Store, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Resolve one vector per requested id: cached rows from the store,
    /// misses through a single batched encoder invocation, persisted before
    /// returning. Position in the encoder batch maps back to its document by
    /// index.
    pub async fn get_embeddings(
        &self,
        papers: &[PaperText],
    ) -> Result<HashMap<String, Vec<f32>>, CacheError> {
        if papers.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<String> = papers.iter().map(|p| p.id.clone()).collect();
        let mut resolved = self.store.get_vectors(&ids).await?;

        let mut seen = HashSet::new();
        let missing: Vec<&PaperText> = papers
            .iter()
            .filter(|p| !resolved.contains_key(&p.id) && seen.insert(p.id.clone()))
            .collect();
        if missing.is_empty() {
            return Ok(resolved);
        }

        let texts: Vec<String> = missing.iter().map(|p| p.embedding_text()).collect();
        let vectors = match self.embedder.embed_batch(&texts) {
            Ok(v) => v,
            Err(e) => {
                return Err(CacheError::Encode {
                    cached: resolved,
                    missing: missing.len(),
                    source: e,
                })
            }
        };
        if vectors.len() != missing.len() {
            return Err(CacheError::Encode {
                missing: missing.len(),
                source: anyhow!(
                    "encoder returned {} vectors for {} inputs",
                    vectors.len(),
                    missing.len()
                ),
                cached: resolved,
            });
        }
        for vector in &vectors {
            if vector.len() != EMBEDDING_DIM as usize {
                return Err(CacheError::Encode {
                    missing: missing.len(),
                    source: anyhow!(
                        "dim mismatch: got {} expected {}",
                        vector.len(),
                        EMBEDDING_DIM
                    ),
                    cached: resolved,
                });
            }
        }

        let rows: Vec<(String, Vec<f32>)> = missing
            .iter()
            .map(|p| p.id.clone())
            .zip(vectors.into_iter())
            .collect();
        self.store.put_vectors(&rows).await?;
        resolved.extend(rows);
        Ok(resolved)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
