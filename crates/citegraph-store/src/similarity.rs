//! Top-K cosine similarity over the cached vectors.

use anyhow::Result;

use citegraph_core::types::Scored;

use crate::store::Store;

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

impl Store {
    /// Rank every other cached vector against the seed's cached vector and
    /// return the top `k` by descending cosine. The seed itself is excluded.
    /// An uncached seed yields an empty result, not an error; callers are
    /// expected to have filled the cache for the seed beforehand.
    // naive full scan; TODO: route through a Lance ANN index once the vector
    // count makes brute force noticeable
    pub async fn similar_to(&self, seed_id: &str, k: usize) -> Result<Vec<Scored>> {
        let Some(seed) = self.get_vector(seed_id).await? else {
            tracing::warn!("no cached vector for seed {}, similarity unavailable", seed_id);
            return Ok(Vec::new());
        };
        let mut scored: Vec<Scored> = Vec::new();
        self.scan_vectors(|id, vector| {
            if id == seed_id {
                return;
            }
            let score = cosine(&seed, &vector);
            scored.push(Scored { id, score });
        })
        .await?;
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(k);
        Ok(scored)
    }
}
