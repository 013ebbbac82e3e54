/// The opaque text encoder: text in, fixed-length L2-normalized vector out.
///
/// `embed_batch` must return exactly one vector of `dim()` per input, in
/// input order, and must be deterministic for a given input regardless of
/// what else is in the batch.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
