//! Bounded dispatch pool feeding the single store writer.
//!
//! Workers run in blocking tasks and hand their batches back by value; the
//! `run` task is the only writer to the store. Completion order is whatever
//! the pool yields, never submission order, and exactly one result is
//! consumed per submitted shard. After the drain, the title FTS index is
//! built (or skipped when a previous pass already built it).

use anyhow::Result;
use futures::{stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

use citegraph_store::Store;

use crate::filter::RecordFilter;
use crate::source::ShardSource;
use crate::worker::{process_shard, ShardBatch};

/// The original corpus selection: five topic tags around network science and
/// bibliometrics. Override per deployment via `ingest.target_tags`.
pub const DEFAULT_TARGET_TAGS: [&str; 5] =
    ["C15151743", "C69562835", "C190743605", "C28225019", "C152662350"];

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Worker pool width; 0 means available CPU parallelism.
    pub concurrency: usize,
    pub target_tags: Vec<String>,
    pub title_index_dir: PathBuf,
    /// Emit an aggregate progress line every N completed shards.
    pub progress_every: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: 0,
            target_tags: DEFAULT_TARGET_TAGS.iter().map(|s| s.to_string()).collect(),
            title_index_dir: PathBuf::from("data/indexes/title"),
            progress_every: 10,
        }
    }
}

#[derive(Debug, Default)]
pub struct IngestStats {
    pub shards_total: usize,
    pub shards_done: usize,
    pub documents_found: usize,
    pub citations_found: usize,
    pub titles_indexed: usize,
}

pub struct IngestPipeline {
    source: Arc<dyn ShardSource>,
    filter: Arc<RecordFilter>,
    store: Store,
    config: IngestConfig,
}

impl IngestPipeline {
    pub fn new(source: Arc<dyn ShardSource>, store: Store, config: IngestConfig) -> Self {
        let filter = Arc::new(RecordFilter::new(config.target_tags.iter().cloned()));
        Self { source, filter, store, config }
    }

    /// Drain every shard in `keys` through the worker pool. Safe to re-run
    /// over an overlapping shard set: documents insert idempotently, citation
    /// duplicates accumulate.
    pub async fn run(&self, keys: Vec<String>) -> Result<IngestStats> {
        let total = keys.len();
        let concurrency = if self.config.concurrency == 0 {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
        } else {
            self.config.concurrency
        };
        let progress_every = self.config.progress_every.max(1);
        tracing::info!("dispatching {} shards across {} workers", total, concurrency);

        self.store.ensure_schema().await?;

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} shards ({percent}%) {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut results = stream::iter(keys.into_iter().map(|key| {
            let source = Arc::clone(&self.source);
            let filter = Arc::clone(&self.filter);
            async move {
                let worker_key = key.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    process_shard(source.as_ref(), &filter, &worker_key)
                })
                .await;
                let batch = match joined {
                    Ok(batch) => batch,
                    Err(e) => {
                        tracing::warn!("worker for shard {} died: {}", key, e);
                        ShardBatch::default()
                    }
                };
                (key, batch)
            }
        }))
        .buffer_unordered(concurrency);

        let mut stats = IngestStats { shards_total: total, ..Default::default() };
        while let Some((key, batch)) = results.next().await {
            stats.shards_done += 1;
            if !batch.documents.is_empty() {
                self.store.insert_documents(&batch.documents).await?;
                stats.documents_found += batch.documents.len();
                pb.println(format!(
                    "[{}/{}] +{} documents from {} (total {})",
                    stats.shards_done, total, batch.documents.len(), key, stats.documents_found
                ));
            }
            if !batch.citations.is_empty() {
                self.store.append_citations(&batch.citations).await?;
                stats.citations_found += batch.citations.len();
            }
            pb.inc(1);
            if stats.shards_done % progress_every == 0 {
                pb.println(format!("Processed {}/{} shards...", stats.shards_done, total));
            }
        }
        pb.finish_with_message("shards drained");

        let titles = self.store.titles().await?;
        stats.titles_indexed = citegraph_text::build_or_skip(&self.config.title_index_dir, titles)?;
        Ok(stats)
    }
}
