//! One worker task: fetch a shard into task-private scratch, stream its
//! decompressed lines through the filter, return the matches by value.

use anyhow::Result;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};

use citegraph_core::types::{CitationEdge, Document};

use crate::filter::RecordFilter;
use crate::source::ShardSource;

/// Everything one shard contributed. Returned by value to the writer; worker
/// tasks never touch the store.
#[derive(Debug, Default)]
pub struct ShardBatch {
    pub documents: Vec<Document>,
    pub citations: Vec<CitationEdge>,
}

/// Process one shard end to end. A shard-level failure (fetch, decompress,
/// stream error) is logged and collapses to an empty batch; it never
/// propagates past the task boundary.
pub fn process_shard(source: &dyn ShardSource, filter: &RecordFilter, key: &str) -> ShardBatch {
    match try_process(source, filter, key) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!("shard {} skipped: {:#}", key, e);
            ShardBatch::default()
        }
    }
}

fn try_process(source: &dyn ShardSource, filter: &RecordFilter, key: &str) -> Result<ShardBatch> {
    // Task-private scratch dir, removed on drop on every exit path.
    let scratch = tempfile::Builder::new().prefix("citegraph-shard-").tempdir()?;
    let local = scratch.path().join("shard.gz");
    source.fetch(key, &local)?;

    let file = File::open(&local)?;
    let reader = BufReader::new(MultiGzDecoder::new(file));
    let mut batch = ShardBatch::default();
    for line in reader.lines() {
        let line = line?;
        if let Some((document, citations)) = filter.parse_line(&line) {
            batch.documents.push(document);
            batch.citations.extend(citations);
        }
    }
    Ok(batch)
}
