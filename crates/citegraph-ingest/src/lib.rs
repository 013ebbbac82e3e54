//! citegraph-ingest
//!
//! Parallel snapshot ingestion: shard sources, the topic filter, the worker
//! task, and the dispatch pool that feeds the single store writer.

pub mod filter;
pub mod pipeline;
pub mod source;
pub mod worker;

pub use filter::RecordFilter;
pub use pipeline::{IngestConfig, IngestPipeline, IngestStats, DEFAULT_TARGET_TAGS};
pub use source::{ShardSource, SnapshotDir};
pub use worker::{process_shard, ShardBatch};
