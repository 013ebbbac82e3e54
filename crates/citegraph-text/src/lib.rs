//! citegraph-text
//!
//! Tantivy-based full-text index over document titles: built once after an
//! ingestion pass, queried by the serving layer's title search.

pub mod index;
pub mod search;
pub mod tantivy_utils;

pub use index::{build_or_skip, TitleIndexer};
pub use search::{TitleHit, TitleSearch};
