pub mod cache;
pub mod schema;
pub mod similarity;
pub mod store;
pub mod table;

pub use cache::{CacheError, EmbeddingCache};
pub use similarity::cosine;
pub use store::Store;
