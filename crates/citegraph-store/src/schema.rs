use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

/// Must match the encoder's output dimensionality.
pub const EMBEDDING_DIM: i32 = 768;

pub const DOCUMENTS_TABLE: &str = "documents";
pub const CITATIONS_TABLE: &str = "citations";
pub const VECTORS_TABLE: &str = "vectors";

pub fn build_documents_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("doi", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("year", DataType::Int32, true),
        Field::new("cited_by_count", DataType::Int64, true),
        Field::new("first_author", DataType::Utf8, true),
        Field::new("venue", DataType::Utf8, true),
        Field::new("abstract", DataType::Utf8, true),
    ]))
}

pub fn build_citations_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("source_id", DataType::Utf8, false),
        Field::new("target_id", DataType::Utf8, false),
    ]))
}

pub fn build_vectors_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), EMBEDDING_DIM),
            true,
        ),
        Field::new("created_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
    ]))
}
