//! Title index lifecycle: create once after an ingestion pass, skip when a
//! prior pass already built it.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tantivy::{doc, Index};

use crate::tantivy_utils::{build_schema, register_tokenizer};

pub struct TitleIndexer {
    index: Index,
    id_field: tantivy::schema::Field,
    title_field: tantivy::schema::Field,
}

impl TitleIndexer {
    /// A directory with `meta.json` holds a previously built index; building
    /// again is skipped rather than treated as a failure.
    pub fn exists(index_dir: &Path) -> bool {
        index_dir.join("meta.json").exists()
    }

    pub fn create(index_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&index_dir)?;
        let schema = build_schema();
        let index = Index::create_in_dir(&index_dir, schema.clone())?;
        register_tokenizer(&index);
        let id_field = schema.get_field("id")?;
        let title_field = schema.get_field("title")?;
        Ok(Self { index, id_field, title_field })
    }

    pub fn index_titles<I>(&self, titles: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut index_writer = self.index.writer(50_000_000)?;
        let mut count = 0usize;
        for (id, title) in titles {
            let doc = doc!(
                self.id_field => id,
                self.title_field => title,
            );
            index_writer.add_document(doc)?;
            count += 1;
        }
        index_writer.commit()?;
        Ok(count)
    }
}

/// Build the title index at `index_dir` from `(id, title)` pairs, or skip
/// with a log line when one already exists. Returns the number of indexed
/// titles (0 on skip).
pub fn build_or_skip<I>(index_dir: &Path, titles: I) -> Result<usize>
where
    I: IntoIterator<Item = (String, String)>,
{
    if TitleIndexer::exists(index_dir) {
        tracing::info!("title index already exists at {}, skipping build", index_dir.display());
        return Ok(0);
    }
    let indexer = TitleIndexer::create(index_dir.to_path_buf())?;
    indexer.index_titles(titles)
}
