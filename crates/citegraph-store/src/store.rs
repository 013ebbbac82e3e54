//! The persistent store over documents, citation edges and vectors.
//!
//! All mutating methods live here and are meant to be driven by exactly one
//! logical owner (the ingestion writer loop, or the cache's upsert path for
//! vectors). Documents insert idempotently on `id`; citation edges append
//! with no uniqueness constraint; vectors replace on conflict.

use anyhow::{anyhow, Result};
use arrow_array::cast::AsArray;
use arrow_array::Array;
use arrow_array::{
    FixedSizeListArray, Int32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray,
    TimestampMillisecondArray,
};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use citegraph_core::types::{CitationEdge, Document};

use crate::schema::{
    build_citations_schema, build_documents_schema, build_vectors_schema, CITATIONS_TABLE,
    DOCUMENTS_TABLE, EMBEDDING_DIM, VECTORS_TABLE,
};
use crate::table::{
    ensure_citations_table, ensure_documents_table, ensure_vectors_table, eq_filter,
    in_list_filter, open_db, table_exists,
};

#[derive(Clone)]
pub struct Store {
    conn: Connection,
}

impl Store {
    pub async fn open(uri: &str) -> Result<Self> {
        let conn = open_db(uri).await?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        ensure_documents_table(&self.conn).await?;
        ensure_citations_table(&self.conn).await?;
        ensure_vectors_table(&self.conn).await?;
        Ok(())
    }

    /// Insert documents with insert-or-ignore semantics on `id`. A document
    /// already present keeps its first-seen values. Duplicate ids inside one
    /// batch collapse to the first occurrence.
    pub async fn insert_documents(&self, docs: &[Document]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        let mut seen = HashSet::new();
        let unique: Vec<&Document> = docs.iter().filter(|d| seen.insert(d.id.clone())).collect();

        ensure_documents_table(&self.conn).await?;
        let schema = build_documents_schema();
        let batch = documents_to_batch(&unique, schema.clone())?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));

        let table = self.conn.open_table(DOCUMENTS_TABLE).execute().await?;
        let mut mi = table.merge_insert(&["id"]);
        mi.when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        Ok(unique.len())
    }

    /// Append citation edges. Duplicates are tolerated; traversal depends on
    /// presence, not multiplicity.
    pub async fn append_citations(&self, edges: &[CitationEdge]) -> Result<usize> {
        if edges.is_empty() {
            return Ok(0);
        }
        ensure_citations_table(&self.conn).await?;
        let schema = build_citations_schema();
        let sources: Vec<String> = edges.iter().map(|e| e.source_id.clone()).collect();
        let targets: Vec<String> = edges.iter().map(|e| e.target_id.clone()).collect();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(sources)),
                Arc::new(StringArray::from(targets)),
            ],
        )?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let table = self.conn.open_table(CITATIONS_TABLE).execute().await?;
        table.add(reader).execute().await?;
        Ok(edges.len())
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let docs = self.get_documents(&[id.to_string()]).await?;
        Ok(docs.into_iter().next())
    }

    /// Fetch documents by id set with a single filtered scan. Order of the
    /// result is unspecified; absent ids are simply missing.
    pub async fn get_documents(&self, ids: &[String]) -> Result<Vec<Document>> {
        if ids.is_empty() || !table_exists(&self.conn, DOCUMENTS_TABLE).await? {
            return Ok(Vec::new());
        }
        let table = self.conn.open_table(DOCUMENTS_TABLE).execute().await?;
        let mut stream = table
            .query()
            .only_if(in_list_filter("id", ids))
            .execute()
            .await?;
        let mut out = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            out.extend(documents_from_batch(&batch)?);
        }
        Ok(out)
    }

    pub async fn find_by_doi(&self, doi: &str) -> Result<Option<Document>> {
        if !table_exists(&self.conn, DOCUMENTS_TABLE).await? {
            return Ok(None);
        }
        let table = self.conn.open_table(DOCUMENTS_TABLE).execute().await?;
        let mut stream = table
            .query()
            .only_if(eq_filter("doi", doi))
            .limit(1)
            .execute()
            .await?;
        while let Some(batch) = stream.try_next().await? {
            if let Some(doc) = documents_from_batch(&batch)?.into_iter().next() {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    /// Outgoing edges: documents that `id` cites.
    pub async fn citations_from(&self, id: &str, limit: usize) -> Result<Vec<CitationEdge>> {
        self.citation_edges(eq_filter("source_id", id), limit).await
    }

    /// Incoming edges: documents that cite `id`.
    pub async fn citations_to(&self, id: &str, limit: usize) -> Result<Vec<CitationEdge>> {
        self.citation_edges(eq_filter("target_id", id), limit).await
    }

    async fn citation_edges(&self, filter: String, limit: usize) -> Result<Vec<CitationEdge>> {
        if !table_exists(&self.conn, CITATIONS_TABLE).await? {
            return Ok(Vec::new());
        }
        let table = self.conn.open_table(CITATIONS_TABLE).execute().await?;
        let mut stream = table.query().only_if(filter).limit(limit).execute().await?;
        let mut out = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let sources = string_col(&batch, "source_id")?;
            let targets = string_col(&batch, "target_id")?;
            for i in 0..batch.num_rows() {
                out.push(CitationEdge {
                    source_id: sources.value(i).to_string(),
                    target_id: targets.value(i).to_string(),
                });
            }
        }
        out.truncate(limit);
        Ok(out)
    }

    pub async fn count_documents(&self) -> Result<usize> {
        self.count_rows(DOCUMENTS_TABLE).await
    }

    pub async fn count_citations(&self) -> Result<usize> {
        self.count_rows(CITATIONS_TABLE).await
    }

    async fn count_rows(&self, name: &str) -> Result<usize> {
        if !table_exists(&self.conn, name).await? {
            return Ok(0);
        }
        let table = self.conn.open_table(name).execute().await?;
        Ok(table.count_rows(None).await?)
    }

    /// All `(id, title)` pairs with a non-empty title, for FTS index builds.
    pub async fn titles(&self) -> Result<Vec<(String, String)>> {
        if !table_exists(&self.conn, DOCUMENTS_TABLE).await? {
            return Ok(Vec::new());
        }
        let table = self.conn.open_table(DOCUMENTS_TABLE).execute().await?;
        let mut stream = table.query().execute().await?;
        let mut out = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let ids = string_col(&batch, "id")?;
            let titles = string_col(&batch, "title")?;
            for i in 0..batch.num_rows() {
                if titles.is_null(i) {
                    continue;
                }
                let title = titles.value(i);
                if title.is_empty() {
                    continue;
                }
                out.push((ids.value(i).to_string(), title.to_string()));
            }
        }
        Ok(out)
    }

    pub async fn get_vector(&self, id: &str) -> Result<Option<Vec<f32>>> {
        let map = self.get_vectors(&[id.to_string()]).await?;
        Ok(map.into_iter().next().map(|(_, v)| v))
    }

    /// Cached vectors for an id set. Ids without a vector are absent from the
    /// returned map.
    pub async fn get_vectors(&self, ids: &[String]) -> Result<HashMap<String, Vec<f32>>> {
        if ids.is_empty() || !table_exists(&self.conn, VECTORS_TABLE).await? {
            return Ok(HashMap::new());
        }
        let table = self.conn.open_table(VECTORS_TABLE).execute().await?;
        let mut stream = table
            .query()
            .only_if(in_list_filter("id", ids))
            .execute()
            .await?;
        let mut out = HashMap::new();
        while let Some(batch) = stream.try_next().await? {
            for (id, vector) in vectors_from_batch(&batch)? {
                out.insert(id, vector);
            }
        }
        Ok(out)
    }

    /// Upsert vectors with replace-on-conflict semantics on `id`. Concurrent
    /// fills of the same id converge on whichever write lands last; the value
    /// is equivalent either way.
    pub async fn put_vectors(&self, rows: &[(String, Vec<f32>)]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        for (id, vector) in rows {
            if vector.len() != EMBEDDING_DIM as usize {
                return Err(anyhow!(
                    "dim mismatch for {}: got {} expected {}",
                    id,
                    vector.len(),
                    EMBEDDING_DIM
                ));
            }
        }
        ensure_vectors_table(&self.conn).await?;
        let schema = build_vectors_schema();
        let now = Utc::now().timestamp_millis();
        let ids: Vec<String> = rows.iter().map(|(id, _)| id.clone()).collect();
        let vectors: Vec<Option<Vec<Option<f32>>>> = rows
            .iter()
            .map(|(_, v)| Some(v.iter().map(|&x| Some(x)).collect()))
            .collect();
        let times = vec![now; rows.len()];
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<
                    arrow_array::types::Float32Type,
                    _,
                    _,
                >(vectors.into_iter(), EMBEDDING_DIM)),
                Arc::new(TimestampMillisecondArray::from(times)),
            ],
        )?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let table = self.conn.open_table(VECTORS_TABLE).execute().await?;
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        Ok(())
    }

    /// Stream every cached `(id, vector)` pair through `visit`.
    pub(crate) async fn scan_vectors(
        &self,
        mut visit: impl FnMut(String, Vec<f32>),
    ) -> Result<()> {
        if !table_exists(&self.conn, VECTORS_TABLE).await? {
            return Ok(());
        }
        let table = self.conn.open_table(VECTORS_TABLE).execute().await?;
        let mut stream = table.query().execute().await?;
        while let Some(batch) = stream.try_next().await? {
            for (id, vector) in vectors_from_batch(&batch)? {
                visit(id, vector);
            }
        }
        Ok(())
    }
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("missing column {}", name))
}

fn documents_to_batch(docs: &[&Document], schema: Arc<arrow_schema::Schema>) -> Result<RecordBatch> {
    let ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();
    let dois: Vec<Option<String>> = docs.iter().map(|d| d.doi.clone()).collect();
    let titles: Vec<Option<String>> = docs.iter().map(|d| d.title.clone()).collect();
    let years: Vec<Option<i32>> = docs.iter().map(|d| d.year).collect();
    let cited: Vec<Option<i64>> = docs.iter().map(|d| d.cited_by_count).collect();
    let authors: Vec<Option<String>> = docs.iter().map(|d| d.first_author.clone()).collect();
    let venues: Vec<Option<String>> = docs.iter().map(|d| d.venue.clone()).collect();
    let abstracts: Vec<Option<String>> = docs.iter().map(|d| d.abstract_json.clone()).collect();
    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(dois)),
            Arc::new(StringArray::from(titles)),
            Arc::new(Int32Array::from(years)),
            Arc::new(Int64Array::from(cited)),
            Arc::new(StringArray::from(authors)),
            Arc::new(StringArray::from(venues)),
            Arc::new(StringArray::from(abstracts)),
        ],
    )?)
}

fn documents_from_batch(batch: &RecordBatch) -> Result<Vec<Document>> {
    let ids = string_col(batch, "id")?;
    let dois = string_col(batch, "doi")?;
    let titles = string_col(batch, "title")?;
    let years = batch
        .column_by_name("year")
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| anyhow!("missing column year"))?;
    let cited = batch
        .column_by_name("cited_by_count")
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| anyhow!("missing column cited_by_count"))?;
    let authors = string_col(batch, "first_author")?;
    let venues = string_col(batch, "venue")?;
    let abstracts = string_col(batch, "abstract")?;

    let opt_str = |arr: &StringArray, i: usize| -> Option<String> {
        if arr.is_null(i) { None } else { Some(arr.value(i).to_string()) }
    };

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        out.push(Document {
            id: ids.value(i).to_string(),
            doi: opt_str(dois, i),
            title: opt_str(titles, i),
            year: if years.is_null(i) { None } else { Some(years.value(i)) },
            cited_by_count: if cited.is_null(i) { None } else { Some(cited.value(i)) },
            first_author: opt_str(authors, i),
            venue: opt_str(venues, i),
            abstract_json: opt_str(abstracts, i),
        });
    }
    Ok(out)
}

fn vectors_from_batch(batch: &RecordBatch) -> Result<Vec<(String, Vec<f32>)>> {
    let ids = string_col(batch, "id")?;
    let vectors = batch
        .column_by_name("vector")
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or_else(|| anyhow!("missing column vector"))?;
    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        if vectors.is_null(i) {
            continue;
        }
        let list = vectors.value(i);
        let vals = list
            .as_primitive::<arrow_array::types::Float32Type>()
            .values()
            .iter()
            .copied()
            .collect::<Vec<f32>>();
        if vals.len() == EMBEDDING_DIM as usize {
            out.push((ids.value(i).to_string(), vals));
        }
    }
    Ok(out)
}
