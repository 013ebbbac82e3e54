//! LanceDB connection and housekeeping helpers.
//!
//! Provides the database open function, ensure-* helpers that create empty
//! tables on first use, and the single quoting helper every id-list filter
//! goes through (Lance filters are SQL strings; nothing else in this crate
//! builds filter fragments by hand).

use anyhow::Result;
use arrow_array::RecordBatchIterator;
use lancedb::{connect, Connection};
use std::sync::Arc;

use crate::schema::{build_citations_schema, build_documents_schema, build_vectors_schema};
use crate::schema::{CITATIONS_TABLE, DOCUMENTS_TABLE, VECTORS_TABLE};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.contains(&name.to_string()))
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await?;
    Ok(())
}

pub async fn ensure_documents_table(conn: &Connection) -> Result<()> {
    ensure_table(conn, DOCUMENTS_TABLE, build_documents_schema()).await
}

pub async fn ensure_citations_table(conn: &Connection) -> Result<()> {
    ensure_table(conn, CITATIONS_TABLE, build_citations_schema()).await
}

pub async fn ensure_vectors_table(conn: &Connection) -> Result<()> {
    ensure_table(conn, VECTORS_TABLE, build_vectors_schema()).await
}

/// Quote one string value for a Lance SQL filter.
pub fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `col IN ('a','b',...)` with every element quoted. Handles arbitrarily
/// large id sets; callers never interpolate ids themselves.
pub fn in_list_filter(column: &str, values: &[String]) -> String {
    let list = values.iter().map(|v| sql_quote(v)).collect::<Vec<_>>().join(",");
    format!("{} IN ({})", column, list)
}

/// `col = 'value'` with the value quoted.
pub fn eq_filter(column: &str, value: &str) -> String {
    format!("{} = {}", column, sql_quote(value))
}
