use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;

use citegraph_ingest::{IngestConfig, IngestPipeline, ShardSource, SnapshotDir};
use citegraph_store::Store;

fn record(id: &str, title: &str, tag: &str, refs: &[&str]) -> String {
    let refs: Vec<String> = refs.iter().map(|r| format!("https://example.org/{}", r)).collect();
    serde_json::json!({
        "id": format!("https://example.org/{}", id),
        "title": title,
        "concepts": [{"id": format!("https://example.org/{}", tag)}],
        "referenced_works": refs,
    })
    .to_string()
}

fn write_shard(path: &Path, lines: &[String]) {
    let file = std::fs::File::create(path).expect("create shard");
    let mut enc = GzEncoder::new(file, Compression::default());
    for line in lines {
        writeln!(enc, "{}", line).expect("write line");
    }
    enc.finish().expect("finish gz");
}

fn build_snapshot(dir: &Path) {
    write_shard(
        &dir.join("part_000.gz"),
        &[
            record("W1", "Seed paper", "C11", &["W2", "W3"]),
            record("W2", "Cited one", "C11", &[]),
            "this line is not json".to_string(),
            record("W9", "Off-topic", "C99", &["W1"]),
        ],
    );
    write_shard(
        &dir.join("part_001.gz"),
        &[
            record("W3", "Cited two", "C11", &[]),
            record("W4", "Citing paper", "C11", &["W1"]),
        ],
    );
    // Not a gzip stream at all: the whole shard must be skipped, not the run
    std::fs::write(dir.join("part_002.gz"), b"\x00\x01garbage").expect("write corrupt");
}

fn config(tmp: &Path) -> IngestConfig {
    IngestConfig {
        concurrency: 4,
        target_tags: vec!["C11".to_string()],
        title_index_dir: tmp.join("indexes/title"),
        progress_every: 10,
    }
}

#[tokio::test]
async fn pipeline_ingests_filters_and_survives_bad_shards() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let snapshot = tmp.path().join("snapshot");
    std::fs::create_dir_all(&snapshot)?;
    build_snapshot(&snapshot);

    let source = Arc::new(SnapshotDir::new(snapshot));
    let keys = source.list()?;
    assert_eq!(keys.len(), 3, "corrupt shard is listed too");

    let store = Store::open(&tmp.path().join("db").to_string_lossy()).await?;
    let pipeline = IngestPipeline::new(source, store.clone(), config(tmp.path()));
    let stats = pipeline.run(keys.clone()).await?;

    // Every submitted shard yields exactly one result, bad ones included
    assert_eq!(stats.shards_total, 3);
    assert_eq!(stats.shards_done, 3);

    // W9 is off-topic, the malformed line is dropped, the corrupt shard is empty
    assert_eq!(stats.documents_found, 4);
    assert_eq!(store.count_documents().await?, 4);
    assert_eq!(stats.citations_found, 3);
    assert_eq!(store.count_citations().await?, 3);

    let out = store.citations_from("W1", 20).await?;
    assert_eq!(out.len(), 2);
    let incoming = store.citations_to("W1", 20).await?;
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].source_id, "W4");

    assert_eq!(stats.titles_indexed, 4, "title index built after the drain");
    Ok(())
}

#[tokio::test]
async fn rerun_is_idempotent_for_documents() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let snapshot = tmp.path().join("snapshot");
    std::fs::create_dir_all(&snapshot)?;
    build_snapshot(&snapshot);

    let source = Arc::new(SnapshotDir::new(snapshot));
    let keys = source.list()?;
    let store = Store::open(&tmp.path().join("db").to_string_lossy()).await?;
    let pipeline = IngestPipeline::new(source, store.clone(), config(tmp.path()));

    pipeline.run(keys.clone()).await?;
    let docs_after_first = store.count_documents().await?;
    let edges_after_first = store.count_citations().await?;

    let stats = pipeline.run(keys).await?;

    // Documents do not duplicate; citation edges accumulate
    assert_eq!(store.count_documents().await?, docs_after_first);
    assert_eq!(store.count_citations().await?, edges_after_first * 2);
    assert_eq!(stats.titles_indexed, 0, "existing title index is skipped");
    Ok(())
}

#[tokio::test]
async fn missing_shard_key_yields_empty_result_without_blocking_others() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let snapshot = tmp.path().join("snapshot");
    std::fs::create_dir_all(&snapshot)?;
    write_shard(&snapshot.join("part_000.gz"), &[record("W1", "Only paper", "C11", &[])]);

    let source = Arc::new(SnapshotDir::new(snapshot));
    let mut keys = source.list()?;
    keys.push("does_not_exist.gz".to_string());

    let store = Store::open(&tmp.path().join("db").to_string_lossy()).await?;
    let pipeline = IngestPipeline::new(source, store.clone(), config(tmp.path()));
    let stats = pipeline.run(keys).await?;

    assert_eq!(stats.shards_done, 2);
    assert_eq!(store.count_documents().await?, 1);
    Ok(())
}

#[test]
fn snapshot_dir_lists_gz_files_sorted() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    std::fs::create_dir_all(tmp.path().join("updated_date=2024-01-01"))?;
    std::fs::write(tmp.path().join("updated_date=2024-01-01/b.gz"), b"")?;
    std::fs::write(tmp.path().join("a.gz"), b"")?;
    std::fs::write(tmp.path().join("notes.txt"), b"ignored")?;

    let keys = SnapshotDir::new(tmp.path().to_path_buf()).list()?;
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0], "a.gz");
    assert!(keys[1].ends_with("b.gz"));
    Ok(())
}
