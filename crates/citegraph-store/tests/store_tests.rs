use citegraph_core::types::{CitationEdge, Document};
use citegraph_store::Store;

fn doc(id: &str, title: &str) -> Document {
    Document {
        id: id.to_string(),
        title: Some(title.to_string()),
        ..Default::default()
    }
}

async fn open_tmp_store() -> anyhow::Result<(tempfile::TempDir, Store)> {
    let tmp = tempfile::tempdir()?;
    let store = Store::open(&tmp.path().to_string_lossy()).await?;
    store.ensure_schema().await?;
    Ok((tmp, store))
}

#[tokio::test]
async fn insert_documents_is_idempotent_first_seen_wins() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp_store().await?;

    store.insert_documents(&[doc("W1", "first title")]).await?;
    // Same id, different non-key fields: must be a no-op
    store.insert_documents(&[doc("W1", "second title")]).await?;

    assert_eq!(store.count_documents().await?, 1);
    let got = store.get_document("W1").await?.expect("present");
    assert_eq!(got.title.as_deref(), Some("first title"));
    Ok(())
}

#[tokio::test]
async fn duplicate_ids_within_one_batch_collapse() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp_store().await?;

    store
        .insert_documents(&[doc("W1", "kept"), doc("W1", "dropped"), doc("W2", "other")])
        .await?;

    assert_eq!(store.count_documents().await?, 2);
    let got = store.get_document("W1").await?.expect("present");
    assert_eq!(got.title.as_deref(), Some("kept"));
    Ok(())
}

#[tokio::test]
async fn optional_fields_round_trip_as_null() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp_store().await?;

    let full = Document {
        id: "W1".to_string(),
        doi: Some("10.1/abc".to_string()),
        title: Some("T".to_string()),
        year: Some(2021),
        cited_by_count: Some(42),
        first_author: Some("Ada".to_string()),
        venue: Some("J. Graphs".to_string()),
        abstract_json: Some(r#"{"a":[0]}"#.to_string()),
    };
    let sparse = Document { id: "W2".to_string(), ..Default::default() };
    store.insert_documents(&[full, sparse]).await?;

    let got = store.get_document("W2").await?.expect("present");
    assert!(got.doi.is_none());
    assert!(got.title.is_none());
    assert!(got.year.is_none());
    assert!(got.cited_by_count.is_none());

    let got = store.get_document("W1").await?.expect("present");
    assert_eq!(got.year, Some(2021));
    assert_eq!(got.cited_by_count, Some(42));
    assert_eq!(got.doi.as_deref(), Some("10.1/abc"));
    Ok(())
}

#[tokio::test]
async fn citations_append_and_tolerate_duplicates() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp_store().await?;

    let edge = CitationEdge { source_id: "W1".to_string(), target_id: "W2".to_string() };
    store.append_citations(&[edge.clone(), edge.clone()]).await?;
    store.append_citations(&[edge.clone()]).await?;

    assert_eq!(store.count_citations().await?, 3, "duplicates accumulate");
    let out = store.citations_from("W1", 20).await?;
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|e| e.target_id == "W2"));

    let incoming = store.citations_to("W2", 20).await?;
    assert_eq!(incoming.len(), 3);
    let none = store.citations_from("W2", 20).await?;
    assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn find_by_doi_and_quoting() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp_store().await?;

    let mut d = doc("W1", "quoted");
    d.doi = Some("10.1/o'brien".to_string());
    store.insert_documents(&[d]).await?;

    let got = store.find_by_doi("10.1/o'brien").await?.expect("found");
    assert_eq!(got.id, "W1");
    assert!(store.find_by_doi("10.1/missing").await?.is_none());

    // quotes in ids must not break filters either
    assert!(store.get_document("W'1").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn titles_skip_missing_and_empty() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp_store().await?;

    let untitled = Document { id: "W3".to_string(), ..Default::default() };
    let empty = doc("W2", "");
    store.insert_documents(&[doc("W1", "A real title"), empty, untitled]).await?;

    let titles = store.titles().await?;
    assert_eq!(titles.len(), 1);
    assert_eq!(titles[0], ("W1".to_string(), "A real title".to_string()));
    Ok(())
}

#[tokio::test]
async fn vectors_replace_on_conflict() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp_store().await?;

    let v1 = vec![1.0f32; 768];
    let v2 = vec![2.0f32; 768];
    store.put_vectors(&[("W1".to_string(), v1)]).await?;
    store.put_vectors(&[("W1".to_string(), v2.clone())]).await?;

    let got = store.get_vector("W1").await?.expect("cached");
    assert_eq!(got, v2, "second write replaces the first");

    let map = store.get_vectors(&["W1".to_string(), "W9".to_string()]).await?;
    assert_eq!(map.len(), 1, "uncached ids are absent, not errors");
    Ok(())
}

#[tokio::test]
async fn put_vectors_rejects_wrong_dim() -> anyhow::Result<()> {
    let (_tmp, store) = open_tmp_store().await?;
    let err = store.put_vectors(&[("W1".to_string(), vec![0.5f32; 3])]).await;
    assert!(err.is_err());
    Ok(())
}
