use citegraph_text::{build_or_skip, TitleIndexer, TitleSearch};

fn sample_titles() -> Vec<(String, String)> {
    vec![
        ("W1".to_string(), "Neural citation networks".to_string()),
        ("W2".to_string(), "Protein folding with transformers".to_string()),
        ("W3".to_string(), "A survey of citation graph analysis".to_string()),
    ]
}

#[test]
fn build_and_search_titles() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let dir = tmp.path().join("title");

    let count = build_or_skip(&dir, sample_titles()).expect("build");
    assert_eq!(count, 3);

    let search = TitleSearch::open(dir).expect("open");
    let hits = search.search("citation", 10).expect("search");
    assert_eq!(hits.len(), 2);
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert!(ids.contains(&"W1"));
    assert!(ids.contains(&"W3"));
    if hits.len() >= 2 {
        assert!(hits[0].score >= hits[1].score);
    }
}

#[test]
fn existing_index_is_skipped_not_rebuilt() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let dir = tmp.path().join("title");

    let first = build_or_skip(&dir, sample_titles()).expect("first build");
    assert_eq!(first, 3);
    assert!(TitleIndexer::exists(&dir));

    // Second pass over the same index dir must be a no-op, not an error
    let second = build_or_skip(&dir, vec![("W9".to_string(), "extra".to_string())]).expect("skip");
    assert_eq!(second, 0);

    let search = TitleSearch::open(dir).expect("open");
    assert!(search.search("extra", 10).expect("search").is_empty());
}
