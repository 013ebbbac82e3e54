use citegraph_embed::get_default_embedder;

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading the real model
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder().expect("embedder");
    let texts = vec!["citation graph".to_string(), "citation graph".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 768, "embedding dim is 768");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn batched_call_matches_single_call() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder().expect("embedder");
    let a = "semantic similarity of papers".to_string();
    let b = "unrelated second document".to_string();

    let batched = embedder.embed_batch(&[a.clone(), b]).expect("batched");
    let alone = embedder.embed_batch(&[a]).expect("single");

    assert_eq!(batched[0], alone[0], "batching must not alter per-document vectors");
}

#[test]
fn empty_batch_returns_empty() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    let embedder = get_default_embedder().expect("embedder");
    let embs = embedder.embed_batch(&[]).expect("embed_batch");
    assert!(embs.is_empty());
}
