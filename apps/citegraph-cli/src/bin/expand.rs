use std::env;
use std::sync::Arc;

use citegraph_core::config::Config;
use citegraph_core::types::EdgeKind;
use citegraph_embed::get_default_embedder;
use citegraph_graph::GraphService;
use citegraph_store::{EmbeddingCache, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <document_id> [--json]", args[0]);
        eprintln!("Example: {} W2036113194", args[0]);
        std::process::exit(1);
    }
    let id = &args[1];
    let as_json = args.iter().any(|a| a == "--json");

    let config = Config::load()?;
    let db_dir: String = config.get("data.db_dir").unwrap_or_else(|_| "data/db".to_string());

    let store = Store::open(&db_dir).await?;
    let cache = EmbeddingCache::new(store.clone(), Arc::from(get_default_embedder()?));
    let service = GraphService::new(store, cache);

    let view = match service.expand(id).await {
        Ok(view) => view,
        Err(citegraph_core::Error::NotFound(what)) => {
            eprintln!("Not found: {}", what);
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("🕸️  Ego view for {}: {} nodes, {} edges", id, view.nodes.len(), view.edges.len());
    for node in &view.nodes {
        println!("  • {}  {}", node.id, node.title.as_deref().unwrap_or("<untitled>"));
    }
    for edge in &view.edges {
        let arrow = match edge.kind {
            EdgeKind::Citation => "cites",
            EdgeKind::Similarity => "similar-to",
        };
        println!("  {} --{}--> {}", edge.source_id, arrow, edge.target_id);
    }
    Ok(())
}
