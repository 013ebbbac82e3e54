use std::sync::Arc;

use citegraph_core::config::Config;
use citegraph_embed::get_default_embedder;
use citegraph_graph::GraphService;
use citegraph_store::{EmbeddingCache, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let config = Config::load()?;
    let db_dir: String = config.get("data.db_dir").unwrap_or_else(|_| "data/db".to_string());

    let store = Store::open(&db_dir).await?;
    let cache = EmbeddingCache::new(store.clone(), Arc::from(get_default_embedder()?));
    let service = GraphService::new(store.clone(), cache);

    let status = service.status();
    println!("Citegraph Status\n================");
    println!("Status:    {}", status.status);
    println!("Hardware:  {}", status.hardware);
    println!("Documents: {}", store.count_documents().await?);
    println!("Citations: {}", store.count_citations().await?);
    Ok(())
}
