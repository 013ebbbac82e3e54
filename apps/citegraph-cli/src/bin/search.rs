use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use citegraph_core::config::Config;
use citegraph_embed::get_default_embedder;
use citegraph_graph::GraphService;
use citegraph_store::{EmbeddingCache, Store};
use citegraph_text::TitleSearch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query>", args[0]);
        eprintln!("Example: {} 'citation network analysis'", args[0]);
        eprintln!("Example: {} '10.1038/nature12373'", args[0]);
        std::process::exit(1);
    }
    let query = &args[1];

    let config = Config::load()?;
    let db_dir: String = config.get("data.db_dir").unwrap_or_else(|_| "data/db".to_string());
    let title_index_dir: String = config.get("data.title_index_dir").unwrap_or_else(|_| "data/indexes/title".to_string());

    let store = Store::open(&db_dir).await?;
    let cache = EmbeddingCache::new(store.clone(), Arc::from(get_default_embedder()?));
    let titles = TitleSearch::open(PathBuf::from(title_index_dir))?;
    let service = GraphService::new(store, cache).with_title_search(titles);

    let results = service.search(query).await?;
    println!("🔍 Found {} results for: \"{}\"", results.len(), query);
    for (i, doc) in results.iter().enumerate() {
        println!(
            "\n  {}. {}  ({})", i + 1,
            doc.title.as_deref().unwrap_or("<untitled>"),
            doc.id
        );
        if let Some(author) = &doc.first_author {
            println!("     👤 {}", author);
        }
        if let (Some(venue), Some(year)) = (&doc.venue, doc.year) {
            println!("     📚 {} ({})", venue, year);
        }
        if let Some(cited) = doc.cited_by_count {
            println!("     📈 cited by {}", cited);
        }
    }
    Ok(())
}
