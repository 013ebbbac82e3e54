use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use citegraph_core::config::Config;
use citegraph_ingest::{IngestConfig, IngestPipeline, ShardSource, SnapshotDir};
use citegraph_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut snapshot_dir = None;
    let mut concurrency = None;
    let mut limit = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--snapshot" => { if i + 1 < args.len() { snapshot_dir = Some(PathBuf::from(&args[i + 1])); i += 1; } else { eprintln!("Error: --snapshot requires a path"); std::process::exit(1); } }
            "--concurrency" => { if i + 1 < args.len() { if let Ok(n) = args[i + 1].parse::<usize>() { concurrency = Some(n); i += 1; } else { eprintln!("Error: --concurrency requires a number"); std::process::exit(1); } } else { eprintln!("Error: --concurrency requires a number"); std::process::exit(1); } }
            "--limit" => { if i + 1 < args.len() { if let Ok(n) = args[i + 1].parse::<usize>() { limit = Some(n); i += 1; } else { eprintln!("Error: --limit requires a number"); std::process::exit(1); } } else { eprintln!("Error: --limit requires a number"); std::process::exit(1); } }
            _ if !args[i].starts_with('-') => snapshot_dir = Some(PathBuf::from(&args[i])),
            _ => {}
        }
        i += 1;
    }

    let snapshot_dir = snapshot_dir.unwrap_or_else(|| {
        let dir: String = config.get("ingest.snapshot_dir").unwrap_or_else(|_| "data/snapshot".to_string());
        PathBuf::from(dir)
    });
    let db_dir: String = config.get("data.db_dir").unwrap_or_else(|_| "data/db".to_string());
    let title_index_dir: String = config.get("data.title_index_dir").unwrap_or_else(|_| "data/indexes/title".to_string());

    let mut ingest_config = IngestConfig {
        title_index_dir: PathBuf::from(title_index_dir),
        ..Default::default()
    };
    if let Ok(tags) = config.get::<Vec<String>>("ingest.target_tags") {
        ingest_config.target_tags = tags;
    }
    if let Some(n) = concurrency {
        ingest_config.concurrency = n;
    } else if let Ok(n) = config.get::<usize>("ingest.concurrency") {
        ingest_config.concurrency = n;
    }

    println!("Citegraph Ingest\n================");
    println!("Snapshot: {}", snapshot_dir.display());
    println!("Database: {}", db_dir);

    let source = Arc::new(SnapshotDir::new(snapshot_dir));
    let mut keys = source.list()?;
    if let Some(n) = limit {
        keys.truncate(n);
        println!("🔢 Limited to first {} shards", n);
    }
    println!("Found {} shards", keys.len());

    let store = Store::open(&db_dir).await?;
    let pipeline = IngestPipeline::new(source, store, ingest_config);
    let stats = pipeline.run(keys).await?;

    println!("\n✅ Ingestion completed!");
    println!("📊 {} shards, {} documents, {} citation edges", stats.shards_done, stats.documents_found, stats.citations_found);
    if stats.titles_indexed > 0 {
        println!("📊 Indexed {} titles for search", stats.titles_indexed);
    }
    Ok(())
}
