//! Where shards come from.
//!
//! The pipeline only needs two operations: enumerate shard keys and
//! materialize one shard at a local path. Object-store backends implement the
//! same trait; their listing/download mechanics stay behind this seam.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

pub trait ShardSource: Send + Sync {
    /// Stable keys for every shard this source can serve.
    fn list(&self) -> Result<Vec<String>>;

    /// Materialize the shard `key` at `dest`.
    fn fetch(&self, key: &str, dest: &Path) -> Result<()>;
}

/// A local snapshot directory of `*.gz` shard files, keyed by path relative
/// to the root.
pub struct SnapshotDir {
    root: PathBuf,
}

impl SnapshotDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ShardSource for SnapshotDir {
    fn list(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "gz") {
                let rel = path.strip_prefix(&self.root).unwrap_or(path);
                keys.push(rel.to_string_lossy().to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn fetch(&self, key: &str, dest: &Path) -> Result<()> {
        let src = self.root.join(key);
        if !src.is_file() {
            return Err(anyhow!("shard {} not found under {}", key, self.root.display()));
        }
        std::fs::copy(&src, dest)?;
        Ok(())
    }
}
