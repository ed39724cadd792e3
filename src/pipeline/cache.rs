// src/pipeline/cache.rs

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Content cache backing the "skip unchanged inputs" behaviour.
///
/// The file format is a simple line-based mapping:
///
/// ```text
/// images/logo.png <whitespace> hex_hash
/// images/posts/a.jpg <whitespace> hex_hash
/// ...
/// ```
///
/// An input is fresh when its current content hash matches the stored one;
/// callers additionally check that the matching output still exists, so a
/// cleaned output tree always rebuilds.
#[derive(Debug)]
pub struct ContentCache {
    path: PathBuf,
    entries: HashMap<String, String>,
}

/// Hash a file's contents for cache keys.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize().to_hex().to_string()
}

impl ContentCache {
    /// Load the cache file at `path`; a missing file is an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let mut entries = HashMap::new();
        if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("opening cache file at {:?}", path))?;
            let reader = BufReader::new(file);

            for line in reader.lines() {
                let line = line?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if let Some((key, hash)) = trimmed.split_once(char::is_whitespace) {
                    entries.insert(key.to_string(), hash.trim().to_string());
                }
            }
        }

        Ok(Self { path, entries })
    }

    /// Whether `key` was last seen with exactly this content hash.
    pub fn is_fresh(&self, key: &str, hash: &str) -> bool {
        self.entries.get(key).is_some_and(|stored| stored == hash)
    }

    /// Record the hash for a key; persisted by [`Self::persist`].
    pub fn record(&mut self, key: impl Into<String>, hash: impl Into<String>) {
        self.entries.insert(key.into(), hash.into());
    }

    /// Write the cache back to disk, creating its directory as needed.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {:?}", parent))?;
        }

        let file = File::create(&self.path)
            .with_context(|| format!("creating cache file at {:?}", self.path))?;
        let mut writer = BufWriter::new(file);

        for (key, hash) in self.entries.iter() {
            writeln!(writer, "{} {}", key, hash)?;
        }
        writer.flush()?;

        debug!(entries = self.entries.len(), path = ?self.path, "cache persisted");
        Ok(())
    }
}

/// Convenience used by transforms with caching disabled in config.
pub fn maybe_load(enabled: bool, path: &Path) -> Result<Option<ContentCache>> {
    if enabled {
        Ok(Some(ContentCache::load(path)?))
    } else {
        Ok(None)
    }
}
