//! Metadata caches.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{ConversionError, Result};
use crate::output::write_atomic;

/// Key/value store for lookup results.
///
/// Values are JSON; `Value::Null` records a known miss.
pub trait MetadataCache {
    fn get(&self, key: &str) -> Option<&Value>;

    fn put(&mut self, key: String, value: Value);

    /// Write pending entries to durable storage, if any.
    fn persist(&mut self) -> Result<()>;
}

/// A cache that lives for one run.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: HashMap<String, Value>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataCache for MemoryCache {
    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn put(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    fn persist(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A cache backed by a JSON object on disk.
///
/// Loaded when opened (a missing file is an empty cache) and written back
/// atomically by [`persist`](MetadataCache::persist) when it has changed.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
    dirty: bool,
}

impl JsonFileCache {
    /// Open the cache file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let file = File::open(&path).map_err(|e| {
                ConversionError::Persistence(format!(
                    "Failed to open cache '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                ConversionError::Persistence(format!(
                    "Failed to parse cache '{}': {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Metadata cache loaded");

        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataCache for JsonFileCache {
    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn put(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
        self.dirty = true;
    }

    fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let bytes = serde_json::to_vec_pretty(&self.entries).map_err(|e| {
            ConversionError::Persistence(format!("Failed to serialize cache: {}", e))
        })?;
        write_atomic(&self.path, &bytes).map_err(|e| {
            ConversionError::Persistence(format!(
                "Failed to write cache '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        self.dirty = false;
        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "Metadata cache saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_is_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::open(dir.path().join("cache.json")).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.path(), dir.path().join("cache.json"));
    }

    #[test]
    fn test_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = JsonFileCache::open(&path).unwrap();
        cache.put("entity:uniprot:P00533".to_string(), json!({"recommended_name": "EGFR"}));
        cache.put("citation:pubmed:1".to_string(), Value::Null);
        cache.persist().unwrap();

        let reopened = JsonFileCache::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(
            reopened.get("entity:uniprot:P00533"),
            Some(&json!({"recommended_name": "EGFR"}))
        );
        assert_eq!(reopened.get("citation:pubmed:1"), Some(&Value::Null));
    }

    #[test]
    fn test_clean_cache_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = JsonFileCache::open(&path).unwrap();
        cache.persist().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            JsonFileCache::open(&path),
            Err(ConversionError::Persistence(_))
        ));
    }
}
