//! In-memory storage adapter
//!
//! Provides a fast, ephemeral store that exists only in memory.
//! Used by tests in place of the SQLite database, and by desktops that
//! don't need their files to outlive the process.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;

use super::adapter::StorageAdapter;
use super::path::{in_prefix, normalize_path};
use super::record::FileRecord;

/// In-memory storage adapter
///
/// All data is stored in memory and lost when the store is dropped.
/// Thread-safe via internal `RwLock`; clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<BTreeMap<String, FileRecord>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial file contents
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let store = Self::new();
        if let Ok(mut records) = store.records.write() {
            for (path, content) in files {
                let path = normalize_path(path);
                records.insert(path.clone(), FileRecord::new(path, *content));
            }
        }
        store
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |r| r.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("Lock poisoned")
}

#[async_trait]
impl StorageAdapter for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<FileRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(path).cloned())
    }

    async fn set(&self, path: &str, content: &str) -> Result<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        records.insert(path.to_string(), FileRecord::new(path, content));
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<bool> {
        let mut records = self.records.write().map_err(poisoned)?;
        Ok(records.remove(path).is_some())
    }

    async fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .keys()
            .filter(|key| prefix.map_or(true, |p| in_prefix(key, p)))
            .cloned()
            .collect())
    }

    async fn rename(&self, src: &str, dest: &str) -> Result<bool> {
        let mut records = self.records.write().map_err(poisoned)?;
        let Some(record) = records.remove(src) else {
            return Ok(false);
        };
        records.insert(dest.to_string(), FileRecord::new(dest, record.content));
        Ok(true)
    }

    fn atomic_rename(&self) -> bool {
        true
    }
}
