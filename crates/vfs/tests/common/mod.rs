//! Common test utilities
#![allow(dead_code)] // Not every test file uses every helper

use std::sync::Arc;

use anyhow::{Context, Result};
use intentdesk_vfs::{MemoryStore, SqliteStore, VirtualFs};
use tempfile::TempDir;

/// Install a test-writer tracing subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A VFS under test together with whatever keeps its storage alive
pub struct TestVfs {
    pub name: &'static str,
    pub vfs: VirtualFs,
    pub tmp_dir: Option<TempDir>,
}

impl TestVfs {
    /// VFS over the in-memory adapter
    pub fn memory() -> Self {
        init_tracing();
        Self {
            name: "memory",
            vfs: VirtualFs::new(Arc::new(MemoryStore::new())),
            tmp_dir: None,
        }
    }

    /// VFS over a SQLite database in a fresh temp directory
    pub fn sqlite() -> Result<Self> {
        init_tracing();
        let tmp_dir = TempDir::new().context("Failed to create temp directory")?;
        let store = SqliteStore::new(tmp_dir.path().join("vfs.db"));
        Ok(Self {
            name: "sqlite",
            vfs: VirtualFs::new(Arc::new(store)),
            tmp_dir: Some(tmp_dir),
        })
    }

    /// One VFS per shipped adapter
    pub fn all() -> Result<Vec<Self>> {
        Ok(vec![Self::memory(), Self::sqlite()?])
    }
}
