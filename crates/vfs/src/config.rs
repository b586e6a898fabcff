//! Configuration for the VFS storage layer
//!
//! Reads config from ~/.config/intentdesk/vfs.toml

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::adapter::StorageAdapter;
use super::memory::MemoryStore;
use super::sqlite::SqliteStore;

/// Which storage adapter backs the VFS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Sqlite,
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageKind,
    /// Database file; defaults to <data_dir>/intentdesk/vfs.db
    pub path: Option<PathBuf>,
}

/// Full VFS configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    pub storage: StorageConfig,
}

impl VfsConfig {
    /// Load configuration from default path
    ///
    /// Falls back to defaults when the file is missing or invalid.
    pub fn load() -> Self {
        let config_path = Self::default_config_path();
        if !config_path.exists() {
            return Self::default();
        }
        Self::load_from_path(&config_path).unwrap_or_else(|e| {
            tracing::warn!(
                path = %config_path.display(),
                error = %e,
                "Invalid VFS config, using defaults"
            );
            Self::default()
        })
    }

    /// Get default config path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("intentdesk")
            .join("vfs.toml")
    }

    /// Get default database path
    pub fn default_db_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("intentdesk")
            .join("vfs.db")
    }

    /// Load from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse VFS config")
    }

    /// Resolved database path
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(Self::default_db_path)
    }

    /// Build the configured storage adapter
    ///
    /// Opening is deferred: the `SQLite` database is created on first use.
    pub fn open_store(&self) -> Arc<dyn StorageAdapter> {
        match self.storage.backend {
            StorageKind::Sqlite => Arc::new(SqliteStore::new(self.db_path())),
            StorageKind::Memory => Arc::new(MemoryStore::new()),
        }
    }
}
