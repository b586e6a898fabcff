use anyhow::Result;
use async_trait::async_trait;

use super::record::FileRecord;

/// Storage adapter trait - the persistence layer beneath the VFS
///
/// Adapters are plain key/value stores keyed by the full path string. They
/// know nothing about directories; the VFS derives those from `keys`.
///
/// Missing keys are never errors: `get` returns `None` and `remove` returns
/// `false`. Only failures of the underlying database surface as `Err`.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Fetch the record stored at `path`
    async fn get(&self, path: &str) -> Result<Option<FileRecord>>;

    /// Store `content` at `path`, stamping `modified` and `size`
    async fn set(&self, path: &str, content: &str) -> Result<()>;

    /// Delete the record at `path` if present
    ///
    /// Returns whether a record was actually removed.
    async fn remove(&self, path: &str) -> Result<bool>;

    /// List stored paths in ascending order
    ///
    /// With a prefix, only paths equal to it or below it on a `/` boundary
    /// are returned.
    async fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Optional operations with default implementations
    // ─────────────────────────────────────────────────────────────────────────

    /// Move the record at `src` to `dest`
    ///
    /// Returns `false` when `src` does not exist. The default is a
    /// copy-then-delete sequence: a failure between the two steps leaves the
    /// content at both paths. Adapters with multi-key transactions override
    /// this with an atomic version.
    async fn rename(&self, src: &str, dest: &str) -> Result<bool> {
        let Some(record) = self.get(src).await? else {
            return Ok(false);
        };
        if src == dest {
            return Ok(true);
        }
        self.set(dest, &record.content).await?;
        self.remove(src).await?;
        Ok(true)
    }

    /// Check if this adapter moves records atomically
    fn atomic_rename(&self) -> bool {
        false
    }
}
