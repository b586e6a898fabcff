//! Virtual filesystem API
//!
//! The surface every application and agent tool uses to load and persist its
//! payload. Paths are normalized on entry, directories are derived from key
//! prefixes, and every call is a single round trip to the storage adapter.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use super::adapter::StorageAdapter;
use super::config::VfsConfig;
use super::error::{Result, VfsError};
use super::path::{child_of, dir_prefix, normalize_path, parent_path};
use super::record::{DirEntry, FileMetadata};

/// Capacity of the change event channel
const EVENT_CAPACITY: usize = 64;

/// File change event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VfsEvent {
    /// File was created or overwritten
    Written { path: String },
    /// File was deleted
    Deleted { path: String },
    /// File was moved
    Moved { from: String, to: String },
}

/// Virtual filesystem over an injected storage adapter
#[derive(Clone)]
pub struct VirtualFs {
    store: Arc<dyn StorageAdapter>,
    event_tx: broadcast::Sender<VfsEvent>,
}

impl VirtualFs {
    /// Create a VFS over the given adapter
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, event_tx }
    }

    /// Create a VFS over the adapter described by `config`
    pub fn from_config(config: &VfsConfig) -> Self {
        Self::new(config.open_store())
    }

    /// The underlying storage adapter
    pub fn store(&self) -> &Arc<dyn StorageAdapter> {
        &self.store
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<VfsEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: VfsEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // File Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Read a file's content
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn read_file(&self, path: &str) -> Result<String> {
        let path = normalize_path(path);
        match self.store.get(&path).await? {
            Some(record) => Ok(record.content),
            None => Err(VfsError::NotFound(path)),
        }
    }

    /// Create or overwrite a file
    #[tracing::instrument(skip(self, content), fields(size = content.len()), level = "debug")]
    pub async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let path = normalize_path(path);
        // Directories are implicit, so the parent is addressable as soon as
        // this write lands
        if let Some(parent) = parent_path(&path) {
            tracing::trace!(parent = %parent, "parent directory implied by write");
        }
        self.store.set(&path, content).await?;
        self.emit(VfsEvent::Written { path });
        Ok(())
    }

    /// List the immediate children of a directory, sorted by name
    ///
    /// Names may be files or implicit subdirectories; see [`Self::list_entries`]
    /// to tell them apart. An unknown directory lists as empty.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn list_directory(&self, path: &str) -> Result<Vec<String>> {
        Ok(self
            .list_entries(path)
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    /// List the immediate children of a directory with a directory flag
    ///
    /// A child is a directory when some stored path continues below it. A name
    /// that is both a file and a directory prefix is reported once, as a
    /// directory.
    pub async fn list_entries(&self, path: &str) -> Result<Vec<DirEntry>> {
        let dir = dir_prefix(path);
        let keys = self.store.keys(Some(&dir)).await?;

        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        for key in &keys {
            if let Some((name, is_dir)) = child_of(key, &dir) {
                *children.entry(name.to_string()).or_insert(false) |= is_dir;
            }
        }

        tracing::debug!(
            dir = %dir,
            keys = keys.len(),
            entries = children.len(),
            "listed directory"
        );
        Ok(children
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect())
    }

    /// Delete a file; deleting a missing file is not an error
    ///
    /// `Deleted` is only emitted when a record was actually removed.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        if self.store.remove(&path).await? {
            self.emit(VfsEvent::Deleted { path });
        }
        Ok(())
    }

    /// Move a file to a new path, replacing anything already there
    ///
    /// Content is carried over; size and modification time are restamped.
    /// Atomic when the adapter supports it (see
    /// [`StorageAdapter::atomic_rename`]), otherwise a failure mid-move can
    /// leave the file at both paths.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn move_file(&self, old_path: &str, new_path: &str) -> Result<()> {
        let from = normalize_path(old_path);
        let to = normalize_path(new_path);

        if !self.store.rename(&from, &to).await? {
            return Err(VfsError::NotFound(from));
        }
        if from != to {
            tracing::debug!(atomic = self.store.atomic_rename(), "moved file");
            self.emit(VfsEvent::Moved { from, to });
        }
        Ok(())
    }

    /// Size and modification time of a file
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn get_metadata(&self, path: &str) -> Result<FileMetadata> {
        let path = normalize_path(path);
        match self.store.get(&path).await? {
            Some(record) => Ok(record.metadata()),
            None => Err(VfsError::NotFound(path)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Check if a file exists at the path
    pub async fn exists(&self, path: &str) -> Result<bool> {
        let path = normalize_path(path);
        Ok(self.store.get(&path).await?.is_some())
    }

    /// Copy a file to a new location
    pub async fn copy_file(&self, src: &str, dest: &str) -> Result<()> {
        let content = self.read_file(src).await?;
        self.write_file(dest, &content).await
    }

    /// Read and deserialize a JSON file
    pub async fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let content = self.read_file(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Serialize a value as pretty JSON and write it
    pub async fn write_json<T: Serialize + Sync>(&self, path: &str, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        self.write_file(path, &content).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::MemoryStore;

    fn memory_vfs() -> (VirtualFs, MemoryStore) {
        let store = MemoryStore::new();
        (VirtualFs::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_paths_are_normalized() {
        let (vfs, store) = memory_vfs();
        vfs.write_file("  notes\\a.txt ", "A").await.unwrap();

        assert!(store.get("/notes/a.txt").await.unwrap().is_some());
        assert_eq!(vfs.read_file("/notes/a.txt").await.unwrap(), "A");
        assert_eq!(vfs.read_file("notes/a.txt/").await.unwrap(), "A");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (vfs, _) = memory_vfs();
        let err = vfs.read_file("missing.txt").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: /missing.txt");
    }

    #[tokio::test]
    async fn test_list_entries_flags_directories() {
        let store = MemoryStore::with_files(&[
            ("/a/b.txt", "B"),
            ("/a/sub/c.txt", "C"),
            ("/a/v1.0/d.txt", "D"),
            ("/a/README", "R"),
            ("/a/sub", "file shadowing a directory name"),
        ]);
        let vfs = VirtualFs::new(Arc::new(store));

        let entries = vfs.list_entries("/a").await.unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry {
                    name: "README".into(),
                    is_dir: false,
                },
                DirEntry {
                    name: "b.txt".into(),
                    is_dir: false,
                },
                DirEntry {
                    name: "sub".into(),
                    is_dir: true,
                },
                DirEntry {
                    name: "v1.0".into(),
                    is_dir: true,
                },
            ]
        );

        let names = vfs.list_directory("/a").await.unwrap();
        assert_eq!(names, vec!["README", "b.txt", "sub", "v1.0"]);
    }

    #[tokio::test]
    async fn test_list_root() {
        let store = MemoryStore::with_files(&[("/notes/a.txt", "A"), ("/top.txt", "T")]);
        let vfs = VirtualFs::new(Arc::new(store));
        assert_eq!(vfs.list_directory("/").await.unwrap(), vec!["notes", "top.txt"]);
        assert_eq!(vfs.list_directory("").await.unwrap(), vec!["notes", "top.txt"]);
    }

    #[tokio::test]
    async fn test_move_onto_itself() {
        let (vfs, _) = memory_vfs();
        vfs.write_file("/same.txt", "x").await.unwrap();
        vfs.move_file("/same.txt", "same.txt").await.unwrap();
        assert_eq!(vfs.read_file("/same.txt").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_move_missing_is_not_found() {
        let (vfs, _) = memory_vfs();
        let err = vfs.move_file("/nope.txt", "/dest.txt").await.unwrap_err();
        assert!(matches!(err, VfsError::NotFound(ref p) if p == "/nope.txt"));
        assert!(!vfs.exists("/dest.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_events() {
        let (vfs, _) = memory_vfs();
        let mut rx = vfs.subscribe();

        vfs.write_file("/a.txt", "1").await.unwrap();
        vfs.move_file("/a.txt", "/b.txt").await.unwrap();
        vfs.delete_file("/b.txt").await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            VfsEvent::Written {
                path: "/a.txt".into(),
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            VfsEvent::Moved {
                from: "/a.txt".into(),
                to: "/b.txt".into(),
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            VfsEvent::Deleted {
                path: "/b.txt".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_delete_missing_emits_nothing() {
        let (vfs, _) = memory_vfs();
        let mut rx = vfs.subscribe();

        vfs.delete_file("/never-written.txt").await.unwrap();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        vfs.write_file("/once.txt", "x").await.unwrap();
        vfs.delete_file("/once.txt").await.unwrap();
        vfs.delete_file("/once.txt").await.unwrap();

        assert!(matches!(rx.try_recv(), Ok(VfsEvent::Written { .. })));
        assert!(matches!(rx.try_recv(), Ok(VfsEvent::Deleted { .. })));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_copy_file() {
        let (vfs, _) = memory_vfs();
        vfs.write_file("/src.txt", "payload").await.unwrap();
        vfs.copy_file("/src.txt", "/backup/src.txt").await.unwrap();

        assert_eq!(vfs.read_file("/src.txt").await.unwrap(), "payload");
        assert_eq!(vfs.read_file("/backup/src.txt").await.unwrap(), "payload");
        assert!(vfs.copy_file("/missing", "/x").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Task {
            title: String,
            done: bool,
        }

        let (vfs, _) = memory_vfs();
        let tasks = vec![Task {
            title: "ship".into(),
            done: false,
        }];
        vfs.write_json(crate::path::app::TODO_TASKS, &tasks).await.unwrap();

        let loaded: Vec<Task> = vfs.read_json("/todo/tasks.json").await.unwrap();
        assert_eq!(loaded, tasks);

        vfs.write_file("/todo/broken.json", "{not json").await.unwrap();
        let err = vfs.read_json::<Vec<Task>>("/todo/broken.json").await.unwrap_err();
        assert_eq!(err.code(), "VFS_JSON_ERROR");
    }
}
