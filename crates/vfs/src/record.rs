use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A stored file: the only entity the VFS persists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Canonical path, unique key of the record
    pub path: String,
    pub content: String,
    /// Last write time in epoch milliseconds
    pub modified: i64,
    /// UTF-8 byte length of `content`
    pub size: u64,
}

impl FileRecord {
    /// Build a record stamped with the current time and the content's byte size
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            size: content.len() as u64,
            content,
            modified: now_millis(),
        }
    }

    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            size: self.size,
            modified: self.modified,
        }
    }
}

/// Metadata returned by stat operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub size: u64,
    pub modified: i64,
}

/// Entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    /// True when at least one stored path continues below this name
    pub is_dir: bool,
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}
