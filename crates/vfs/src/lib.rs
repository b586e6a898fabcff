//! intentdesk virtual filesystem
//!
//! A path-addressed key/value store that every desktop application uses to
//! persist its state. Two layers:
//!
//! - [`StorageAdapter`]: key/value persistence keyed by full path
//!   ([`SqliteStore`] on disk, [`MemoryStore`] in memory)
//! - [`VirtualFs`]: path normalization, implicit directories, and the
//!   read/write/list/delete/move/stat operations

pub mod adapter;
pub mod config;
pub mod error;
pub mod fs;
pub mod memory;
pub mod path;
pub mod record;
pub mod sqlite;

pub use adapter::StorageAdapter;
pub use config::{StorageConfig, StorageKind, VfsConfig};
pub use error::{Result, VfsError};
pub use fs::{VfsEvent, VirtualFs};
pub use memory::MemoryStore;
pub use path::normalize_path;
pub use record::{DirEntry, FileMetadata, FileRecord};
pub use sqlite::SqliteStore;
