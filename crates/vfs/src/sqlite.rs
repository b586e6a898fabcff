//! Persistent storage adapter using `SQLite`
//!
//! Records live in a single `files` table keyed by path. The database is
//! opened on first use and the connection is cached for the lifetime of the
//! store.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::OnceCell;

use super::adapter::StorageAdapter;
use super::path::{dir_prefix, normalize_path, ROOT};
use super::record::FileRecord;

/// Current schema version, tracked with `PRAGMA user_version`
const SCHEMA_VERSION: i64 = 1;

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    Memory,
}

type SharedConnection = Arc<Mutex<Connection>>;

/// Storage adapter backed by `SQLite`
///
/// Clones share one lazily opened connection. Callers racing on first use
/// all wait on the same open; the database is never opened twice.
#[derive(Clone)]
pub struct SqliteStore {
    location: Location,
    conn: Arc<OnceCell<SharedConnection>>,
}

impl SqliteStore {
    /// Store backed by a database file (created on first use)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: Arc::new(OnceCell::new()),
        }
    }

    /// Store backed by a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: Arc::new(OnceCell::new()),
        }
    }

    /// Database file path, `None` for in-memory stores
    pub fn db_path(&self) -> Option<&PathBuf> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    /// Whether the database has been opened yet
    pub fn is_open(&self) -> bool {
        self.conn.initialized()
    }

    /// Get the cached connection, opening the database on first call
    async fn connection(&self) -> Result<SharedConnection> {
        let conn = self
            .conn
            .get_or_try_init(|| {
                let location = self.location.clone();
                async move {
                    let conn = tokio::task::spawn_blocking(move || open_database(&location))
                        .await??;
                    Ok::<_, anyhow::Error>(Arc::new(Mutex::new(conn)))
                }
            })
            .await?;
        Ok(conn.clone())
    }

    /// Run a blocking closure against the connection off the async runtime
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.connection().await?;
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| anyhow::anyhow!("Lock poisoned"))?;
            f(&mut *guard)
        })
        .await?
    }
}

/// Open or create the database and bring its schema up to date
fn open_database(location: &Location) -> Result<Connection> {
    let mut conn = match location {
        Location::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            Connection::open(path)
                .with_context(|| format!("Failed to open VFS database {}", path.display()))?
        }
        Location::Memory => {
            Connection::open_in_memory().context("Failed to open in-memory VFS database")?
        }
    };

    upgrade_schema(&mut conn)?;
    tracing::info!(location = ?location, "VFS database opened");
    Ok(conn)
}

/// Apply schema migrations newer than the database's `user_version`
fn upgrade_schema(conn: &mut Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    if version < 1 {
        tx.execute(
            "CREATE TABLE IF NOT EXISTS files (
                path TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                modified INTEGER NOT NULL,
                size INTEGER NOT NULL
            )",
            [],
        )?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    tracing::info!(from = version, to = SCHEMA_VERSION, "VFS schema upgraded");
    Ok(())
}

fn put_record(conn: &Connection, record: &FileRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO files (path, content, modified, size)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            record.path,
            record.content,
            record.modified,
            i64::try_from(record.size)?
        ],
    )?;
    Ok(())
}

fn get_record(conn: &Connection, path: &str) -> Result<Option<FileRecord>> {
    let record = conn
        .query_row(
            "SELECT path, content, modified, size FROM files WHERE path = ?1",
            [path],
            |row| {
                Ok(FileRecord {
                    path: row.get(0)?,
                    content: row.get(1)?,
                    modified: row.get(2)?,
                    size: row.get::<_, i64>(3)?.unsigned_abs(),
                })
            },
        )
        .optional()?;
    Ok(record)
}

#[async_trait]
impl StorageAdapter for SqliteStore {
    async fn get(&self, path: &str) -> Result<Option<FileRecord>> {
        let path = path.to_string();
        self.with_conn(move |conn| get_record(conn, &path)).await
    }

    async fn set(&self, path: &str, content: &str) -> Result<()> {
        let record = FileRecord::new(path, content);
        self.with_conn(move |conn| put_record(conn, &record)).await
    }

    async fn remove(&self, path: &str) -> Result<bool> {
        let path = path.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute("DELETE FROM files WHERE path = ?1", [&path])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let prefix = prefix.map(normalize_path).filter(|p| p != ROOT);
        self.with_conn(move |conn| {
            let mut keys: Vec<String> = Vec::new();
            if let Some(exact) = prefix {
                let dir = dir_prefix(&exact);
                // Byte-wise substr instead of LIKE so `%` and `_` match literally.
                // TEXT length() and substr() stop at an embedded NUL, BLOBs don't.
                let mut stmt = conn.prepare(
                    "SELECT path FROM files
                     WHERE path = ?1
                        OR substr(CAST(path AS BLOB), 1, length(CAST(?2 AS BLOB)))
                           = CAST(?2 AS BLOB)
                     ORDER BY path",
                )?;
                for key in stmt.query_map(params![exact, dir], |row| row.get::<_, String>(0))? {
                    keys.push(key?);
                }
            } else {
                let mut stmt = conn.prepare("SELECT path FROM files ORDER BY path")?;
                for key in stmt.query_map([], |row| row.get::<_, String>(0))? {
                    keys.push(key?);
                }
            }
            Ok(keys)
        })
        .await
    }

    async fn rename(&self, src: &str, dest: &str) -> Result<bool> {
        let src = src.to_string();
        let dest = dest.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let Some(record) = get_record(&tx, &src)? else {
                return Ok(false);
            };
            if src != dest {
                put_record(&tx, &FileRecord::new(dest, record.content))?;
                tx.execute("DELETE FROM files WHERE path = ?1", [&src])?;
            }
            tx.commit()?;
            Ok(true)
        })
        .await
    }

    fn atomic_rename(&self) -> bool {
        true
    }
}
