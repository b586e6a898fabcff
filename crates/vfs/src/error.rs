use thiserror::Error;

/// Errors surfaced by the VFS API
#[derive(Debug, Error)]
pub enum VfsError {
    /// No record exists at the normalized path
    #[error("Not found: {0}")]
    NotFound(String),
    /// Failure of the underlying storage adapter, passed through unchanged
    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VfsError {
    /// Stable code for tool-layer responses
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "VFS_NOT_FOUND",
            Self::Storage(_) => "VFS_STORAGE_ERROR",
            Self::Json(_) => "VFS_JSON_ERROR",
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, VfsError>;
