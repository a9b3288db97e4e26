//! Byte-level file access for binlogs and their backups

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// A file found by [`BinlogStorePort::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Full path
    pub path: PathBuf,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Port for reading and mutating binlog files in place
///
/// Missing files are reported as `DomainError::NotFound`, other failures
/// as `ApplicationError::Io`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BinlogStorePort: Send + Sync {
    /// Whether `path` exists
    async fn exists(&self, path: &Path) -> bool;

    /// Size of `path` in bytes
    async fn size(&self, path: &Path) -> Result<u64, ApplicationError>;

    /// Read up to `len` bytes starting at `offset`
    async fn read_at(&self, path: &Path, offset: u64, len: usize)
    -> Result<Vec<u8>, ApplicationError>;

    /// Overwrite bytes starting at `offset`
    async fn write_at(&self, path: &Path, offset: u64, bytes: &[u8])
    -> Result<(), ApplicationError>;

    /// Truncate `path` to `len` bytes
    async fn truncate(&self, path: &Path, len: u64) -> Result<(), ApplicationError>;

    /// Copy `from` over `to` byte for byte, creating the parent directory
    ///
    /// Returns the number of bytes copied.
    async fn copy(&self, from: &Path, to: &Path) -> Result<u64, ApplicationError>;

    /// Files in `dir` whose names end with `suffix`, sorted by path
    ///
    /// A missing directory yields an empty list.
    async fn list(&self, dir: &Path, suffix: &str) -> Result<Vec<StoredFile>, ApplicationError>;
}
