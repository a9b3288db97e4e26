//! Binlog files, replication status and backups

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Suffix appended to a binlog file name to form its backup name
pub const BACKUP_SUFFIX: &str = ".backup";

/// A binlog segment as reported by the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinlogFile {
    /// File name (e.g. `mysql-bin.000003`)
    pub name: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Whether the segment is encrypted at rest
    pub encrypted: bool,
}

impl BinlogFile {
    /// Create a new binlog file record
    #[must_use]
    pub fn new(name: impl Into<String>, size_bytes: u64, encrypted: bool) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            encrypted,
        }
    }
}

/// Current write position of the binary log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinlogStatus {
    /// Binlog file currently written to
    pub file: String,
    /// Byte position within `file`
    pub position: u64,
    /// Executed GTID set, empty when GTIDs are disabled
    pub gtid: String,
}

impl BinlogStatus {
    /// Whether `self` is at a later position than `earlier`
    ///
    /// Binlog names sort lexicographically by sequence number, so a later
    /// file always compares greater.
    #[must_use]
    pub fn advanced_since(&self, earlier: &Self) -> bool {
        (self.file.as_str(), self.position) > (earlier.file.as_str(), earlier.position)
    }

    /// Whether the log rotated onto a new file since `earlier`
    #[must_use]
    pub fn rotated_since(&self, earlier: &Self) -> bool {
        self.file != earlier.file
    }
}

/// Handle to a byte-for-byte copy of a binlog file
///
/// Backups are named `<original-filename>.backup`, so a later backup of the
/// same file name replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackupHandle {
    source_name: String,
    path: PathBuf,
}

impl BackupHandle {
    /// Backup location for `source` inside `backup_dir`
    ///
    /// Returns `None` if `source` has no file name component.
    #[must_use]
    pub fn for_source(backup_dir: &Path, source: &Path) -> Option<Self> {
        let source_name = source.file_name()?.to_string_lossy().into_owned();
        let path = backup_dir.join(format!("{source_name}{BACKUP_SUFFIX}"));
        Some(Self { source_name, path })
    }

    /// Recover a handle from an existing backup path
    ///
    /// Returns `None` if the file name does not end in `.backup`.
    #[must_use]
    pub fn from_backup_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let source_name = file_name.strip_suffix(BACKUP_SUFFIX)?;
        if source_name.is_empty() {
            return None;
        }
        Some(Self {
            source_name: source_name.to_string(),
            path,
        })
    }

    /// Name of the binlog file this backup was taken from
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Location of the backup copy
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where this backup is restored to inside `binlog_dir`
    #[must_use]
    pub fn restore_target(&self, binlog_dir: &Path) -> PathBuf {
        binlog_dir.join(&self.source_name)
    }
}

/// A backup found in the backup area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Handle to the backup
    pub handle: BackupHandle,
    /// Size of the backup in bytes
    pub size_bytes: u64,
}
