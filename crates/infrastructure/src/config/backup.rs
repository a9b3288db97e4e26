//! Backup area configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where binlog backups are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory receiving `<name>.backup` copies (default: /opt/backups)
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/opt/backups")
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
        }
    }
}
