//! Binlog corruption and backup restore
//!
//! Every mutation is a byte-range operation on the file. Binlog events are
//! never parsed, so the result is a structurally invalid segment that
//! downstream parsers must cope with.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::{
    BACKUP_SUFFIX, BackupEntry, BackupHandle, CorruptionOutcome, CorruptionStrategy, DomainError,
    HEADER_RESERVED_BYTES, MAGIC_NUMBER_LEN, TruncatePercentage,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{BinlogStorePort, DatabasePort};

/// Where binlogs live and where their backups go
#[derive(Debug, Clone)]
pub struct CorruptionConfig {
    /// Directory holding the server's binlog segments
    pub binlog_dir: PathBuf,
    /// Directory receiving `<name>.backup` copies
    pub backup_dir: PathBuf,
}

impl Default for CorruptionConfig {
    fn default() -> Self {
        Self {
            binlog_dir: PathBuf::from("/var/lib/mysql"),
            backup_dir: PathBuf::from("/opt/backups"),
        }
    }
}

/// Result of a backup-then-corrupt run
#[derive(Debug, Clone, Serialize)]
pub struct CorruptionReport {
    /// File that was corrupted
    pub target: PathBuf,
    /// Strategy applied
    pub strategy: CorruptionStrategy,
    /// Backup taken before mutating, if any
    pub backup: Option<BackupHandle>,
    /// Before/after state
    pub outcome: CorruptionOutcome,
    /// When the mutation finished
    pub applied_at: DateTime<Utc>,
}

/// A backup copied back over its binlog
#[derive(Debug, Clone, Serialize)]
pub struct RestoredBackup {
    /// Backup that was copied
    pub backup: BackupHandle,
    /// File that was overwritten
    pub target: PathBuf,
    /// Bytes written
    pub bytes: u64,
}

/// Corrupts binlog files and restores them from backups
pub struct CorruptionService {
    store: Arc<dyn BinlogStorePort>,
    database: Arc<dyn DatabasePort>,
    config: CorruptionConfig,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for CorruptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorruptionService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CorruptionService {
    /// Create a service drawing randomness from the operating system
    pub fn new(
        store: Arc<dyn BinlogStorePort>,
        database: Arc<dyn DatabasePort>,
        config: CorruptionConfig,
    ) -> Self {
        Self {
            store,
            database,
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Make random offsets and byte values reproducible
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Configured directories
    pub const fn config(&self) -> &CorruptionConfig {
        &self.config
    }

    /// Path of the binlog to act on
    ///
    /// A bare file name is looked up in the binlog directory. Without a
    /// name, the segment the server is currently writing is used.
    pub async fn resolve_target(&self, file: Option<&str>) -> Result<PathBuf, ApplicationError> {
        let path = match file {
            Some(name) if Path::new(name).is_absolute() => PathBuf::from(name),
            Some(name) => self.config.binlog_dir.join(name),
            None => {
                let status = self.database.binlog_status().await?.ok_or_else(|| {
                    DomainError::PreconditionFailed("binary logging is disabled".to_string())
                })?;
                self.config.binlog_dir.join(status.file)
            },
        };

        if !self.store.exists(&path).await {
            return Err(DomainError::not_found("Binlog file", path.display().to_string()).into());
        }
        Ok(path)
    }

    /// Copy `path` into the backup area
    ///
    /// A later backup of the same file name replaces the earlier one.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn backup(&self, path: &Path) -> Result<BackupHandle, ApplicationError> {
        let handle = BackupHandle::for_source(&self.config.backup_dir, path).ok_or_else(|| {
            DomainError::invalid(format!("{} has no file name", path.display()))
        })?;

        let bytes = self.store.copy(path, handle.path()).await?;
        info!(backup = %handle.path().display(), bytes, "Backup created");
        Ok(handle)
    }

    /// Truncate `path` to `percentage` of its size
    #[instrument(skip_all, fields(path = %path.display(), percentage = %percentage))]
    pub async fn truncate(
        &self,
        path: &Path,
        percentage: TruncatePercentage,
    ) -> Result<CorruptionOutcome, ApplicationError> {
        let original_size = self.store.size(path).await?;
        let new_size = percentage.apply(original_size);

        if new_size < original_size {
            self.store.truncate(path, new_size).await?;
        }

        info!(original_size, new_size, "Truncated binlog");
        Ok(CorruptionOutcome::Truncated {
            original_size,
            new_size,
        })
    }

    /// Overwrite `count` random positions past the reserved header
    ///
    /// Positions are drawn independently, so duplicates are possible.
    /// Files no larger than the header are skipped.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn inject_random_bytes(
        &self,
        path: &Path,
        count: u32,
    ) -> Result<CorruptionOutcome, ApplicationError> {
        if count == 0 {
            return Err(DomainError::invalid("byte count must be at least 1").into());
        }

        let file_size = self.store.size(path).await?;
        if file_size <= HEADER_RESERVED_BYTES {
            warn!(file_size, "File too small to corrupt safely");
            return Ok(CorruptionOutcome::Skipped {
                reason: format!(
                    "file is {file_size} bytes, needs more than {HEADER_RESERVED_BYTES}"
                ),
            });
        }

        let writes: Vec<(u64, u8)> = {
            let mut rng = self.rng.lock();
            (0..count)
                .map(|_| {
                    (
                        rng.random_range(HEADER_RESERVED_BYTES..file_size),
                        rng.random::<u8>(),
                    )
                })
                .collect()
        };

        for (offset, value) in &writes {
            self.store.write_at(path, *offset, &[*value]).await?;
            debug!(offset, value, "Byte overwritten");
        }

        let offsets: Vec<u64> = writes.into_iter().map(|(offset, _)| offset).collect();
        info!(file_size, corrupted = offsets.len(), "Injected random bytes");
        Ok(CorruptionOutcome::BytesInjected { file_size, offsets })
    }

    /// Zero the 4-byte magic number, reporting its previous value
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn corrupt_magic_number(
        &self,
        path: &Path,
    ) -> Result<CorruptionOutcome, ApplicationError> {
        let file_size = self.store.size(path).await?;
        if file_size < MAGIC_NUMBER_LEN as u64 {
            warn!(file_size, "File shorter than the magic number");
            return Ok(CorruptionOutcome::Skipped {
                reason: format!("file is {file_size} bytes, shorter than the magic number"),
            });
        }

        let original = self.store.read_at(path, 0, MAGIC_NUMBER_LEN).await?;
        self.store.write_at(path, 0, &[0u8; MAGIC_NUMBER_LEN]).await?;

        let original_hex = hex::encode(&original);
        info!(original = %original_hex, "Magic number zeroed");
        Ok(CorruptionOutcome::MagicNumberCorrupted { original_hex })
    }

    /// Back up `target` (unless disabled) and apply `strategy`
    #[instrument(skip_all, fields(target = %target.display(), strategy = strategy.name()))]
    pub async fn corrupt(
        &self,
        target: &Path,
        strategy: CorruptionStrategy,
        take_backup: bool,
    ) -> Result<CorruptionReport, ApplicationError> {
        if !self.store.exists(target).await {
            return Err(
                DomainError::not_found("Binlog file", target.display().to_string()).into(),
            );
        }

        let backup = if take_backup {
            Some(self.backup(target).await?)
        } else {
            warn!("Corrupting without a backup");
            None
        };

        let outcome = match strategy {
            CorruptionStrategy::Truncate { percentage } => {
                self.truncate(target, percentage).await?
            },
            CorruptionStrategy::RandomBytes { count } => {
                self.inject_random_bytes(target, count).await?
            },
            CorruptionStrategy::MagicNumber => self.corrupt_magic_number(target).await?,
        };

        Ok(CorruptionReport {
            target: target.to_path_buf(),
            strategy,
            backup,
            outcome,
            applied_at: Utc::now(),
        })
    }

    /// Copy a backup over `target`
    #[instrument(skip_all, fields(backup = %backup.path().display(), target = %target.display()))]
    pub async fn restore(
        &self,
        backup: &BackupHandle,
        target: &Path,
    ) -> Result<RestoredBackup, ApplicationError> {
        if !self.store.exists(backup.path()).await {
            return Err(
                DomainError::not_found("Backup", backup.path().display().to_string()).into(),
            );
        }

        let bytes = self.store.copy(backup.path(), target).await?;
        info!(bytes, "Restored binlog from backup");
        Ok(RestoredBackup {
            backup: backup.clone(),
            target: target.to_path_buf(),
            bytes,
        })
    }

    /// Restore a backup to the binlog it was taken from
    pub async fn restore_to_origin(
        &self,
        backup: &BackupHandle,
    ) -> Result<RestoredBackup, ApplicationError> {
        let target = backup.restore_target(&self.config.binlog_dir);
        self.restore(backup, &target).await
    }

    /// All backups in the backup area, sorted by name
    pub async fn list_backups(&self) -> Result<Vec<BackupEntry>, ApplicationError> {
        let files = self
            .store
            .list(&self.config.backup_dir, BACKUP_SUFFIX)
            .await?;

        Ok(files
            .into_iter()
            .filter_map(|file| {
                BackupHandle::from_backup_path(file.path).map(|handle| BackupEntry {
                    handle,
                    size_bytes: file.size_bytes,
                })
            })
            .collect())
    }

    /// Locate a backup by partial name or path
    ///
    /// Listed backups whose path contains `query` win; otherwise `query` is
    /// taken as a path, then as a file name inside the backup area.
    pub async fn find_backup(&self, query: &str) -> Result<BackupHandle, ApplicationError> {
        let listed = self.list_backups().await?;
        if let Some(entry) = listed
            .into_iter()
            .find(|entry| entry.handle.path().to_string_lossy().contains(query))
        {
            return Ok(entry.handle);
        }

        let direct = PathBuf::from(query);
        let candidate = if self.store.exists(&direct).await {
            direct
        } else {
            self.config.backup_dir.join(query)
        };

        if !self.store.exists(&candidate).await {
            return Err(DomainError::not_found("Backup", query).into());
        }
        BackupHandle::from_backup_path(candidate.clone()).ok_or_else(|| {
            DomainError::invalid(format!(
                "{} is not a {BACKUP_SUFFIX} file",
                candidate.display()
            ))
            .into()
        })
    }

    /// Restore every backup to its origin
    ///
    /// An empty backup area is a no-op.
    #[instrument(skip(self))]
    pub async fn restore_all(&self) -> Result<Vec<RestoredBackup>, ApplicationError> {
        let backups = self.list_backups().await?;
        if backups.is_empty() {
            info!("No backups to restore");
            return Ok(Vec::new());
        }

        let mut restored = Vec::with_capacity(backups.len());
        for entry in backups {
            restored.push(self.restore_to_origin(&entry.handle).await?);
        }
        info!(count = restored.len(), "Restored all backups");
        Ok(restored)
    }

    /// Start a fresh binlog segment after restoring
    pub async fn flush_after_restore(&self) -> Result<(), ApplicationError> {
        self.database.flush_binary_logs().await?;
        info!("Flushed binary logs");
        Ok(())
    }
}
