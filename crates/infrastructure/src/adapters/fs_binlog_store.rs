//! Local filesystem access to binlog segments and backups

use std::io::SeekFrom;
use std::path::Path;

use application::{ApplicationError, BinlogStorePort, StoredFile};
use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, instrument};

/// Binlog store on the local filesystem
///
/// Writes go straight to the file in place; the server is not coordinated
/// with.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBinlogStore;

impl FsBinlogStore {
    /// Create a store
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BinlogStorePort for FsBinlogStore {
    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn size(&self, path: &Path) -> Result<u64, ApplicationError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        Ok(metadata.len())
    }

    #[instrument(skip(self))]
    async fn read_at(
        &self,
        path: &Path,
        offset: u64,
        len: usize,
    ) -> Result<Vec<u8>, ApplicationError> {
        let mut file = fs::File::open(path)
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;

        let mut buf = Vec::with_capacity(len);
        file.take(len as u64)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        Ok(buf)
    }

    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn write_at(
        &self,
        path: &Path,
        offset: u64,
        bytes: &[u8],
    ) -> Result<(), ApplicationError> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        file.flush()
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn truncate(&self, path: &Path, len: u64) -> Result<(), ApplicationError> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        file.set_len(len)
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        file.sync_all()
            .await
            .map_err(|e| ApplicationError::io(path, &e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn copy(&self, from: &Path, to: &Path) -> Result<u64, ApplicationError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ApplicationError::io(parent, &e))?;
        }
        let bytes = fs::copy(from, to)
            .await
            .map_err(|e| ApplicationError::io(from, &e))?;
        debug!(bytes, "Copied");
        Ok(bytes)
    }

    async fn list(&self, dir: &Path, suffix: &str) -> Result<Vec<StoredFile>, ApplicationError> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ApplicationError::io(dir, &e)),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ApplicationError::io(dir, &e))?
        {
            let path = entry.path();
            let matches = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(suffix));
            if !matches {
                continue;
            }
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| ApplicationError::io(&path, &e))?;
            if metadata.is_file() {
                found.push(StoredFile {
                    path,
                    size_bytes: metadata.len(),
                });
            }
        }

        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use application::ErrorKind;

    use super::*;

    #[tokio::test]
    async fn read_write_truncate_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mysql-bin.000001");
        std::fs::write(&path, b"\xfebin0123456789").unwrap();
        let store = FsBinlogStore::new();

        assert!(store.exists(&path).await);
        assert_eq!(store.size(&path).await.unwrap(), 14);
        assert_eq!(store.read_at(&path, 0, 4).await.unwrap(), b"\xfebin");

        store.write_at(&path, 4, b"XY").await.unwrap();
        store.truncate(&path, 8).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"\xfebinXY23");
    }

    #[tokio::test]
    async fn read_past_end_is_short() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short");
        std::fs::write(&path, b"abc").unwrap();

        let bytes = FsBinlogStore::new().read_at(&path, 1, 10).await.unwrap();

        assert_eq!(bytes, b"bc");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let store = FsBinlogStore::new();

        assert!(!store.exists(&path).await);
        assert_eq!(store.size(&path).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            store.write_at(&path, 0, b"x").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn copy_creates_backup_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("mysql-bin.000002");
        std::fs::write(&source, vec![7u8; 300]).unwrap();
        let target = dir.path().join("backups/nested/mysql-bin.000002.backup");

        let bytes = FsBinlogStore::new().copy(&source, &target).await.unwrap();

        assert_eq!(bytes, 300);
        assert_eq!(std::fs::read(&target).unwrap(), vec![7u8; 300]);
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.backup"), b"22").unwrap();
        std::fs::write(dir.path().join("a.backup"), b"1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("dir.backup")).unwrap();

        let files = FsBinlogStore::new().list(dir.path(), ".backup").await.unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.backup", "b.backup"]);
        assert_eq!(files[1].size_bytes, 2);
    }

    #[tokio::test]
    async fn list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = FsBinlogStore::new()
            .list(&dir.path().join("nope"), ".backup")
            .await
            .unwrap();
        assert!(files.is_empty());
    }
}
