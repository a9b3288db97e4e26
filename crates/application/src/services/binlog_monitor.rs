//! Point-in-time binlog status

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::{BinlogFile, BinlogStatus};
use serde::Serialize;
use tracing::debug;

use crate::error::ApplicationError;
use crate::interrupt::{InterruptSignal, sleep_or_interrupt};
use crate::ports::DatabasePort;

/// Binlog state plus a row count, ready for printing or JSON output
#[derive(Debug, Clone, Serialize)]
pub struct BinlogSnapshot {
    pub timestamp: DateTime<Utc>,
    /// `None` when binary logging is disabled
    pub status: Option<BinlogStatus>,
    pub files: Vec<BinlogFile>,
    /// Sum of all segment sizes
    pub total_size: u64,
    /// Human-readable `total_size`
    pub total_size_human: String,
    /// Table whose rows were counted
    pub table: String,
    pub records: u64,
}

/// Render a byte count with a binary unit, e.g. `1.5 KB`
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} TB")
}

/// Reads binlog status on demand
pub struct BinlogMonitor {
    database: Arc<dyn DatabasePort>,
    table: String,
}

impl std::fmt::Debug for BinlogMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinlogMonitor")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl BinlogMonitor {
    pub fn new(database: Arc<dyn DatabasePort>, table: impl Into<String>) -> Self {
        Self {
            database,
            table: table.into(),
        }
    }

    /// Current status, segments and row count
    pub async fn snapshot(&self) -> Result<BinlogSnapshot, ApplicationError> {
        let status = self.database.binlog_status().await?;
        let files = self.database.binlog_files().await?;
        let total_size = files.iter().map(|f| f.size_bytes).sum();
        let records = self.database.record_count(&self.table).await?;

        debug!(files = files.len(), total_size, records, "Snapshot taken");
        Ok(BinlogSnapshot {
            timestamp: Utc::now(),
            status,
            files,
            total_size,
            total_size_human: format_size(total_size),
            table: self.table.clone(),
            records,
        })
    }

    /// Take a snapshot every `interval` until interrupted
    ///
    /// Returns the number of snapshots taken.
    pub async fn watch<F>(
        &self,
        interval: Duration,
        signal: &InterruptSignal,
        mut on_snapshot: F,
    ) -> Result<u64, ApplicationError>
    where
        F: FnMut(&BinlogSnapshot) + Send,
    {
        let mut taken = 0;
        while !signal.is_interrupted() {
            let snapshot = self.snapshot().await?;
            on_snapshot(&snapshot);
            taken += 1;
            if sleep_or_interrupt(interval, signal).await {
                break;
            }
        }
        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDatabase;

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024 * 1024), "3.0 TB");
    }

    #[tokio::test]
    async fn snapshot_sums_segments() {
        let database = FakeDatabase::default()
            .with_binlog("mysql-bin.000002", 4711, "uuid:1-42")
            .with_binlog_files(vec![
                BinlogFile::new("mysql-bin.000001", 1024, false),
                BinlogFile::new("mysql-bin.000002", 512, false),
            ]);
        database
            .execute("INSERT INTO users (name, email, status) VALUES ('a', 'b', 'c'),('d', 'e', 'f');")
            .await
            .unwrap();

        let snapshot = BinlogMonitor::new(Arc::new(database), "users")
            .snapshot()
            .await
            .unwrap();

        assert_eq!(snapshot.total_size, 1536);
        assert_eq!(snapshot.total_size_human, "1.5 KB");
        assert_eq!(snapshot.records, 2);
        assert_eq!(snapshot.status.unwrap().position, 4711);
    }

    #[tokio::test]
    async fn snapshot_serializes_to_json() {
        let snapshot = BinlogMonitor::new(Arc::new(FakeDatabase::default()), "users")
            .snapshot()
            .await
            .unwrap();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["status"].is_null());
        assert_eq!(json["total_size"], 0);
        assert_eq!(json["table"], "users");
    }

    #[tokio::test(start_paused = true)]
    async fn watch_repeats_until_interrupted() {
        let monitor = BinlogMonitor::new(Arc::new(FakeDatabase::default()), "users");
        let (handle, signal) = InterruptSignal::new();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            handle.interrupt();
        });

        let mut seen = 0;
        let taken = monitor
            .watch(Duration::from_secs(2), &signal, |_| seen += 1)
            .await
            .unwrap();

        // snapshots at 0s, 2s and 4s
        assert_eq!(taken, 3);
        assert_eq!(seen, 3);
    }
}
