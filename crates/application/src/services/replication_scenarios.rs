//! Replication stream scenarios: lag, segment gaps and GTID advances

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use domain::{BinlogStatus, DomainError};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, instrument};

use super::record_synthesizer::RecordSynthesizer;
use crate::error::ApplicationError;
use crate::interrupt::{InterruptSignal, sleep_or_interrupt};
use crate::ports::DatabasePort;

const DISCONNECT_ROWS: u32 = 5;
const GTID_GAP_ROWS: u32 = 3;

/// Result of a lag run
#[derive(Debug, Clone, Serialize)]
pub struct LagReport {
    /// Updates issued
    pub operations: u64,
    /// Time spent
    pub elapsed: Duration,
    /// Whether the run was cut short
    pub interrupted: bool,
}

/// Binlog position before and after a scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub before: BinlogStatus,
    pub after: BinlogStatus,
    /// Rows inserted between the two readings
    pub rows_inserted: u32,
    /// Binlog rotations forced
    pub flushes: u32,
}

impl ScenarioReport {
    /// Whether the server moved to a new segment
    #[must_use]
    pub fn rotated(&self) -> bool {
        self.after.rotated_since(&self.before)
    }
}

/// Drives replication-facing scenarios against the primary
pub struct ReplicationScenarioService {
    database: Arc<dyn DatabasePort>,
    users_table: String,
    meta_table: String,
    synthesizer: Mutex<RecordSynthesizer>,
}

impl std::fmt::Debug for ReplicationScenarioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationScenarioService")
            .field("users_table", &self.users_table)
            .field("meta_table", &self.meta_table)
            .finish_non_exhaustive()
    }
}

impl ReplicationScenarioService {
    pub fn new(
        database: Arc<dyn DatabasePort>,
        users_table: impl Into<String>,
        meta_table: impl Into<String>,
    ) -> Self {
        Self {
            database,
            users_table: users_table.into(),
            meta_table: meta_table.into(),
            synthesizer: Mutex::new(RecordSynthesizer::from_entropy()),
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.synthesizer = Mutex::new(RecordSynthesizer::seeded(seed));
        self
    }

    async fn require_status(&self) -> Result<BinlogStatus, ApplicationError> {
        self.database.binlog_status().await?.ok_or_else(|| {
            DomainError::PreconditionFailed("binary logging is disabled".to_string()).into()
        })
    }

    /// Issue updates separated by random delays in `[min_delay, max_delay]`
    #[instrument(skip(self, signal))]
    pub async fn lag(
        &self,
        duration: Duration,
        min_delay: Duration,
        max_delay: Duration,
        signal: &InterruptSignal,
    ) -> Result<LagReport, ApplicationError> {
        if min_delay > max_delay {
            return Err(DomainError::invalid("minimum delay exceeds maximum delay").into());
        }
        if max_delay.is_zero() {
            return Err(DomainError::invalid("maximum delay must be positive").into());
        }

        let started = Instant::now();
        let mut operations = 0;
        let mut interrupted = false;

        while started.elapsed() < duration {
            let stamp = Utc::now().format("%H:%M:%S");
            self.database
                .execute(&format!(
                    "UPDATE {} SET value='{stamp}' WHERE key_name='version';",
                    self.meta_table
                ))
                .await?;
            operations += 1;

            let delay = Duration::from_secs_f64(
                self.synthesizer
                    .lock()
                    .between(min_delay.as_secs_f64(), max_delay.as_secs_f64()),
            );
            info!(operation = operations, next_in = ?delay, "Lagged operation");
            if sleep_or_interrupt(delay, signal).await {
                interrupted = true;
                break;
            }
        }

        Ok(LagReport {
            operations,
            elapsed: started.elapsed(),
            interrupted,
        })
    }

    /// Rotate the binlog around a burst of inserts
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<ScenarioReport, ApplicationError> {
        let before = self.require_status().await?;
        info!(file = %before.file, position = before.position, "Before disconnect");

        self.database.flush_binary_logs().await?;
        for i in 0..DISCONNECT_ROWS {
            self.database
                .execute(&format!(
                    "INSERT INTO {} (name, email) VALUES ('Disconnect Test {i}', 'test{i}@disconnect.com');",
                    self.users_table
                ))
                .await?;
        }
        self.database.flush_binary_logs().await?;

        let after = self.require_status().await?;
        info!(file = %after.file, position = after.position, "After disconnect");
        Ok(ScenarioReport {
            before,
            after,
            rows_inserted: DISCONNECT_ROWS,
            flushes: 2,
        })
    }

    /// Advance the GTID set and rotate the binlog
    #[instrument(skip(self))]
    pub async fn gtid_gap(&self) -> Result<ScenarioReport, ApplicationError> {
        let before = self.require_status().await?;
        info!(gtid = %before.gtid, "GTID before");

        for i in 0..GTID_GAP_ROWS {
            self.database
                .execute(&format!(
                    "INSERT INTO {} (name, email) VALUES ('GTID Test {i}', 'gtid{i}@test.com');",
                    self.users_table
                ))
                .await?;
        }
        self.database.flush_binary_logs().await?;

        let after = self.require_status().await?;
        info!(gtid = %after.gtid, "GTID after");
        Ok(ScenarioReport {
            before,
            after,
            rows_inserted: GTID_GAP_ROWS,
            flushes: 1,
        })
    }
}
