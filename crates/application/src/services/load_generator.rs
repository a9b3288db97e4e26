//! Transactional load generation
//!
//! Each workload runs in a single transaction. Failures always roll back;
//! what an interrupt does depends on the job's [`InterruptPolicy`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use domain::{
    BatchPlan, DomainError, InterruptPolicy, LoadKind, PayloadKind, TransactionJob,
    TransactionOutcome,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use super::record_synthesizer::RecordSynthesizer;
use crate::error::ApplicationError;
use crate::interrupt::{InterruptSignal, sleep_or_interrupt};
use crate::ports::{DatabasePort, TransactionPort};

/// Rows between progress reports for payload inserts
const PAYLOAD_PROGRESS_EVERY: u64 = 10;

/// Tables written to and batching defaults
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Table receiving synthetic users
    pub users_table: String,
    /// Table receiving large payloads
    pub large_data_table: String,
    /// Key/value table updated by held-open transactions
    pub meta_table: String,
    /// Rows per multi-row insert
    pub batch_size: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            users_table: "users".to_string(),
            large_data_table: "large_data".to_string(),
            meta_table: "_toolkit_meta".to_string(),
            batch_size: 1000,
        }
    }
}

/// Result of a load transaction
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Job with its final progress counters
    pub job: TransactionJob,
    /// How the transaction ended
    pub outcome: TransactionOutcome,
    /// Time the transaction was open
    pub elapsed: Duration,
}

/// Result of auto-committed data generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    /// Table written to
    pub table: String,
    /// Batches inserted
    pub batches: u64,
    /// Rows inserted across all batches
    pub records_inserted: u64,
    /// Row count of the table after the last batch
    pub total_records: u64,
}

enum Progress {
    Completed,
    Interrupted,
}

/// Generates bulk, large-payload and long-held transactional load
pub struct LoadGenerator {
    database: Arc<dyn DatabasePort>,
    config: LoadConfig,
    synthesizer: Mutex<RecordSynthesizer>,
}

impl std::fmt::Debug for LoadGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LoadGenerator {
    /// Create a generator with an entropy-seeded synthesizer
    pub fn new(database: Arc<dyn DatabasePort>, config: LoadConfig) -> Self {
        Self {
            database,
            config,
            synthesizer: Mutex::new(RecordSynthesizer::from_entropy()),
        }
    }

    /// Make generated rows reproducible
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.synthesizer = Mutex::new(RecordSynthesizer::seeded(seed));
        self
    }

    /// Generator settings
    pub const fn config(&self) -> &LoadConfig {
        &self.config
    }

    fn user_rows(&self, count: u64) -> String {
        let mut synthesizer = self.synthesizer.lock();
        (0..count)
            .map(|_| synthesizer.user().values_tuple())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn payload_insert(&self, kind: PayloadKind, bytes: usize) -> String {
        let mut synthesizer = self.synthesizer.lock();
        let table = &self.config.large_data_table;
        let column = kind.column();
        match kind {
            PayloadKind::Text => format!(
                "INSERT INTO {table} ({column}) VALUES ('{}');",
                synthesizer.text_payload(bytes)
            ),
            PayloadKind::Blob => format!(
                "INSERT INTO {table} ({column}) VALUES (UNHEX('{}'));",
                synthesizer.hex_payload(bytes)
            ),
        }
    }

    async fn ensure_large_data_table(&self) -> Result<(), ApplicationError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id INT AUTO_INCREMENT PRIMARY KEY, \
             data_text LONGTEXT, \
             data_blob LONGBLOB, \
             created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP);",
            self.config.large_data_table
        );
        self.database.execute(&sql).await?;
        Ok(())
    }

    /// Commit or roll back according to how the body ended
    async fn finish(
        mut tx: Box<dyn TransactionPort>,
        job: TransactionJob,
        started: Instant,
        progress: Result<Progress, ApplicationError>,
    ) -> Result<LoadReport, ApplicationError> {
        let outcome = match progress {
            Err(e) => {
                error!(error = %e, kind = %job.kind, "Load failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                return Err(e);
            },
            Ok(Progress::Completed) => {
                tx.commit().await?;
                TransactionOutcome::Committed
            },
            Ok(Progress::Interrupted) => match job.interrupt_policy() {
                InterruptPolicy::CommitOnInterrupt => {
                    tx.commit().await?;
                    warn!(kind = %job.kind, "Interrupted, committed work so far");
                    TransactionOutcome::CommittedEarly
                },
                InterruptPolicy::RollbackOnInterrupt => {
                    tx.rollback().await?;
                    warn!(kind = %job.kind, "Interrupted, rolled back");
                    TransactionOutcome::RolledBack
                },
            },
        };

        let elapsed = started.elapsed();
        info!(
            kind = %job.kind,
            outcome = ?outcome,
            rows = job.rows_applied,
            operations = job.operations_applied,
            ?elapsed,
            "Load transaction finished"
        );
        Ok(LoadReport {
            job,
            outcome,
            elapsed,
        })
    }

    /// Insert `row_count` users in batches inside one transaction
    #[instrument(skip(self, signal))]
    pub async fn bulk_insert(
        &self,
        row_count: u64,
        batch_size: u64,
        signal: &InterruptSignal,
    ) -> Result<LoadReport, ApplicationError> {
        let plan = BatchPlan::new(row_count, batch_size)?;
        let mut job = TransactionJob::new(LoadKind::BulkInsert, &self.config.users_table)
            .with_rows(row_count)
            .with_batch_size(batch_size);

        let started = Instant::now();
        let mut tx = self.database.begin().await?;
        let progress = self.insert_batches(tx.as_mut(), plan, &mut job, signal).await;
        Self::finish(tx, job, started, progress).await
    }

    async fn insert_batches(
        &self,
        tx: &mut dyn TransactionPort,
        plan: BatchPlan,
        job: &mut TransactionJob,
        signal: &InterruptSignal,
    ) -> Result<Progress, ApplicationError> {
        for batch in plan.batches() {
            if signal.is_interrupted() {
                return Ok(Progress::Interrupted);
            }
            let sql = format!(
                "INSERT INTO {} (name, email, status) VALUES {};",
                job.target_table,
                self.user_rows(batch)
            );
            tx.execute(&sql).await?;
            job.record_rows(batch);
            info!(inserted = job.rows_applied, total = job.row_count, "Batch inserted");
        }
        Ok(Progress::Completed)
    }

    /// Insert `row_count` rows of exactly `size_kb` KiB each in one transaction
    #[instrument(skip(self, signal))]
    pub async fn large_payload_insert(
        &self,
        row_count: u64,
        size_kb: u64,
        kind: PayloadKind,
        signal: &InterruptSignal,
    ) -> Result<LoadReport, ApplicationError> {
        let bytes = payload_bytes(size_kb)?;
        let mut job = TransactionJob::new(LoadKind::LargePayload, &self.config.large_data_table)
            .with_rows(row_count)
            .with_payload_size(bytes as u64);

        self.ensure_large_data_table().await?;

        let started = Instant::now();
        let mut tx = self.database.begin().await?;
        let progress = self
            .insert_payloads(tx.as_mut(), kind, bytes, &mut job, signal)
            .await;
        Self::finish(tx, job, started, progress).await
    }

    async fn insert_payloads(
        &self,
        tx: &mut dyn TransactionPort,
        kind: PayloadKind,
        bytes: usize,
        job: &mut TransactionJob,
        signal: &InterruptSignal,
    ) -> Result<Progress, ApplicationError> {
        for row in 1..=job.row_count {
            if signal.is_interrupted() {
                return Ok(Progress::Interrupted);
            }
            let sql = self.payload_insert(kind, bytes);
            tx.execute(&sql).await?;
            job.record_rows(1);
            if row % PAYLOAD_PROGRESS_EVERY == 0 || row == job.row_count {
                info!(inserted = row, total = job.row_count, "Payload rows inserted");
            }
        }
        Ok(Progress::Completed)
    }

    /// Keep a transaction open for `duration`, updating at `ops_per_second`
    ///
    /// An interrupt commits the operations done so far.
    #[instrument(skip(self, signal))]
    pub async fn hold_open_transaction(
        &self,
        duration: Duration,
        ops_per_second: u32,
        signal: &InterruptSignal,
    ) -> Result<LoadReport, ApplicationError> {
        if ops_per_second == 0 {
            return Err(DomainError::invalid("operations per second must be at least 1").into());
        }
        let pause = Duration::from_secs(1) / ops_per_second;
        let mut job = TransactionJob::new(LoadKind::HoldOpen, &self.config.meta_table)
            .with_min_duration(duration);

        let started = Instant::now();
        let mut tx = self.database.begin().await?;
        let progress = self
            .update_until(tx.as_mut(), started, duration, pause, &mut job, signal)
            .await;
        Self::finish(tx, job, started, progress).await
    }

    async fn update_until(
        &self,
        tx: &mut dyn TransactionPort,
        started: Instant,
        duration: Duration,
        pause: Duration,
        job: &mut TransactionJob,
        signal: &InterruptSignal,
    ) -> Result<Progress, ApplicationError> {
        while started.elapsed() < duration {
            if signal.is_interrupted() {
                return Ok(Progress::Interrupted);
            }
            let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
            let sql = format!(
                "UPDATE {} SET value='{stamp}', updated_at=NOW() WHERE key_name='version';",
                job.target_table
            );
            tx.execute(&sql).await?;
            job.record_operation();

            let elapsed = started.elapsed();
            info!(
                operations = job.operations_applied,
                remaining = ?duration.saturating_sub(elapsed),
                "Transaction held open"
            );
            if sleep_or_interrupt(pause, signal).await {
                return Ok(Progress::Interrupted);
            }
        }
        Ok(Progress::Completed)
    }

    /// Insert text payloads, then hold the transaction for at least `min_duration`
    ///
    /// An interrupt commits the rows inserted so far.
    #[instrument(skip(self, signal))]
    pub async fn mixed_load(
        &self,
        row_count: u64,
        size_kb: u64,
        min_duration: Duration,
        signal: &InterruptSignal,
    ) -> Result<LoadReport, ApplicationError> {
        let bytes = payload_bytes(size_kb)?;
        let mut job = TransactionJob::new(LoadKind::Mixed, &self.config.large_data_table)
            .with_rows(row_count)
            .with_payload_size(bytes as u64)
            .with_min_duration(min_duration);

        self.ensure_large_data_table().await?;

        let started = Instant::now();
        let mut tx = self.database.begin().await?;
        let progress = match self
            .insert_payloads(tx.as_mut(), PayloadKind::Text, bytes, &mut job, signal)
            .await
        {
            Ok(Progress::Completed) => {
                let remaining = min_duration.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    Ok(Progress::Completed)
                } else {
                    info!(?remaining, "Holding transaction open");
                    if sleep_or_interrupt(remaining, signal).await {
                        Ok(Progress::Interrupted)
                    } else {
                        Ok(Progress::Completed)
                    }
                }
            },
            other => other,
        };
        Self::finish(tx, job, started, progress).await
    }

    /// Insert batches of synthetic users with auto-commit
    ///
    /// One batch every `interval` until interrupted; a zero interval runs a
    /// single batch.
    #[instrument(skip(self, signal))]
    pub async fn generate_data(
        &self,
        count: u64,
        table: &str,
        interval: Duration,
        signal: &InterruptSignal,
    ) -> Result<GenerateReport, ApplicationError> {
        if count == 0 {
            return Err(DomainError::invalid("record count must be at least 1").into());
        }

        let mut report = GenerateReport {
            table: table.to_string(),
            batches: 0,
            records_inserted: 0,
            total_records: 0,
        };

        loop {
            if signal.is_interrupted() {
                break;
            }
            let sql = format!(
                "INSERT INTO {table} (name, email, status) VALUES {};",
                self.user_rows(count)
            );
            self.database.execute(&sql).await?;
            report.batches += 1;
            report.records_inserted += count;
            report.total_records = self.database.record_count(table).await?;
            info!(
                batch = report.batches,
                total = report.total_records,
                "Batch complete"
            );

            if interval.is_zero() || sleep_or_interrupt(interval, signal).await {
                break;
            }
        }

        Ok(report)
    }
}

fn payload_bytes(size_kb: u64) -> Result<usize, ApplicationError> {
    if size_kb == 0 {
        return Err(DomainError::invalid("payload size must be at least 1 KB").into());
    }
    size_kb
        .checked_mul(1024)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .ok_or_else(|| DomainError::invalid(format!("payload size {size_kb} KB is too large")).into())
}
