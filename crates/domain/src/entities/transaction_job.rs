//! Transactional load jobs

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::InterruptPolicy;

/// Shape of a load operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadKind {
    /// Many small rows in batched multi-row inserts
    BulkInsert,
    /// One large payload per row
    LargePayload,
    /// A transaction held open with periodic updates
    HoldOpen,
    /// Large payloads in a transaction held for a minimum duration
    Mixed,
}

impl LoadKind {
    /// Exit-path contract when the operation is interrupted
    ///
    /// Insert-only workloads discard partial work; long-held transactions
    /// keep it.
    #[must_use]
    pub const fn interrupt_policy(self) -> InterruptPolicy {
        match self {
            Self::BulkInsert | Self::LargePayload => InterruptPolicy::RollbackOnInterrupt,
            Self::HoldOpen | Self::Mixed => InterruptPolicy::CommitOnInterrupt,
        }
    }
}

impl fmt::Display for LoadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BulkInsert => "bulk-insert",
            Self::LargePayload => "large-payload",
            Self::HoldOpen => "hold-open",
            Self::Mixed => "mixed",
        })
    }
}

/// How a load transaction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOutcome {
    /// Ran to completion and committed
    Committed,
    /// Interrupted and committed with the work done so far
    CommittedEarly,
    /// All work discarded
    RolledBack,
}

/// A transactional load job and its progress counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionJob {
    /// Workload shape
    pub kind: LoadKind,
    /// Table written to
    pub target_table: String,
    /// Rows requested
    pub row_count: u64,
    /// Payload bytes per row (0 for plain records)
    pub payload_size_per_row: u64,
    /// Rows per multi-row insert
    pub batch_size: u64,
    /// Minimum time the transaction stays open
    pub min_duration: Option<Duration>,
    /// Rows applied so far
    pub rows_applied: u64,
    /// Update operations applied so far
    pub operations_applied: u64,
}

impl TransactionJob {
    /// Create a job with zeroed progress
    #[must_use]
    pub fn new(kind: LoadKind, target_table: impl Into<String>) -> Self {
        Self {
            kind,
            target_table: target_table.into(),
            row_count: 0,
            payload_size_per_row: 0,
            batch_size: 1,
            min_duration: None,
            rows_applied: 0,
            operations_applied: 0,
        }
    }

    /// Set the requested row count
    #[must_use]
    pub const fn with_rows(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }

    /// Set the payload size per row in bytes
    #[must_use]
    pub const fn with_payload_size(mut self, bytes: u64) -> Self {
        self.payload_size_per_row = bytes;
        self
    }

    /// Set the batch size
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the minimum open duration
    #[must_use]
    pub const fn with_min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = Some(duration);
        self
    }

    /// Record rows applied
    pub const fn record_rows(&mut self, rows: u64) {
        self.rows_applied += rows;
    }

    /// Record one update operation
    pub const fn record_operation(&mut self) {
        self.operations_applied += 1;
    }

    /// Interrupt contract of this job
    #[must_use]
    pub const fn interrupt_policy(&self) -> InterruptPolicy {
        self.kind.interrupt_policy()
    }
}

/// Partition of a row count into insert batches
///
/// Batches are `min(batch_size, remaining)` rows, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    row_count: u64,
    batch_size: u64,
}

impl BatchPlan {
    /// Plan `row_count` rows in batches of at most `batch_size`
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` if `batch_size` is zero.
    pub fn new(row_count: u64, batch_size: u64) -> Result<Self, DomainError> {
        if batch_size == 0 {
            return Err(DomainError::invalid("batch size must be at least 1"));
        }
        Ok(Self {
            row_count,
            batch_size,
        })
    }

    /// Number of batches, `ceil(row_count / batch_size)`
    #[must_use]
    pub const fn batch_count(&self) -> u64 {
        self.row_count.div_ceil(self.batch_size)
    }

    /// Size of the final batch, 0 if there are no rows
    #[must_use]
    pub const fn last_batch_size(&self) -> u64 {
        if self.row_count == 0 {
            0
        } else {
            match self.row_count % self.batch_size {
                0 => self.batch_size,
                rest => rest,
            }
        }
    }

    /// Batch sizes in application order
    pub fn batches(&self) -> impl Iterator<Item = u64> {
        let (row_count, batch_size) = (self.row_count, self.batch_size);
        (0..self.batch_count()).map(move |i| batch_size.min(row_count - i * batch_size))
    }
}
