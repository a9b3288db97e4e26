//! Domain entities

mod binlog;
mod corruption;
mod fault;
mod schema_change;
mod transaction_job;

pub use binlog::{BACKUP_SUFFIX, BackupEntry, BackupHandle, BinlogFile, BinlogStatus};
pub use corruption::{
    BINLOG_MAGIC, CorruptionOutcome, CorruptionStrategy, HEADER_RESERVED_BYTES, MAGIC_NUMBER_LEN,
};
pub use fault::{FaultFlag, FaultState, FaultTarget, FaultWindow, FlapPhase, FlapTransition};
pub use schema_change::{
    COLUMN_TYPES, ESSENTIAL_COLUMNS, PROTECTED_TABLES, SchemaChange, SchemaChangeOutcome,
};
pub use transaction_job::{BatchPlan, LoadKind, TransactionJob, TransactionOutcome};
