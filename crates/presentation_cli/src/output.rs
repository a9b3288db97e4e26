//! Report printing
//!
//! Every report is either pretty JSON or a few human-readable lines.

use std::time::Duration;

use application::{
    BinlogSnapshot, CorruptionReport, DownReport, FlapReport, GenerateReport, LagReport,
    LoadReport, NetworkStatus, RestoreReport, RestoredBackup, ScenarioReport, ServiceStart,
    TimedFaultReport, format_size,
};
use domain::{BackupEntry, CorruptionOutcome, FaultWindow, SchemaChangeOutcome, TransactionOutcome};
use serde::Serialize;

/// Where reports go and in which format
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    pub const fn is_json(self) -> bool {
        self.json
    }

    /// Print `value` as JSON, or through `human` otherwise
    pub fn report<T: Serialize + ?Sized>(self, value: &T, human: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

fn secs(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

pub fn corruption(report: &CorruptionReport) {
    println!("💥 {} on {}", report.strategy.name(), report.target.display());
    match &report.outcome {
        CorruptionOutcome::Truncated {
            original_size,
            new_size,
        } => println!(
            "   Size: {} -> {}",
            format_size(*original_size),
            format_size(*new_size)
        ),
        CorruptionOutcome::BytesInjected { file_size, offsets } => println!(
            "   Overwrote {} byte(s) in {}",
            offsets.len(),
            format_size(*file_size)
        ),
        CorruptionOutcome::MagicNumberCorrupted { original_hex } => {
            println!("   Magic number {original_hex} -> 00000000");
        },
        CorruptionOutcome::Skipped { reason } => println!("   ⚠️  Skipped: {reason}"),
    }
    match &report.backup {
        Some(backup) => println!("   📁 Backup: {}", backup.path().display()),
        None => println!("   ⚠️  No backup taken"),
    }
}

pub fn backups(entries: &[BackupEntry]) {
    if entries.is_empty() {
        println!("No backups found");
        return;
    }
    println!("📁 Backups:");
    for entry in entries {
        println!(
            "   {}  {}",
            entry.handle.path().display(),
            format_size(entry.size_bytes)
        );
    }
}

pub fn restored(restored: &[RestoredBackup]) {
    if restored.is_empty() {
        println!("Nothing to restore");
    }
    for item in restored {
        println!(
            "✅ Restored {} from {} ({})",
            item.target.display(),
            item.backup.path().display(),
            format_size(item.bytes)
        );
    }
}

fn window(window: &FaultWindow) -> String {
    format!("{} on {}", window.flag, window.target)
}

pub fn down(report: &DownReport) {
    println!("🔻 {} fault applied: {}", report.kind, window(&report.window));
    if let Some(service) = report.service {
        println!("   Service: {service:?}");
    }
}

pub fn restore(report: &RestoreReport) {
    if report.closed.is_empty() {
        println!("✅ Nothing was active");
    }
    for closed in &report.closed {
        println!("✅ Cleared {}", window(closed));
    }
    match report.service {
        Some(ServiceStart::Unconfirmed { attempts }) => {
            println!("   ⚠️  Server launched but not answering after {attempts} checks");
        },
        Some(service) => println!("   Service: {service:?}"),
        None => {},
    }
}

pub fn timed(report: &TimedFaultReport) {
    let how = if report.interrupted { "interrupted after" } else { "held for" };
    println!("⏱️  {} {how} {}", window(&report.window), secs(report.elapsed));
    restore(&report.restore);
}

pub fn flap(report: &FlapReport) {
    println!("🔁 {} flap, {} transition(s)", report.kind, report.transitions.len());
    for transition in &report.transitions {
        println!("   {:>8}  {}", secs(transition.at), transition.phase);
    }
    if report.interrupted {
        println!("   Interrupted after {}", secs(report.elapsed));
    }
    restore(&report.restore);
}

pub fn window_opened(opened: &FaultWindow) {
    println!("🔻 Applied {}", window(opened));
}

pub fn network_status(status: &NetworkStatus) {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("📊 Server running: {}", yes_no(status.service_running));
    println!("   Responding:     {}", yes_no(status.responding));
    let active = status.state.active_flags();
    if active.is_empty() {
        println!("   No faults applied by this session");
    } else {
        for flag in active {
            println!("   Active: {flag}");
        }
    }
}

pub fn load(report: &LoadReport) {
    let icon = match report.outcome {
        TransactionOutcome::Committed => "✅",
        TransactionOutcome::CommittedEarly => "⏹️ ",
        TransactionOutcome::RolledBack => "↩️ ",
    };
    println!(
        "{icon} {} on {}: {:?} after {}",
        report.job.kind,
        report.job.target_table,
        report.outcome,
        secs(report.elapsed)
    );
    println!(
        "   Rows: {}  Operations: {}",
        report.job.rows_applied, report.job.operations_applied
    );
}

pub fn generated(report: &GenerateReport) {
    println!(
        "✅ Inserted {} record(s) into {} in {} batch(es)",
        report.records_inserted, report.table, report.batches
    );
    println!("   Total records: {}", report.total_records);
}

pub fn schema(outcomes: &[SchemaChangeOutcome]) {
    for outcome in outcomes {
        match outcome {
            SchemaChangeOutcome::ColumnAdded {
                table,
                column,
                column_type,
            } => println!("➕ {table}.{column} {column_type}"),
            SchemaChangeOutcome::ColumnDropped { table, column } => {
                println!("➖ {table}.{column}");
            },
            SchemaChangeOutcome::ColumnAltered {
                table,
                column,
                from_type,
                to_type,
            } => println!("✏️  {table}.{column} {from_type} -> {to_type}"),
            SchemaChangeOutcome::TableCreated { table, seeded_rows } => {
                println!("🆕 {table} ({seeded_rows} rows)");
            },
            SchemaChangeOutcome::TableDropped { table } => println!("🗑️  {table}"),
            SchemaChangeOutcome::Skipped { reason } => println!("⚠️  Skipped: {reason}"),
        }
    }
}

pub fn lag(report: &LagReport) {
    println!(
        "🐢 {} delayed update(s) in {}{}",
        report.operations,
        secs(report.elapsed),
        if report.interrupted { " (interrupted)" } else { "" }
    );
}

pub fn scenario(report: &ScenarioReport) {
    println!(
        "Before: {} @ {}  GTID: {}",
        report.before.file, report.before.position, report.before.gtid
    );
    println!(
        "After:  {} @ {}  GTID: {}",
        report.after.file, report.after.position, report.after.gtid
    );
    println!(
        "   {} row(s), {} flush(es), rotated: {}",
        report.rows_inserted,
        report.flushes,
        report.rotated()
    );
}

pub fn snapshot(snapshot: &BinlogSnapshot) {
    println!("📊 {}", snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"));
    match &snapshot.status {
        Some(status) => {
            println!("   Binlog:  {} @ {}", status.file, status.position);
            if !status.gtid.is_empty() {
                println!("   GTID:    {}", status.gtid);
            }
        },
        None => println!("   Binary logging disabled"),
    }
    println!(
        "   Files:   {} ({})",
        snapshot.files.len(),
        snapshot.total_size_human
    );
    println!("   Records: {} in {}", snapshot.records, snapshot.table);
}
