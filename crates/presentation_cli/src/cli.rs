//! Command-line grammar

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use domain::{FaultKind, PayloadKind, SchemaChange};

/// Binlog and replication fault injection for MySQL test environments
#[derive(Debug, Parser)]
#[command(name = "binlog-chaos")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ./binlog-chaos.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Seed for reproducible offsets, byte values and synthetic records
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Back up and corrupt a binlog file
    Corrupt(CorruptArgs),

    /// Restore binlog files from backups
    Restore(RestoreArgs),

    /// Make the database unreachable or slow
    #[command(subcommand)]
    Network(NetworkCommand),

    /// Run transactional load
    #[command(subcommand)]
    Transaction(TransactionCommand),

    /// Insert synthetic users, optionally on a timer
    Generate {
        /// Rows per batch
        #[arg(short = 'n', long, default_value_t = 100)]
        count: u64,

        /// Target table (default: the configured users table)
        #[arg(short, long)]
        table: Option<String>,

        /// Seconds between batches; 0 inserts a single batch
        #[arg(short, long, default_value_t = 0)]
        interval: u64,
    },

    /// Apply schema changes
    Schema {
        /// add-column, drop-column, alter-column, create-table or drop-table
        change: SchemaChange,

        /// Table for column changes (default: the configured users table)
        #[arg(short, long)]
        table: Option<String>,

        /// How many times to apply the change
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },

    /// Replication stress scenarios
    #[command(subcommand)]
    Replicate(ReplicateCommand),

    /// Show binlog position, files and record count
    Monitor {
        /// Seconds between snapshots
        #[arg(short, long, default_value_t = 5)]
        interval: u64,

        /// Take a single snapshot and exit
        #[arg(long)]
        once: bool,
    },
}

#[derive(Debug, Args)]
pub struct CorruptArgs {
    /// Binlog file name or path (default: the file the server is writing)
    #[arg(short, long, global = true)]
    pub file: Option<String>,

    /// Skip the backup copy
    #[arg(long, global = true)]
    pub no_backup: bool,

    #[command(subcommand)]
    pub strategy: CorruptStrategy,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CorruptStrategy {
    /// Cut the file down to a percentage of its size
    Truncate {
        /// Share of the file to keep (1-100)
        #[arg(short, long, default_value_t = 50)]
        percentage: u8,
    },

    /// Overwrite random bytes past the header
    RandomBytes {
        /// Number of positions to overwrite
        #[arg(short = 'n', long, default_value_t = 10)]
        count: u32,
    },

    /// Zero the 4-byte magic number
    Magic,
}

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Backup to restore, by partial name or path
    #[arg(conflicts_with_all = ["all", "list"])]
    pub backup: Option<String>,

    /// Restore every backup to its origin
    #[arg(long)]
    pub all: bool,

    /// List available backups
    #[arg(long)]
    pub list: bool,

    /// Restore to this path instead of the original location
    #[arg(long, requires = "backup")]
    pub target: Option<PathBuf>,

    /// Flush binary logs afterwards to start a fresh segment
    #[arg(long)]
    pub flush: bool,
}

#[derive(Debug, Subcommand)]
pub enum NetworkCommand {
    /// Apply a fault and leave it in place
    Down {
        /// service, reject or timeout
        kind: FaultKind,
    },

    /// Undo one kind of fault
    Restore {
        /// service, reject or timeout
        kind: FaultKind,
    },

    /// Clear every fault: start the server, flush rules, remove latency
    Up,

    /// Apply a fault for a fixed time, then restore it
    Timed {
        /// service, reject or timeout
        kind: FaultKind,

        /// Seconds to hold the fault
        #[arg(short, long, default_value_t = 60)]
        duration: u64,
    },

    /// Toggle a fault on and off
    Flap {
        /// service, reject or timeout
        kind: FaultKind,

        /// Seconds per phase (default: configured flap interval)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Total seconds (default: configured flap duration)
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Delay traffic on the database interface
    Latency {
        /// Added delay in milliseconds (default: configured latency)
        ms: Option<u32>,
    },

    /// Remove injected latency
    ClearLatency,

    /// Show server reachability
    Status,
}

#[derive(Debug, Subcommand)]
pub enum TransactionCommand {
    /// Insert many rows in one transaction
    Bulk {
        /// Total rows
        #[arg(short, long, default_value_t = 10_000)]
        rows: u64,

        /// Rows per INSERT (default: configured batch size)
        #[arg(short, long)]
        batch_size: Option<u64>,
    },

    /// Insert large text or blob payloads in one transaction
    Large {
        /// Rows to insert
        #[arg(short, long, default_value_t = 100)]
        rows: u64,

        /// Payload size per row in KiB
        #[arg(short, long, default_value_t = 1024)]
        size_kb: u64,

        /// text or blob
        #[arg(short, long, default_value = "text")]
        kind: PayloadKind,
    },

    /// Keep a transaction open while updating at a fixed rate
    Hold {
        /// Seconds to keep the transaction open
        #[arg(short, long, default_value_t = 60)]
        duration: u64,

        /// Updates per second
        #[arg(short, long, default_value_t = 1)]
        ops: u32,
    },

    /// Large payloads, then hold the transaction open
    Mixed {
        /// Rows to insert
        #[arg(short, long, default_value_t = 100)]
        rows: u64,

        /// Payload size per row in KiB
        #[arg(short, long, default_value_t = 1024)]
        size_kb: u64,

        /// Minimum seconds the transaction stays open
        #[arg(short, long, default_value_t = 30)]
        duration: u64,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReplicateCommand {
    /// Update the meta row with random pauses
    Lag {
        /// Seconds to run
        #[arg(short, long, default_value_t = 60)]
        duration: u64,

        /// Shortest pause in milliseconds
        #[arg(long, default_value_t = 500)]
        min_delay_ms: u64,

        /// Longest pause in milliseconds
        #[arg(long, default_value_t = 2000)]
        max_delay_ms: u64,
    },

    /// Rotate the binlog around a burst of inserts
    Disconnect,

    /// Insert rows and rotate so the executed GTID set jumps
    GtidGap,
}
