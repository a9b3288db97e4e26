//! Application services - Fault injection use cases

mod binlog_monitor;
mod corruption_service;
mod load_generator;
mod network_fault_controller;
mod record_synthesizer;
mod replication_scenarios;
mod schema_churn_service;

pub use binlog_monitor::{BinlogMonitor, BinlogSnapshot, format_size};
pub use corruption_service::{
    CorruptionConfig, CorruptionReport, CorruptionService, RestoredBackup,
};
pub use load_generator::{GenerateReport, LoadConfig, LoadGenerator, LoadReport};
pub use network_fault_controller::{
    DEFAULT_DATABASE_PORT, DownReport, FaultEnvironment, FlapReport, NetworkFaultConfig,
    NetworkFaultController, NetworkStatus, RestoreReport, ServiceStart, ServiceStop,
    TimedFaultReport,
};
pub use record_synthesizer::{RecordSynthesizer, SyntheticUser};
pub use replication_scenarios::{LagReport, ReplicationScenarioService, ScenarioReport};
pub use schema_churn_service::{CHURN_COLUMN_PREFIX, CHURN_TABLE_PREFIX, SchemaChurnService};
