//! Port definitions for application layer
//!
//! Ports are interfaces that define how the fault injection engine reaches
//! the database, its process, the host network stack and the filesystem.
//! Adapters in the infrastructure layer implement these ports.

mod binlog_store_port;
mod database_port;
mod database_process_port;
mod traffic_control_port;

#[cfg(test)]
pub use binlog_store_port::MockBinlogStorePort;
pub use binlog_store_port::{BinlogStorePort, StoredFile};
pub use database_port::{DatabasePort, TransactionPort};
#[cfg(test)]
pub use database_port::{MockDatabasePort, MockTransactionPort};
#[cfg(test)]
pub use database_process_port::MockDatabaseProcessPort;
pub use database_process_port::DatabaseProcessPort;
#[cfg(test)]
pub use traffic_control_port::MockTrafficControlPort;
pub use traffic_control_port::TrafficControlPort;
