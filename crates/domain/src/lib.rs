//! Domain layer for binlog-chaos
//!
//! Contains the fault vocabulary shared by every layer: binlog files and
//! backups, corruption strategies, network fault state, and transactional
//! load jobs. This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
