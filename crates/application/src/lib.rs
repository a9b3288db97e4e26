//! Application layer - Fault injection use cases
//!
//! Contains the fault injection engine (binlog corruption, network faults,
//! transactional load) and the port definitions it drives. Adapters in the
//! infrastructure layer implement the ports.

pub mod error;
pub mod interrupt;
pub mod ports;
pub mod services;
#[cfg(test)]
pub(crate) mod testing;

pub use error::{ApplicationError, ErrorKind};
pub use interrupt::{InterruptHandle, InterruptSignal};
pub use ports::*;
pub use services::*;
