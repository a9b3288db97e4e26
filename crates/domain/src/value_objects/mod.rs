//! Value Objects - Immutable, identity-less domain primitives

mod fault_kind;
mod interrupt_policy;
mod payload_kind;
mod truncate_percentage;

pub use fault_kind::{FaultCategory, FaultKind};
pub use interrupt_policy::InterruptPolicy;
pub use payload_kind::PayloadKind;
pub use truncate_percentage::TruncatePercentage;
