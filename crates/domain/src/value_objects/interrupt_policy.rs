//! What a transactional load operation does when it is interrupted

use serde::{Deserialize, Serialize};

/// Exit-path contract of a load operation
///
/// Every load operation declares one of these. Failures (database errors)
/// always roll back; the policy decides what an external interrupt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptPolicy {
    /// Discard all work done so far
    RollbackOnInterrupt,
    /// Keep the work done so far and commit immediately
    CommitOnInterrupt,
}

impl InterruptPolicy {
    /// Whether an interrupted transaction is committed
    #[must_use]
    pub const fn commits_on_interrupt(self) -> bool {
        matches!(self, Self::CommitOnInterrupt)
    }
}
