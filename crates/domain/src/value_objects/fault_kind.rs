//! Fault kind value object
//!
//! Selects how the database is made unavailable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

/// The way a "bring down" makes the database unavailable
///
/// REJECT exercises fast-fail client logic, DROP (`Timeout`) exercises
/// timeout and retry logic, `Service` stops the database process itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FaultKind {
    /// Stop the database process
    Service,
    /// Actively refuse new connections (TCP reset)
    #[default]
    Reject,
    /// Silently drop packets so clients time out
    Timeout,
}

impl FaultKind {
    /// The fault category this kind belongs to
    #[must_use]
    pub const fn category(self) -> FaultCategory {
        match self {
            Self::Service => FaultCategory::ServiceAvailability,
            Self::Reject | Self::Timeout => FaultCategory::Reachability,
        }
    }

    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Reject => "reject",
            Self::Timeout => "timeout",
        }
    }

    /// All fault kinds
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Service, Self::Reject, Self::Timeout]
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "service" => Ok(Self::Service),
            "reject" => Ok(Self::Reject),
            "timeout" | "drop" => Ok(Self::Timeout),
            _ => Err(DomainError::Unrecognized {
                kind: "fault kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Orthogonal axes along which faults are injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    /// Database process running or stopped
    ServiceAvailability,
    /// Packets to the database port refused or dropped
    Reachability,
    /// Artificial delay on the primary interface
    Latency,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("service".parse::<FaultKind>().unwrap(), FaultKind::Service);
        assert_eq!("REJECT".parse::<FaultKind>().unwrap(), FaultKind::Reject);
        assert_eq!("timeout".parse::<FaultKind>().unwrap(), FaultKind::Timeout);
        assert_eq!("drop".parse::<FaultKind>().unwrap(), FaultKind::Timeout);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!("flood".parse::<FaultKind>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for kind in FaultKind::all() {
            assert_eq!(kind.to_string().parse::<FaultKind>().unwrap(), kind);
        }
    }

    #[test]
    fn categories() {
        assert_eq!(
            FaultKind::Service.category(),
            FaultCategory::ServiceAvailability
        );
        assert_eq!(FaultKind::Reject.category(), FaultCategory::Reachability);
        assert_eq!(FaultKind::Timeout.category(), FaultCategory::Reachability);
    }

    #[test]
    fn default_is_reject() {
        assert_eq!(FaultKind::default(), FaultKind::Reject);
    }
}
