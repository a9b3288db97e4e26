//! Network and service fault state
//!
//! Fault state is a set of independent flags, one per thing that can be
//! broken. Every restore operation clears an explicit set of flags.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{FaultCategory, FaultKind};

/// One independently reversible fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultFlag {
    /// The database process is stopped
    ServiceDown,
    /// A REJECT rule is installed for the database port
    RejectActive,
    /// A DROP rule is installed for the database port
    DropActive,
    /// A delay discipline is installed on the primary interface
    LatencyActive,
}

impl FaultFlag {
    /// Every flag, in the order a full bring-up clears them
    pub const ALL: [Self; 4] = [
        Self::ServiceDown,
        Self::RejectActive,
        Self::DropActive,
        Self::LatencyActive,
    ];

    /// Flags cleared when the firewall is flushed
    pub const FIREWALL: [Self; 2] = [Self::RejectActive, Self::DropActive];

    /// Flag raised by bringing the database down with `kind`
    #[must_use]
    pub const fn raised_by(kind: FaultKind) -> Self {
        match kind {
            FaultKind::Service => Self::ServiceDown,
            FaultKind::Reject => Self::RejectActive,
            FaultKind::Timeout => Self::DropActive,
        }
    }

    /// Flags cleared by the partial restore symmetric to `kind`
    ///
    /// Service faults restart the process; reachability faults flush the
    /// firewall, which removes both REJECT and DROP rules.
    #[must_use]
    pub const fn restored_by(kind: FaultKind) -> &'static [Self] {
        match kind {
            FaultKind::Service => &[Self::ServiceDown],
            FaultKind::Reject | FaultKind::Timeout => &Self::FIREWALL,
        }
    }

    /// Category this flag belongs to
    #[must_use]
    pub const fn category(self) -> FaultCategory {
        match self {
            Self::ServiceDown => FaultCategory::ServiceAvailability,
            Self::RejectActive | Self::DropActive => FaultCategory::Reachability,
            Self::LatencyActive => FaultCategory::Latency,
        }
    }
}

impl fmt::Display for FaultFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ServiceDown => "service-down",
            Self::RejectActive => "reject-active",
            Self::DropActive => "drop-active",
            Self::LatencyActive => "latency-active",
        })
    }
}

/// What a fault acts on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FaultTarget {
    /// The database process
    Process,
    /// A TCP port
    Port(u16),
    /// A network interface with the delay applied in milliseconds
    Interface { name: String, latency_ms: u32 },
}

impl fmt::Display for FaultTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process => f.write_str("database process"),
            Self::Port(port) => write!(f, "port {port}"),
            Self::Interface { name, latency_ms } => write!(f, "{name} (+{latency_ms}ms)"),
        }
    }
}

/// An active fault, from the moment it was applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultWindow {
    /// Which fault is active
    pub flag: FaultFlag,
    /// What it acts on
    pub target: FaultTarget,
    /// When it was applied
    pub started_at: DateTime<Utc>,
    /// Planned length, if the fault restores itself
    pub duration: Option<Duration>,
}

impl FaultWindow {
    /// Open a window starting now
    #[must_use]
    pub fn open(flag: FaultFlag, target: FaultTarget) -> Self {
        Self {
            flag,
            target,
            started_at: Utc::now(),
            duration: None,
        }
    }

    /// Set the planned length of the window
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Faults currently applied, as seen by this process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultState {
    active: BTreeMap<FaultFlag, FaultWindow>,
}

impl FaultState {
    /// Create an empty (fully up) state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fault, returning the window it replaced
    pub fn activate(&mut self, window: FaultWindow) -> Option<FaultWindow> {
        self.active.insert(window.flag, window)
    }

    /// Clear `flags`, returning the windows that were active
    pub fn clear(&mut self, flags: &[FaultFlag]) -> Vec<FaultWindow> {
        flags
            .iter()
            .filter_map(|flag| self.active.remove(flag))
            .collect()
    }

    /// Whether `flag` is active
    #[must_use]
    pub fn is_active(&self, flag: FaultFlag) -> bool {
        self.active.contains_key(&flag)
    }

    /// Active window for `flag`
    #[must_use]
    pub fn window(&self, flag: FaultFlag) -> Option<&FaultWindow> {
        self.active.get(&flag)
    }

    /// All active flags, in flag order
    #[must_use]
    pub fn active_flags(&self) -> Vec<FaultFlag> {
        self.active.keys().copied().collect()
    }

    /// Whether no fault is active
    #[must_use]
    pub fn is_fully_up(&self) -> bool {
        self.active.is_empty()
    }
}

/// Phase of a flap cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlapPhase {
    /// Fault applied
    Down,
    /// Fault reversed
    Up,
}

impl FlapPhase {
    /// The other phase
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
        }
    }
}

impl fmt::Display for FlapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => f.write_str("DOWN"),
            Self::Up => f.write_str("UP"),
        }
    }
}

/// A phase change during a flap cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlapTransition {
    /// Phase entered
    pub phase: FlapPhase,
    /// Time since the cycle started
    pub at: Duration,
}
