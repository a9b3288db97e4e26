//! Binlog corruption strategies and their outcomes
//!
//! Corruption never parses binlog events. Every strategy is a plain byte
//! range operation that leaves a structurally invalid file behind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::TruncatePercentage;

/// Leading bytes that random-byte injection never touches
pub const HEADER_RESERVED_BYTES: u64 = 100;

/// Length of the binlog magic number at the start of every segment
pub const MAGIC_NUMBER_LEN: usize = 4;

/// Magic number of a MySQL binlog segment (`\xfebin`)
pub const BINLOG_MAGIC: [u8; MAGIC_NUMBER_LEN] = [0xfe, 0x62, 0x69, 0x6e];

/// How a binlog file is mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CorruptionStrategy {
    /// Cut the file down to a percentage of its size
    Truncate {
        /// Share of the file that survives
        percentage: TruncatePercentage,
    },
    /// Overwrite random bytes past the reserved header
    RandomBytes {
        /// Number of positions drawn (duplicates allowed)
        count: u32,
    },
    /// Zero the 4-byte magic number
    MagicNumber,
}

impl CorruptionStrategy {
    /// Stable kebab-case name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Truncate { .. } => "truncate",
            Self::RandomBytes { .. } => "random-bytes",
            Self::MagicNumber => "magic-number",
        }
    }
}

impl fmt::Display for CorruptionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncate { percentage } => write!(f, "truncate to {percentage}"),
            Self::RandomBytes { count } => write!(f, "inject {count} random bytes"),
            Self::MagicNumber => f.write_str("zero magic number"),
        }
    }
}

/// Measurable before/after state of an applied corruption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CorruptionOutcome {
    /// File was truncated in place
    Truncated {
        /// Size before truncation
        original_size: u64,
        /// Size after truncation
        new_size: u64,
    },
    /// Random bytes were written
    BytesInjected {
        /// Size of the file (unchanged)
        file_size: u64,
        /// Offsets written, in the order they were drawn
        offsets: Vec<u64>,
    },
    /// Magic number was zeroed
    MagicNumberCorrupted {
        /// Hex encoding of the bytes that were overwritten
        original_hex: String,
    },
    /// The file was left untouched
    Skipped {
        /// Why the strategy could not be applied
        reason: String,
    },
}

impl CorruptionOutcome {
    /// Whether the file was left untouched
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names() {
        let truncate = CorruptionStrategy::Truncate {
            percentage: TruncatePercentage::default(),
        };
        assert_eq!(truncate.name(), "truncate");
        assert_eq!(
            CorruptionStrategy::RandomBytes { count: 3 }.name(),
            "random-bytes"
        );
        assert_eq!(CorruptionStrategy::MagicNumber.name(), "magic-number");
    }

    #[test]
    fn strategy_display() {
        assert_eq!(
            CorruptionStrategy::RandomBytes { count: 10 }.to_string(),
            "inject 10 random bytes"
        );
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = CorruptionOutcome::Truncated {
            original_size: 1000,
            new_size: 500,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "truncated");
        assert_eq!(json["new_size"], 500);
    }

    #[test]
    fn skipped_outcome() {
        let outcome = CorruptionOutcome::Skipped {
            reason: "file too small".to_string(),
        };
        assert!(outcome.is_skipped());
        assert!(!CorruptionOutcome::MagicNumberCorrupted {
            original_hex: "fe62696e".to_string()
        }
        .is_skipped());
    }
}
