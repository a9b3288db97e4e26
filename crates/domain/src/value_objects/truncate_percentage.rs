//! Truncation percentage value object
//!
//! Represents how much of a binlog file survives a truncation (1-100%).
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::TruncatePercentage;
//!
//! let half = TruncatePercentage::new(50).expect("valid percentage");
//! assert_eq!(half.apply(1000), 500);
//!
//! assert!(TruncatePercentage::new(0).is_err());
//! assert!(TruncatePercentage::new(101).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;

/// Share of the original file size kept by a truncation, in `1..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TruncatePercentage(u8);

impl TruncatePercentage {
    /// Smallest accepted percentage
    pub const MIN: u8 = 1;
    /// Largest accepted percentage (keeps the whole file)
    pub const MAX: u8 = 100;

    /// Create a new validated percentage
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` if the value is outside `1..=100`.
    pub fn new(value: u8) -> Result<Self, DomainError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::invalid(format!(
                "truncate percentage must be within {}..={}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Get the percentage as a u8
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Size a file of `original_size` bytes has after truncation
    ///
    /// Computes `floor(original_size * percentage / 100)` without overflowing.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn apply(self, original_size: u64) -> u64 {
        (original_size as u128 * self.0 as u128 / 100) as u64
    }
}

impl Default for TruncatePercentage {
    fn default() -> Self {
        Self(50)
    }
}

impl fmt::Display for TruncatePercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for TruncatePercentage {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TruncatePercentage> for u8 {
    fn from(p: TruncatePercentage) -> Self {
        p.0
    }
}

/// Custom deserialization that validates the percentage range
impl<'de> Deserialize<'de> for TruncatePercentage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}
