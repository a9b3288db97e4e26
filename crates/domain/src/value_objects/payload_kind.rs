//! Payload kind for large-row inserts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

/// Column type a large payload is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// Character data stored in a LONGTEXT column
    #[default]
    Text,
    /// Hex-encoded binary stored in a LONGBLOB column via `UNHEX`
    Blob,
}

impl PayloadKind {
    /// Column of the large-data table receiving this payload
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Text => "data_text",
            Self::Blob => "data_blob",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Blob => f.write_str("blob"),
        }
    }
}

impl FromStr for PayloadKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "blob" => Ok(Self::Blob),
            _ => Err(DomainError::Unrecognized {
                kind: "payload kind",
                value: s.to_string(),
            }),
        }
    }
}
