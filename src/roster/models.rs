use serde::{Deserialize, Serialize};

/// One participant row of an uploaded roster
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RosterRecord {
    pub name: String,
    pub email: String,
    pub hour: String,
    /// Empty when the roster left the column blank
    #[serde(default)]
    pub college: String,
}

/// A single row-level problem found while ingesting a roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    InvalidEmail {
        line: usize,
        value: String,
    },
    DuplicatePair {
        line: usize,
        name: String,
        email: String,
    },
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InvalidEmail { .. } => "invalid_email",
            ValidationError::DuplicatePair { .. } => "duplicate_pair",
        }
    }
}
