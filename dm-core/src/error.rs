//! Error classification shared by every subsystem.
//!
//! Each module owns its own error enum; `ErrorKind` is the coarse category a
//! caller uses to decide how to present a failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Out-of-range or malformed input. Rejected before any mutation.
    InvalidInput,
    /// A required resource (catalog pool, rooms) is missing. Nothing is applied.
    ResourceUnavailable,
    /// A referenced combatant, ailment or room does not exist.
    NotFound,
    /// The operation would break a uniqueness rule.
    Conflict,
    /// Save/load/export I/O failed. In-memory state is untouched.
    PersistenceFailure,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::ResourceUnavailable => "resource unavailable",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PersistenceFailure => "persistence failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_name() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not found");
        assert_eq!(ErrorKind::PersistenceFailure.to_string(), "persistence failure");
    }
}
