//! Error Module - Cvar Layer Error Types
//!
//! Errors cover API misuse and decode failures. Policy rejections are
//! deliberately *not* errors: `set_generic` reports those through
//! [`SetOutcome`](crate::set::SetOutcome) and leaves the value unchanged.

use thiserror::Error;

/// Main error type for cvar operations
#[derive(Debug, Error)]
pub enum CvarError {
    /// No cvar registered under this name
    #[error("Unknown cvar '{0}'")]
    NotFound(String),

    /// A non-placeholder cvar of this name already exists
    #[error("Cvar '{0}' is already registered")]
    AlreadyExists(String),

    /// `unset` on a cvar without the UNSETTABLE or AUTO flag
    #[error("Cvar '{0}' cannot be unset")]
    NotUnsettable(String),

    /// Color string was not a hex triplet, `#rrggbb`, or a known name
    #[error("Cannot parse '{0}' as a color")]
    BadColor(String),

    /// Compact sync stream disagrees with the locally computed cvar list
    ///
    /// Compact entries are positional; a count mismatch means the two ends
    /// do not agree on the filtered cvar set and nothing can be applied.
    #[error("Compact cvar stream carries {got} values, local list has {expected}")]
    NetDesync { expected: usize, got: usize },

    /// Malformed sync stream or config line
    #[error("Parse error: {0}")]
    Parse(String),

    /// Config file I/O failure
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cvar operations
pub type Result<T> = std::result::Result<T, CvarError>;
