//! Error handling module for the emt CLI.

use thiserror::Error;

/// Main error type for the emt CLI application
#[derive(Error, Debug)]
pub enum EmtError {
    /// A cvar operation failed (unknown name, bad value, file problems)
    #[error(transparent)]
    Cvar(#[from] ecvar::CvarError),

    /// The write was gated by policy and not applied
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// No class of this name in the demo registry
    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    /// Error when IO operations fail
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when logging setup fails
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using EmtError
pub type Result<T> = std::result::Result<T, EmtError>;
