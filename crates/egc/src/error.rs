//! Error Module - Object Heap Error Types
//!
//! Errors here cover API misuse detectable at the heap boundary: stale
//! handles, class mismatches on typed access, and invalid root requests.
//!
//! The collector's hot paths (marking, sweeping, the destruction drain) do
//! not return per-call errors. Internal invariant violations are programmer
//! errors and abort via panic with a diagnostic, the same way duplicate
//! class registration does.

use thiserror::Error;

/// Main error type for object heap operations
#[derive(Debug, Error)]
pub enum HeapError {
    /// Handle does not name an occupied directory slot
    ///
    /// **When returned:** the object was destroyed and finalized, or the
    /// handle was never valid for this heap.
    #[error("Unknown object handle: index {0}")]
    UnknownHandle(u32),

    /// Handle names an object already queued for destruction
    ///
    /// **When returned:** typed access or rooting was attempted between
    /// `destroy()` and the end-of-frame drain.
    #[error("Object at index {0} is pending destruction")]
    PendingDestruction(u32),

    /// Typed access with the wrong concrete type
    #[error("Class mismatch: object at index {index} is a {actual}")]
    ClassMismatch { index: u32, actual: &'static str },

    /// Object's class name was never registered with the type registry
    #[error("Class '{0}' is not registered")]
    UnregisteredClass(String),

    /// Invalid GC tuning parameters
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for object heap operations
pub type Result<T> = std::result::Result<T, HeapError>;
