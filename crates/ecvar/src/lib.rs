//! # ECVAR - Console Variable Layer
//!
//! ECVAR is the settings subsystem of a game engine: named, typed,
//! flag-qualified variables with write-time policy and synchronous
//! propagation to interested subsystems.
//!
//! ## Overview
//!
//! - **Four concrete kinds** (bool / int / float / string) with total
//!   conversions between all of them, plus two derived kinds: **color**
//!   (packed RGB with a palette-index cache) and **flag** (a bit view over
//!   a host integer cvar, storage-free)
//! - **Write policy**: protection (NOSET), deferral until a game restart
//!   (LATCH), and network arbitration (SERVERINFO), evaluated in that
//!   order; rejections are outcomes, never errors, and the value is
//!   observably unchanged
//! - **Persistence**: sectioned `key "value"` config files with exact-mask
//!   category filters; unknown keys become placeholders absorbed by later
//!   registration
//! - **Network sync**: backslash-delimited full and compact positional
//!   layouts, with desync detection on compact decode
//!
//! ## Quick Start
//!
//! ```rust
//! use ecvar::{CvarFlags, CvarSet, CvarValue, SetOutcome};
//!
//! let mut cvars = CvarSet::new();
//! cvars
//!     .register("sv_gravity", CvarValue::Float(800.0), CvarFlags::SERVERINFO, None)
//!     .unwrap();
//!
//! let outcome = cvars
//!     .set_generic("sv_gravity", CvarValue::String("600".into()))
//!     .unwrap();
//! assert_eq!(outcome, SetOutcome::Applied);
//! assert_eq!(cvars.get("sv_gravity").unwrap().value(), &CvarValue::Float(600.0));
//! ```
//!
//! ## Modules
//!
//! - [`value`]: typed values and the total conversion family
//! - [`cvar`]: one variable - flags, default, latch slot, callback
//! - [`set`]: the registry, the policy gate, and the policy context
//! - [`color`] / [`flag`]: the derived kinds
//! - [`archive`]: config file persistence
//! - [`netsync`]: the demo/netgame wire codec
//! - [`console`]: string-level primitives for a command dispatcher
//! - [`error`]: error types
//!
//! The set is an injected context, not a process global; tests and tools
//! construct as many as they need.

pub mod archive;
pub mod color;
pub mod console;
pub mod cvar;
pub mod error;
pub mod flag;
pub mod netsync;
pub mod set;
pub mod value;

// Re-export main types for convenience
pub use cvar::{ChangeCallback, Cvar, CvarFlags};
pub use error::{CvarError, Result};
pub use flag::FlagCvar;
pub use set::{CvarSet, GameState, NetArbitration, SetOutcome};
pub use value::{CvarKind, CvarValue};

/// ECVAR version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
