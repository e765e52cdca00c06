//! Cvar Module - One Console Variable
//!
//! A [`Cvar`] owns its current value, its default, an optional latched
//! value waiting for the next qualifying game-state transition, and the
//! flag word that drives write policy, archiving and sync. Policy itself
//! lives in [`crate::set`]; this module is the storage.

use std::ops::{BitAnd, BitOr, BitOrAssign};

use crate::error::Result;
use crate::value::{CvarKind, CvarValue};

/// Cvar flag word
///
/// Behavior flags are set at registration; `IS_DEFAULT` is bookkeeping,
/// cleared by any successful write and restored by an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CvarFlags(u32);

impl CvarFlags {
    pub const NONE: CvarFlags = CvarFlags(0);
    /// Persisted to the config file
    pub const ARCHIVE: CvarFlags = CvarFlags(1);
    /// Broadcast through the user-info notification sink on change
    pub const USERINFO: CvarFlags = CvarFlags(2);
    /// Writable only by the network arbitrator while a session is active
    pub const SERVERINFO: CvarFlags = CvarFlags(4);
    /// Write-protected while protection is enabled
    pub const NOSET: CvarFlags = CvarFlags(8);
    /// Writes mid-game are deferred to the next qualifying transition
    pub const LATCH: CvarFlags = CvarFlags(16);
    /// May be removed with `unset`
    pub const UNSETTABLE: CvarFlags = CvarFlags(32);
    /// Placeholder auto-created by config load or net sync
    pub const AUTO: CvarFlags = CvarFlags(128);
    /// Archived to the global section rather than the per-game one
    pub const GLOBAL_CONFIG: CvarFlags = CvarFlags(256);
    /// Current value equals the default (bookkeeping)
    pub const IS_DEFAULT: CvarFlags = CvarFlags(512);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        CvarFlags(bits)
    }

    /// All of `other`'s bits present?
    #[inline]
    pub const fn contains(self, other: CvarFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any of `other`'s bits present?
    #[inline]
    pub const fn intersects(self, other: CvarFlags) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn without(self, other: CvarFlags) -> Self {
        CvarFlags(self.0 & !other.0)
    }

    /// Flag letters for `cvarlist` output, dash for unset positions
    pub fn letters(self) -> String {
        const LEGEND: [(CvarFlags, char); 6] = [
            (CvarFlags::ARCHIVE, 'A'),
            (CvarFlags::USERINFO, 'U'),
            (CvarFlags::SERVERINFO, 'S'),
            (CvarFlags::NOSET, 'N'),
            (CvarFlags::LATCH, 'L'),
            (CvarFlags::UNSETTABLE, 'X'),
        ];
        LEGEND
            .iter()
            .map(|&(f, c)| if self.contains(f) { c } else { '-' })
            .collect()
    }
}

impl BitOr for CvarFlags {
    type Output = CvarFlags;
    fn bitor(self, rhs: CvarFlags) -> CvarFlags {
        CvarFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CvarFlags {
    fn bitor_assign(&mut self, rhs: CvarFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CvarFlags {
    type Output = CvarFlags;
    fn bitand(self, rhs: CvarFlags) -> CvarFlags {
        CvarFlags(self.0 & rhs.0)
    }
}

/// Synchronous change notification, fired by accepted writes when
/// callbacks are globally enabled
pub type ChangeCallback = fn(name: &str, value: &CvarValue);

/// One registered console variable
pub struct Cvar {
    name: String,
    flags: CvarFlags,
    kind: CvarKind,
    value: CvarValue,
    default: CvarValue,
    /// Write deferred by LATCH policy, applied by `unlatch`
    latched: Option<CvarValue>,
    callback: Option<ChangeCallback>,
    /// Color cvars parse strings through the color grammar and keep a
    /// palette-index cache beside the packed RGB value
    is_color: bool,
    palette_index: Option<i32>,
}

impl Cvar {
    pub(crate) fn new(
        name: &str,
        default: CvarValue,
        flags: CvarFlags,
        callback: Option<ChangeCallback>,
    ) -> Self {
        Self {
            name: name.to_string(),
            flags: flags | CvarFlags::IS_DEFAULT,
            kind: default.kind(),
            value: default.clone(),
            default,
            latched: None,
            callback,
            is_color: false,
            palette_index: None,
        }
    }

    pub(crate) fn new_color(
        name: &str,
        default_rgb: i32,
        flags: CvarFlags,
        callback: Option<ChangeCallback>,
    ) -> Self {
        let mut cvar = Self::new(name, CvarValue::Int(default_rgb), flags, callback);
        cvar.is_color = true;
        cvar
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn flags(&self) -> CvarFlags {
        self.flags
    }

    #[inline]
    pub fn kind(&self) -> CvarKind {
        self.kind
    }

    /// Current effective value (latched writes are not visible here)
    #[inline]
    pub fn value(&self) -> &CvarValue {
        &self.value
    }

    #[inline]
    pub fn default_value(&self) -> &CvarValue {
        &self.default
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.flags.contains(CvarFlags::IS_DEFAULT)
    }

    #[inline]
    pub fn latched(&self) -> Option<&CvarValue> {
        self.latched.as_ref()
    }

    #[inline]
    pub fn is_color(&self) -> bool {
        self.is_color
    }

    #[inline]
    pub fn palette_index(&self) -> Option<i32> {
        self.palette_index
    }

    pub(crate) fn set_palette_index(&mut self, index: Option<i32>) {
        self.palette_index = index;
    }

    pub(crate) fn callback(&self) -> Option<ChangeCallback> {
        self.callback
    }

    pub(crate) fn set_latched(&mut self, value: Option<CvarValue>) {
        self.latched = value;
    }

    pub(crate) fn take_latched(&mut self) -> Option<CvarValue> {
        self.latched.take()
    }

    /// Re-express an incoming value as this cvar's declared kind. Color
    /// cvars route strings through the color grammar.
    pub(crate) fn coerce_incoming(&self, value: &CvarValue) -> Result<CvarValue> {
        if self.is_color {
            if let CvarValue::String(s) = value {
                let rgb = crate::color::parse_color(s)?;
                return Ok(CvarValue::Int(rgb as i32));
            }
        }
        Ok(value.coerced_to(self.kind))
    }

    /// Unconditional apply; policy and notification are the set's job
    pub(crate) fn apply(&mut self, value: CvarValue) {
        self.value = value;
        self.flags = self.flags.without(CvarFlags::IS_DEFAULT);
    }

    pub(crate) fn restore_default(&mut self) {
        self.value = self.default.clone();
        self.flags |= CvarFlags::IS_DEFAULT;
    }

    /// Display form; color cvars render as a `"rr gg bb"` triplet
    pub fn value_string(&self) -> String {
        if self.is_color {
            crate::color::format_color(self.value.to_int() as u32)
        } else {
            self.value.to_string()
        }
    }
}
