//! Flag Module - Bit Views over Integer Cvars
//!
//! A flag cvar is not storage: it reads and writes one bit of a host
//! integer cvar. It has no default of its own and never appears in the
//! registry, so it is excluded from archiving and network sync by
//! construction. Writes route through the host's policy gate.

use crate::error::Result;
use crate::set::{CvarSet, SetOutcome};
use crate::value::CvarValue;

/// A named single-bit view over a host integer cvar
pub struct FlagCvar {
    name: String,
    host: String,
    mask: i32,
}

impl FlagCvar {
    /// `bit` is the bit position (0-31), not a mask
    pub fn new(name: &str, host: &str, bit: u32) -> Self {
        debug_assert!(bit < 32);
        Self {
            name: name.to_string(),
            host: host.to_string(),
            mask: 1i32 << bit,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn host_name(&self) -> &str {
        &self.host
    }

    /// Current state of the bit
    ///
    /// # Returns
    /// * `Ok(bool)` - bit state
    /// * `Err(CvarError::NotFound)` - host cvar missing
    pub fn get(&self, set: &CvarSet) -> Result<bool> {
        let host = set.get(&self.host)?;
        Ok(host.value().to_int() & self.mask != 0)
    }

    /// Write the bit through the host's policy gate; the host's LATCH /
    /// NOSET / SERVERINFO flags apply unchanged.
    pub fn set(&self, set: &mut CvarSet, on: bool) -> Result<SetOutcome> {
        let current = set.get(&self.host)?.value().to_int();
        let next = if on {
            current | self.mask
        } else {
            current & !self.mask
        };
        if next == current {
            return Ok(SetOutcome::Applied);
        }
        set.set_generic(&self.host, CvarValue::Int(next))
    }

    pub fn toggle(&self, set: &mut CvarSet) -> Result<SetOutcome> {
        let on = self.get(set)?;
        self.set(set, !on)
    }
}
