//! Netsync Module - Backslash-Delimited Cvar Sync
//!
//! The wire format for demos and net games. Two layouts:
//!
//! - **full**: `\name\value\name\value...` - self-describing, used when the
//!   two ends may disagree on the cvar set
//! - **compact**: `\\<hex-filter>` followed by positional `\value` entries,
//!   matched against the case-insensitively sorted, filter-selected local
//!   cvar list. Both ends must compute the identical list; the decoder
//!   validates the entry count and rejects the whole stream on mismatch
//!   rather than applying misaligned values.
//!
//! Values applied from the wire bypass the local policy gate (the
//! arbitrator already enforced it on its side).

use crate::cvar::{Cvar, CvarFlags};
use crate::error::{CvarError, Result};
use crate::set::CvarSet;
use crate::value::CvarValue;

/// Filter-selected cvars in the canonical compact order: case-insensitive
/// lexicographic by name
fn selected<'a>(set: &'a CvarSet, filter: CvarFlags) -> Vec<&'a Cvar> {
    let mut picked: Vec<&Cvar> = set
        .iter()
        .filter(|c| c.flags().intersects(filter))
        .collect();
    picked.sort_by_key(|c| c.name().to_ascii_lowercase());
    picked
}

/// Encode the full `\name\value` layout
pub fn encode_full(set: &CvarSet, filter: CvarFlags) -> String {
    let mut out = String::new();
    for cvar in selected(set, filter) {
        out.push('\\');
        out.push_str(cvar.name());
        out.push('\\');
        out.push_str(&cvar.value_string());
    }
    out
}

/// Encode the compact positional layout, prefixed with the filter in hex
pub fn encode_compact(set: &CvarSet, filter: CvarFlags) -> String {
    let mut out = format!("\\\\{:x}", filter.bits());
    for cvar in selected(set, filter) {
        out.push('\\');
        out.push_str(&cvar.value_string());
    }
    out
}

/// Decode either layout and apply the carried values.
///
/// # Returns
/// * `Ok(usize)` - number of values applied
/// * `Err(CvarError::NetDesync)` - compact stream length disagrees with the
///   local list; nothing was applied
/// * `Err(CvarError::Parse)` - malformed stream
pub fn decode(set: &mut CvarSet, stream: &str) -> Result<usize> {
    if let Some(compact) = stream.strip_prefix("\\\\") {
        decode_compact(set, compact)
    } else if stream.starts_with('\\') {
        decode_full(set, stream)
    } else if stream.is_empty() {
        Ok(0)
    } else {
        Err(CvarError::Parse(format!(
            "cvar stream does not start with a backslash: {stream}"
        )))
    }
}

fn decode_full(set: &mut CvarSet, stream: &str) -> Result<usize> {
    let mut fields = stream.split('\\');
    fields.next(); // leading separator

    let mut applied = 0;
    loop {
        let Some(name) = fields.next() else { break };
        if name.is_empty() {
            break; // trailing separator
        }
        let Some(value) = fields.next() else {
            return Err(CvarError::Parse(format!("cvar '{name}' has no value")));
        };
        if set.find(name).is_some() {
            set.force_set(name, CvarValue::String(value.to_string()))?;
            applied += 1;
        } else {
            log::debug!("ignoring unknown cvar '{name}' in sync stream");
        }
    }
    Ok(applied)
}

fn decode_compact(set: &mut CvarSet, body: &str) -> Result<usize> {
    let (filter_hex, values): (&str, Vec<&str>) = match body.split_once('\\') {
        Some((hex, rest)) => (hex, rest.split('\\').collect()),
        None => (body, Vec::new()),
    };
    let bits = u32::from_str_radix(filter_hex, 16)
        .map_err(|_| CvarError::Parse(format!("bad compact filter '{filter_hex}'")))?;
    let filter = CvarFlags::from_bits(bits);

    // Positional layout: the counts must line up or nothing does.
    let names: Vec<String> = selected(set, filter)
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    if names.len() != values.len() {
        return Err(CvarError::NetDesync {
            expected: names.len(),
            got: values.len(),
        });
    }

    for (name, value) in names.iter().zip(&values) {
        set.force_set(name, CvarValue::String((*value).to_string()))?;
    }
    Ok(names.len())
}
