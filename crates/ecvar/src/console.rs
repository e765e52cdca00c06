//! Console Module - String-Level Primitives
//!
//! The thin surface an external command dispatcher calls: everything takes
//! and returns strings, policy and typing stay inside the set.

use crate::error::Result;
use crate::set::{CvarSet, SetOutcome};
use crate::value::{CvarKind, CvarValue};

/// Current value as the console shows it
pub fn get_as_string(set: &CvarSet, name: &str) -> Result<String> {
    Ok(set.get(name)?.value_string())
}

/// `set <var> <value>`: a string write through the policy gate
pub fn set_from_string(set: &mut CvarSet, name: &str, value: &str) -> Result<SetOutcome> {
    set.set_generic(name, CvarValue::String(value.to_string()))
}

/// `toggle <var>`: invert through the policy gate, returns the value the
/// write asked for (a gated write may not have applied it)
pub fn toggle(set: &mut CvarSet, name: &str) -> Result<(bool, SetOutcome)> {
    let next = !set.get(name)?.value().to_bool();
    let outcome = set.set_generic(name, CvarValue::Bool(next))?;
    Ok((next, outcome))
}

/// `cvarlist [substring]`: one line per cvar, flag letters first
///
/// The filter is a case-insensitive substring match over names.
pub fn list(set: &CvarSet, filter: Option<&str>) -> Vec<String> {
    let needle = filter.map(str::to_ascii_lowercase);
    set.iter()
        .filter(|c| match &needle {
            Some(n) => c.name().to_ascii_lowercase().contains(n),
            None => true,
        })
        .map(|c| {
            format!(
                "{} {:5} {} = {}",
                c.flags().letters(),
                kind_name(c.kind()),
                c.name(),
                c.value_string()
            )
        })
        .collect()
}

fn kind_name(kind: CvarKind) -> &'static str {
    match kind {
        CvarKind::Bool => "bool",
        CvarKind::Int => "int",
        CvarKind::Float => "float",
        CvarKind::String => "str",
    }
}
