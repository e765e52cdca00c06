//! Archive Module - Config File Persistence
//!
//! Archivable cvars are written as `key "value"` lines under one section
//! per category. Category membership is an **exact mask match** over the
//! category-relevant flag bits, not a subset match: a cvar carrying extra
//! relevant flags is excluded from a category it would otherwise qualify
//! for (a USERINFO+ARCHIVE cvar belongs to the player section only, never
//! the game section).
//!
//! Loading applies values over registered cvars directly (policy does not
//! gate the user's own config) and creates AUTO placeholders for unknown
//! keys, to be absorbed when the owning code registers the real cvar.

use std::fs;
use std::path::Path;

use crate::cvar::CvarFlags;
use crate::error::{CvarError, Result};
use crate::set::CvarSet;
use crate::value::CvarValue;

/// Config file sections, one per flag-mask category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveCategory {
    /// Plain archived cvars
    Game,
    /// Archived cvars shared across games
    Global,
    /// Placeholders loaded for cvars nothing has registered yet
    Unknown,
    /// Archived per-player user info
    UserInfo,
}

impl ArchiveCategory {
    pub const ALL: [ArchiveCategory; 4] = [
        ArchiveCategory::Game,
        ArchiveCategory::Global,
        ArchiveCategory::Unknown,
        ArchiveCategory::UserInfo,
    ];

    /// The flag bits that decide category membership
    fn relevant() -> CvarFlags {
        CvarFlags::ARCHIVE | CvarFlags::GLOBAL_CONFIG | CvarFlags::AUTO | CvarFlags::USERINFO
    }

    /// The exact bit pattern this category requires
    fn mask(self) -> CvarFlags {
        match self {
            ArchiveCategory::Game => CvarFlags::ARCHIVE,
            ArchiveCategory::Global => CvarFlags::ARCHIVE | CvarFlags::GLOBAL_CONFIG,
            ArchiveCategory::Unknown => CvarFlags::ARCHIVE | CvarFlags::AUTO,
            ArchiveCategory::UserInfo => CvarFlags::ARCHIVE | CvarFlags::USERINFO,
        }
    }

    pub fn section(self) -> &'static str {
        match self {
            ArchiveCategory::Game => "GameVars",
            ArchiveCategory::Global => "GlobalVars",
            ArchiveCategory::Unknown => "UnknownVars",
            ArchiveCategory::UserInfo => "PlayerVars",
        }
    }

    fn from_section(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.section() == name)
    }

    /// Exact match over the relevant bits
    pub fn includes(self, flags: CvarFlags) -> bool {
        flags & Self::relevant() == self.mask()
    }

    /// Extra flags a placeholder created under this section carries
    fn placeholder_flags(self) -> CvarFlags {
        match self {
            ArchiveCategory::Global => CvarFlags::ARCHIVE | CvarFlags::GLOBAL_CONFIG,
            ArchiveCategory::UserInfo => CvarFlags::ARCHIVE | CvarFlags::USERINFO,
            _ => CvarFlags::ARCHIVE,
        }
    }
}

/// `key "value"` lines for one category, registration order
pub fn section_lines(set: &CvarSet, category: ArchiveCategory) -> Vec<String> {
    set.iter()
        .filter(|c| category.includes(c.flags()))
        .map(|c| format!("{} \"{}\"", c.name(), c.value_string()))
        .collect()
}

/// Write every archivable cvar, one pass per category
pub fn save(set: &CvarSet, path: &Path) -> Result<()> {
    let mut out = String::new();
    for category in ArchiveCategory::ALL {
        let lines = section_lines(set, category);
        if lines.is_empty() {
            continue;
        }
        out.push_str(&format!("[{}]\n", category.section()));
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }
    fs::write(path, out)?;
    Ok(())
}

/// Load a config file over this set.
///
/// Known keys are applied directly; unknown keys become AUTO placeholders
/// under the section's flags. Returns the number of values taken.
pub fn load(set: &mut CvarSet, path: &Path) -> Result<usize> {
    let text = fs::read_to_string(path)?;
    let mut category = ArchiveCategory::Game;
    let mut taken = 0;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            // Unrecognized sections are skipped wholesale, not an error.
            category = ArchiveCategory::from_section(section).unwrap_or(category);
            continue;
        }

        let (key, value) = parse_line(line)
            .ok_or_else(|| CvarError::Parse(format!("bad config line {}: {raw}", lineno + 1)))?;

        if set.find(key).is_some() {
            set.force_set(key, CvarValue::String(value.to_string()))?;
        } else {
            set.create_placeholder(key, value, category.placeholder_flags());
        }
        taken += 1;
    }
    Ok(taken)
}

/// Split `key "value"`; the quotes are optional for single-word values
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (key, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    let value = rest
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(rest);
    Some((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_of(bits: &[CvarFlags]) -> CvarFlags {
        bits.iter()
            .fold(CvarFlags::NONE, |acc, &f| acc | f)
    }

    #[test]
    fn category_match_is_exact_not_subset() {
        let game = ArchiveCategory::Game;
        assert!(game.includes(CvarFlags::ARCHIVE));
        assert!(
            game.includes(CvarFlags::ARCHIVE | CvarFlags::LATCH),
            "irrelevant bits must not affect the match"
        );
        assert!(
            !game.includes(flags_of(&[CvarFlags::ARCHIVE, CvarFlags::USERINFO])),
            "a relevant extra flag excludes the cvar from the plain category"
        );
        assert!(ArchiveCategory::UserInfo
            .includes(flags_of(&[CvarFlags::ARCHIVE, CvarFlags::USERINFO])));
        assert!(!game.includes(CvarFlags::NONE));
    }

    #[test]
    fn line_parsing_accepts_quoted_and_bare_values() {
        assert_eq!(parse_line("name \"two words\""), Some(("name", "two words")));
        assert_eq!(parse_line("name 17"), Some(("name", "17")));
        assert_eq!(parse_line("nospace"), None);
    }
}
