//! Color Module - The Derived Color Kind
//!
//! A color cvar stores a packed RGB integer and accepts string writes in
//! three grammars: `#rrggbb`, a space-separated hex triplet (`"ff 80 00"`),
//! or a named color. Beside the packed value it caches a palette index,
//! re-derived against the active palette through [`PaletteMatcher`].

use crate::cvar::CvarFlags;
use crate::error::{CvarError, Result};
use crate::set::CvarSet;

/// Maps an RGB color to the nearest index of the active palette
pub trait PaletteMatcher {
    fn best_index(&self, r: u8, g: u8, b: u8) -> i32;
}

/// Small named-color table; enough for console use
const NAMED: [(&str, u32); 12] = [
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("green", 0x00ff00),
    ("blue", 0x0000ff),
    ("yellow", 0xffff00),
    ("cyan", 0x00ffff),
    ("magenta", 0xff00ff),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("orange", 0xff8000),
    ("brown", 0x8b4513),
];

/// Parse a color string into packed `0xRRGGBB`
///
/// # Returns
/// * `Ok(u32)` - packed RGB
/// * `Err(CvarError::BadColor)` - none of the three grammars matched
pub fn parse_color(s: &str) -> Result<u32> {
    let t = s.trim();

    if let Some(hex) = t.strip_prefix('#') {
        if hex.len() == 6 {
            if let Ok(rgb) = u32::from_str_radix(hex, 16) {
                return Ok(rgb);
            }
        }
        return Err(CvarError::BadColor(s.to_string()));
    }

    let parts: Vec<&str> = t.split_whitespace().collect();
    if parts.len() == 3 {
        let mut rgb = 0u32;
        for p in &parts {
            if p.len() > 2 {
                return Err(CvarError::BadColor(s.to_string()));
            }
            let c = u32::from_str_radix(p, 16)
                .map_err(|_| CvarError::BadColor(s.to_string()))?;
            rgb = (rgb << 8) | c;
        }
        return Ok(rgb);
    }

    if let Some(&(_, rgb)) = NAMED.iter().find(|(n, _)| t.eq_ignore_ascii_case(n)) {
        return Ok(rgb);
    }
    Err(CvarError::BadColor(s.to_string()))
}

/// Format packed RGB as the hex-triplet grammar, e.g. `"ff 80 00"`
pub fn format_color(rgb: u32) -> String {
    format!(
        "{:02x} {:02x} {:02x}",
        (rgb >> 16) & 0xff,
        (rgb >> 8) & 0xff,
        rgb & 0xff
    )
}

#[inline]
pub fn red(rgb: u32) -> u8 {
    ((rgb >> 16) & 0xff) as u8
}

#[inline]
pub fn green(rgb: u32) -> u8 {
    ((rgb >> 8) & 0xff) as u8
}

#[inline]
pub fn blue(rgb: u32) -> u8 {
    (rgb & 0xff) as u8
}

/// Re-derive every color cvar's palette-index cache (after a palette
/// reload)
pub fn reset_colors(set: &mut CvarSet, matcher: &dyn PaletteMatcher) {
    for cvar in set.vars_mut() {
        if !cvar.is_color() {
            continue;
        }
        let rgb = cvar.value().to_int() as u32;
        let index = matcher.best_index(red(rgb), green(rgb), blue(rgb));
        cvar.set_palette_index(Some(index));
    }
}

/// Convenience registration mirroring [`CvarSet::register_color`], with the
/// common ARCHIVE default
pub fn register_archived_color(set: &mut CvarSet, name: &str, default_rgb: u32) -> Result<()> {
    set.register_color(name, default_rgb, CvarFlags::ARCHIVE, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CvarValue;

    #[test]
    fn parses_all_three_grammars() {
        assert_eq!(parse_color("#ff8000").unwrap(), 0xff8000);
        assert_eq!(parse_color("ff 80 00").unwrap(), 0xff8000);
        assert_eq!(parse_color("f 8 0").unwrap(), 0x0f0800);
        assert_eq!(parse_color("Orange").unwrap(), 0xff8000);
        assert!(parse_color("#ff80").is_err());
        assert!(parse_color("notacolor").is_err());
    }

    #[test]
    fn format_round_trips_through_parse() {
        let rgb = 0x12ab07;
        assert_eq!(parse_color(&format_color(rgb)).unwrap(), rgb);
    }

    #[test]
    fn color_cvar_accepts_string_writes() {
        let mut set = CvarSet::new();
        set.register_color("am_backcolor", 0x000000, CvarFlags::NONE, None)
            .unwrap();

        set.force_set("am_backcolor", CvarValue::String("#00ff00".into()))
            .unwrap();
        assert_eq!(
            set.get("am_backcolor").unwrap().value(),
            &CvarValue::Int(0x00ff00)
        );
        assert_eq!(set.get("am_backcolor").unwrap().value_string(), "00 ff 00");
    }

    #[test]
    fn reset_colors_rebuilds_the_cache() {
        struct Nearest;
        impl PaletteMatcher for Nearest {
            fn best_index(&self, r: u8, _g: u8, _b: u8) -> i32 {
                i32::from(r)
            }
        }

        let mut set = CvarSet::new();
        set.register_color("crosshair_color", 0x7f0000, CvarFlags::NONE, None)
            .unwrap();
        assert_eq!(set.get("crosshair_color").unwrap().palette_index(), None);

        reset_colors(&mut set, &Nearest);
        assert_eq!(
            set.get("crosshair_color").unwrap().palette_index(),
            Some(0x7f)
        );
    }
}
