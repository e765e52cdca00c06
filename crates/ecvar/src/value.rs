//! Value Module - Typed Cvar Values and Total Conversions
//!
//! Four concrete kinds with a total conversion family: every conversion
//! returns *something* for every input, the way the console expects.
//! String parsing is locale-insensitive; integers accept C base-0 literals
//! (`0x` hex, leading-`0` octal) and parse the longest valid prefix;
//! out-of-range literals clamp instead of failing.

use std::fmt;

/// The four concrete cvar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvarKind {
    Bool,
    Int,
    Float,
    String,
}

/// A typed cvar value
#[derive(Debug, Clone, PartialEq)]
pub enum CvarValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
}

impl CvarValue {
    #[inline]
    pub fn kind(&self) -> CvarKind {
        match self {
            CvarValue::Bool(_) => CvarKind::Bool,
            CvarValue::Int(_) => CvarKind::Int,
            CvarValue::Float(_) => CvarKind::Float,
            CvarValue::String(_) => CvarKind::String,
        }
    }

    /// Total conversion to bool. Strings accept "true"/"false" in any case,
    /// anything else falls back to numeric (non-zero is true).
    pub fn to_bool(&self) -> bool {
        match self {
            CvarValue::Bool(b) => *b,
            CvarValue::Int(i) => *i != 0,
            CvarValue::Float(f) => *f != 0.0,
            CvarValue::String(s) => {
                if s.eq_ignore_ascii_case("true") {
                    true
                } else if s.eq_ignore_ascii_case("false") {
                    false
                } else {
                    parse_float(s) != 0.0
                }
            }
        }
    }

    /// Total conversion to int. Strings parse with base-0 semantics after
    /// the "true"/"false" literals; floats truncate.
    pub fn to_int(&self) -> i32 {
        match self {
            CvarValue::Bool(b) => i32::from(*b),
            CvarValue::Int(i) => *i,
            CvarValue::Float(f) => *f as i32,
            CvarValue::String(s) => {
                if s.eq_ignore_ascii_case("true") {
                    1
                } else if s.eq_ignore_ascii_case("false") {
                    0
                } else {
                    parse_int(s)
                }
            }
        }
    }

    /// Total conversion to float
    pub fn to_float(&self) -> f32 {
        match self {
            CvarValue::Bool(b) => f32::from(u8::from(*b)),
            CvarValue::Int(i) => *i as f32,
            CvarValue::Float(f) => *f,
            CvarValue::String(s) => parse_float(s),
        }
    }

    /// Re-express this value as `kind`
    pub fn coerced_to(&self, kind: CvarKind) -> CvarValue {
        match kind {
            CvarKind::Bool => CvarValue::Bool(self.to_bool()),
            CvarKind::Int => CvarValue::Int(self.to_int()),
            CvarKind::Float => CvarValue::Float(self.to_float()),
            CvarKind::String => CvarValue::String(self.to_string()),
        }
    }
}

impl fmt::Display for CvarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CvarValue::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            CvarValue::Int(i) => write!(f, "{i}"),
            CvarValue::Float(v) => f.write_str(&format_float(*v)),
            CvarValue::String(s) => f.write_str(s),
        }
    }
}

/// C `strtol`-with-base-0 semantics: optional sign, `0x` hex or leading-`0`
/// octal prefix, longest valid prefix, clamp on overflow, 0 when no digits.
pub fn parse_int(s: &str) -> i32 {
    let t = s.trim_start();
    let (neg, t) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };

    let (radix, digits) = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X"))
    {
        (16, hex)
    } else if t.starts_with('0') && t.len() > 1 {
        (8, &t[1..])
    } else {
        (10, t)
    };

    let mut acc: i64 = 0;
    let mut any = false;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else { break };
        any = true;
        acc = acc.saturating_mul(i64::from(radix)).saturating_add(i64::from(d));
        if acc > i64::from(i32::MAX) + 1 {
            acc = i64::from(i32::MAX) + 1;
        }
    }
    if !any {
        return 0;
    }
    let signed = if neg { -acc } else { acc };
    signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// `strtod`-style: parse the longest valid float prefix, 0.0 when none
pub fn parse_float(s: &str) -> f32 {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;

    while end < bytes.len() {
        let c = bytes[end];
        match c {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 => {}
            b'+' | b'-' if matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => {
                seen_exp = true;
                seen_dot = true;
            }
            _ => break,
        }
        end += 1;
    }
    // Trim an exponent marker with no digits after it.
    while end > 0 && matches!(bytes[end - 1], b'e' | b'E' | b'+' | b'-' | b'.') {
        let tail = &t[..end];
        if tail.parse::<f32>().is_ok() {
            break;
        }
        end -= 1;
    }
    t[..end].parse::<f32>().unwrap_or(0.0)
}

/// `%g`-style formatting: six significant digits, exponent notation outside
/// the 1e-4 .. 1e6 window, trailing zeros trimmed.
pub fn format_float(v: f32) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return if v.is_nan() {
            "nan".to_string()
        } else if v > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let exp = v.abs().log10().floor() as i32;
    if !(-4..6).contains(&exp) {
        let s = format!("{:.5e}", v);
        trim_exponential(&s)
    } else {
        let prec = (5 - exp).max(0) as usize;
        let s = format!("{:.*}", prec, v);
        trim_decimal(&s)
    }
}

fn trim_decimal(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

fn trim_exponential(s: &str) -> String {
    let Some((mantissa, exp)) = s.split_once('e') else {
        return s.to_string();
    };
    let mantissa = trim_decimal(mantissa);
    format!("{mantissa}e{exp}")
}
