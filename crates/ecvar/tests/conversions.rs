//! Conversion Round-Trip Properties
//!
//! For every kind K and representable value V, converting V to a string
//! and back recovers V - exactly for bool/int, to six significant digits
//! for float (the `%g` contract).

use ecvar::value::{format_float, parse_float, parse_int};
use ecvar::{CvarKind, CvarValue};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

#[quickcheck]
fn int_string_round_trip(v: i32) -> bool {
    let s = CvarValue::Int(v).to_string();
    parse_int(&s) == v
}

#[quickcheck]
fn bool_string_round_trip(v: bool) -> bool {
    let s = CvarValue::Bool(v).to_string();
    CvarValue::String(s).to_bool() == v
}

#[quickcheck]
fn float_string_round_trip_six_digits(v: f32) -> TestResult {
    if !v.is_finite() {
        return TestResult::discard();
    }
    let s = format_float(v);
    let back = parse_float(&s);
    let ok = if v == 0.0 {
        back == 0.0
    } else {
        ((back - v) / v).abs() < 1e-4
    };
    TestResult::from_bool(ok)
}

#[quickcheck]
fn int_survives_kind_coercion_cycle(v: i32) -> bool {
    let through_string = CvarValue::Int(v)
        .coerced_to(CvarKind::String)
        .coerced_to(CvarKind::Int);
    through_string == CvarValue::Int(v)
}

#[quickcheck]
fn bool_survives_int_coercion_cycle(v: bool) -> bool {
    let through_int = CvarValue::Bool(v)
        .coerced_to(CvarKind::Int)
        .coerced_to(CvarKind::Bool);
    through_int == CvarValue::Bool(v)
}
