//! Integer, float and hexadecimal normalisation.
//!
//! Integers are handled textually so arbitrarily wide source values (MySQL
//! `decimal(65,0)`, unsigned bigint) never overflow.

use crate::core::{Encoded, RawValue};
use crate::error::{Result, TransformError};

use super::unsupported;

pub const INTEGER_TO_STRING: &str = "integer-to-string";
pub const FLOAT_TO_STRING: &str = "float-to-string";
pub const HEX_TO_DEC: &str = "hex-to-dec";

fn split_sign(s: &str) -> (bool, &str) {
    match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    }
}

/// Canonical decimal digits for an integer literal.
///
/// Accepts surrounding whitespace, an optional sign and leading zeros.
/// `" +007 "` gives `"7"`, `"-0"` gives `"0"`.
pub fn canonical_integer(s: &str) -> Option<String> {
    let (negative, digits) = split_sign(s.trim());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Some("0".to_string());
    }
    let mut out = String::with_capacity(significant.len() + 1);
    if negative {
        out.push('-');
    }
    out.push_str(significant);
    Some(out)
}

/// Parse an integer literal that fits in `i128`.
pub fn parse_integer(s: &str) -> Option<i128> {
    canonical_integer(s)?.parse().ok()
}

/// Hexadecimal digits (optionally signed) to decimal digits, any width.
pub fn hex_to_decimal(s: &str) -> Option<String> {
    const BASE: u64 = 1_000_000_000;

    let (negative, digits) = split_sign(s.trim());
    if digits.is_empty() {
        return None;
    }

    // Little-endian base-10^9 limbs.
    let mut limbs: Vec<u32> = vec![0];
    for c in digits.chars() {
        let mut carry = u64::from(c.to_digit(16)?);
        for limb in &mut limbs {
            let v = u64::from(*limb) * 16 + carry;
            *limb = (v % BASE) as u32;
            carry = v / BASE;
        }
        if carry > 0 {
            limbs.push(carry as u32);
        }
    }

    let mut out = String::new();
    if negative && limbs.iter().any(|&l| l != 0) {
        out.push('-');
    }
    let mut iter = limbs.iter().rev();
    if let Some(top) = iter.next() {
        out.push_str(&top.to_string());
    }
    for limb in iter {
        out.push_str(&format!("{:09}", limb));
    }
    Some(out)
}

/// Render a double the way PostgreSQL reads it back.
///
/// Never uses exponent notation and never carries a type marker.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "Infinity".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        f.to_string()
    }
}

/// Integer or integer string to canonical digits.
///
/// Strings that fail to parse are retried once with a surrounding quote
/// character stripped, which handles defaults reported as `'5'`.
pub fn integer_to_string(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Int(i) => Ok(Encoded::Text(i.to_string())),
        RawValue::Text(s) => canonical_integer(s)
            .or_else(|| {
                let inner = s.strip_prefix(['\'', '"'])?.strip_suffix(['\'', '"'])?;
                canonical_integer(inner)
            })
            .map(Encoded::Text)
            .ok_or_else(|| {
                TransformError::value(INTEGER_TO_STRING, format!("{:?} is not an integer", s))
            }),
        other => Err(unsupported(INTEGER_TO_STRING, other)),
    }
}

/// Float, integer or string to a decimal literal.
pub fn float_to_string(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Float(f) => Ok(Encoded::Text(format_float(*f))),
        RawValue::Int(i) => Ok(Encoded::Text(i.to_string())),
        RawValue::Text(s) => Ok(Encoded::text(&**s)),
        other => Err(unsupported(FLOAT_TO_STRING, other)),
    }
}

/// Hex string to decimal string. Integers are already decimal.
pub fn hex_to_dec(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Int(i) => Ok(Encoded::Text(i.to_string())),
        RawValue::Text(s) => hex_to_decimal(s).map(Encoded::Text).ok_or_else(|| {
            TransformError::value(HEX_TO_DEC, format!("{:?} is not a hexadecimal integer", s))
        }),
        other => Err(unsupported(HEX_TO_DEC, other)),
    }
}
