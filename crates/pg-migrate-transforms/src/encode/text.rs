//! Plain string clean-ups.

use crate::core::{Encoded, RawValue};
use crate::error::Result;

use super::unsupported;

pub const SET_TO_ENUM_ARRAY: &str = "set-to-enum-array";
pub const EMPTY_STRING_TO_NULL: &str = "empty-string-to-null";
pub const RIGHT_TRIM: &str = "right-trim";
pub const REMOVE_NULL_CHARACTERS: &str = "remove-null-characters";

/// Apply `f` to text input, passing NULL through and rejecting other kinds.
fn map_text<F>(transform: &str, value: &RawValue<'_>, f: F) -> Result<Encoded>
where
    F: FnOnce(&str) -> Encoded,
{
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Text(s) => Ok(f(&**s)),
        other => Err(unsupported(transform, other)),
    }
}

/// MySQL `SET` value `a,b,c` to the array literal `{a,b,c}`.
///
/// Labels are not escaped.
pub fn set_to_enum_array(value: &RawValue<'_>) -> Result<Encoded> {
    map_text(SET_TO_ENUM_ARRAY, value, |s| Encoded::Text(format!("{{{}}}", s)))
}

pub fn empty_string_to_null(value: &RawValue<'_>) -> Result<Encoded> {
    map_text(EMPTY_STRING_TO_NULL, value, |s| {
        if s.is_empty() {
            Encoded::Null
        } else {
            Encoded::text(s)
        }
    })
}

/// Drop trailing ASCII spaces only (CHAR padding), keeping tabs and newlines.
pub fn right_trim(value: &RawValue<'_>) -> Result<Encoded> {
    map_text(RIGHT_TRIM, value, |s| Encoded::text(s.trim_end_matches(' ')))
}

/// PostgreSQL text cannot hold `\0`.
pub fn remove_null_characters(value: &RawValue<'_>) -> Result<Encoded> {
    map_text(REMOVE_NULL_CHARACTERS, value, |s| Encoded::Text(s.replace('\0', "")))
}
