//! Boolean encoders for MySQL tinyint/bit and SQL Server bit columns.

use tracing::trace;

use crate::core::{Encoded, RawValue};
use crate::error::Result;

use super::unsupported;

pub const TINYINT_TO_BOOLEAN: &str = "tinyint-to-boolean";
pub const BITS_TO_BOOLEAN: &str = "bits-to-boolean";
pub const SQL_SERVER_BIT_TO_BOOLEAN: &str = "sql-server-bit-to-boolean";

fn pg_bool(b: bool) -> Encoded {
    Encoded::text(if b { "t" } else { "f" })
}

/// `"0"` is false, anything else is true.
pub fn tinyint_to_boolean(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Text(s) => Ok(pg_bool(s != "0")),
        RawValue::Int(i) => Ok(pg_bool(*i != 0)),
        other => Err(unsupported(TINYINT_TO_BOOLEAN, other)),
    }
}

/// A `bit(1)` vector to a boolean; NULL unless exactly one bit is present.
pub fn bits_to_boolean(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Bits(bits) => match &**bits {
            [bit] => Ok(pg_bool(bit.is_set())),
            _ => Ok(Encoded::Null),
        },
        other => Err(unsupported(BITS_TO_BOOLEAN, other)),
    }
}

/// SQL Server bit values, including column defaults spelled `((0))`/`((1))`.
///
/// Strings outside the four recognised literals are [`Encoded::Indeterminate`].
pub fn sql_server_bit_to_boolean(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Int(i) => Ok(pg_bool(*i != 0)),
        RawValue::Text(s) => match &**s {
            "0" | "((0))" => Ok(pg_bool(false)),
            "1" | "((1))" => Ok(pg_bool(true)),
            other => {
                trace!(value = other, "unrecognised SQL Server bit literal");
                Ok(Encoded::Indeterminate)
            }
        },
        other => Err(unsupported(SQL_SERVER_BIT_TO_BOOLEAN, other)),
    }
}
