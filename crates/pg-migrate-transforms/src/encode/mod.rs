//! Canonical encoders.
//!
//! Each encoder converts one source-side representation into the literal the
//! PostgreSQL target expects. Encoders are pure and total over nullability:
//! a NULL input always encodes to [`Encoded::Null`]. Data-quality quirks
//! (zero dates, empty strings, odd bit patterns) also become NULL. A value of
//! the wrong shape is a [`TransformError::Value`].
//!
//! - [`date`]: MySQL zero dates, unseparated date/time strings, SQLite years,
//!   unix timestamps
//! - [`boolean`]: tinyint, bit-vector and SQL Server bit literals
//! - [`network`]: integer-encoded IPv4 addresses and ranges
//! - [`geometry`]: MySQL `POINT` / `LINESTRING` text
//! - [`numeric`]: integer, float and hex normalisation
//! - [`text`]: trimming, NUL stripping, SET literals, empty-to-null
//! - [`binary`]: bytea hex literals, GUIDs, charset decoding, base64

pub mod binary;
pub mod boolean;
pub mod date;
pub mod geometry;
pub mod network;
pub mod numeric;
pub mod text;

pub use binary::SourceEncoding;
pub use date::{DateField, FieldLayout, FieldSpec};

use crate::core::{RawValue, Transform};
use crate::error::TransformError;

/// Error for a value whose variant the encoder does not accept.
pub(crate) fn unsupported(transform: &str, value: &RawValue<'_>) -> TransformError {
    TransformError::value(transform, format!("unsupported {} input", value.kind()))
}

/// Every built-in transform with its default parameters.
pub fn builtin_transforms() -> Vec<Transform> {
    let datetime_layout = FieldLayout::datetime();
    let time_layout = FieldLayout::time();
    let utf8 = SourceEncoding::default();

    vec![
        Transform::unary(date::ZERO_DATES_TO_NULL, date::zero_dates_to_null),
        Transform::unary(date::DATE_WITH_NO_SEPARATOR, move |v| {
            date::date_with_no_separator(v, &datetime_layout)
        }),
        Transform::unary(date::TIME_WITH_NO_SEPARATOR, move |v| {
            date::time_with_no_separator(v, &time_layout)
        }),
        Transform::unary(
            date::SQLITE_TIMESTAMP_TO_TIMESTAMP,
            date::sqlite_timestamp_to_timestamp,
        ),
        Transform::unary(
            date::UNIX_TIMESTAMP_TO_TIMESTAMPTZ,
            date::unix_timestamp_to_timestamptz,
        ),
        Transform::unary(boolean::TINYINT_TO_BOOLEAN, boolean::tinyint_to_boolean),
        Transform::unary(boolean::BITS_TO_BOOLEAN, boolean::bits_to_boolean),
        Transform::unary(
            boolean::SQL_SERVER_BIT_TO_BOOLEAN,
            boolean::sql_server_bit_to_boolean,
        ),
        Transform::unary(network::INT_TO_IP, network::int_to_ip_value),
        Transform::new(network::IP_RANGE, 2, |args| {
            network::ip_range(&args[0], &args[1])
        }),
        Transform::unary(geometry::CONVERT_MYSQL_POINT, geometry::convert_mysql_point),
        Transform::unary(
            geometry::CONVERT_MYSQL_LINESTRING,
            geometry::convert_mysql_linestring,
        ),
        Transform::unary(numeric::INTEGER_TO_STRING, numeric::integer_to_string),
        Transform::unary(numeric::FLOAT_TO_STRING, numeric::float_to_string),
        Transform::unary(numeric::HEX_TO_DEC, numeric::hex_to_dec),
        Transform::unary(text::SET_TO_ENUM_ARRAY, text::set_to_enum_array),
        Transform::unary(text::EMPTY_STRING_TO_NULL, text::empty_string_to_null),
        Transform::unary(text::RIGHT_TRIM, text::right_trim),
        Transform::unary(text::REMOVE_NULL_CHARACTERS, text::remove_null_characters),
        Transform::unary(binary::BYTE_VECTOR_TO_BYTEA, binary::byte_vector_to_bytea),
        Transform::unary(
            binary::SQL_SERVER_UNIQUEIDENTIFIER_TO_UUID,
            binary::sql_server_uniqueidentifier_to_uuid,
        ),
        Transform::unary(binary::VARBINARY_TO_STRING, move |v| {
            binary::varbinary_to_string(v, utf8)
        }),
        Transform::unary(binary::BASE64_DECODE, binary::base64_decode),
    ]
}
