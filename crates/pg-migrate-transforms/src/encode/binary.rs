//! Binary values: bytea literals, GUIDs, charset decoding and base64.

use base64::prelude::*;
use encoding_rs::Encoding;
use uuid::Uuid;

use crate::core::{Encoded, RawValue};
use crate::error::{Result, TransformError};

use super::unsupported;

pub const BYTE_VECTOR_TO_BYTEA: &str = "byte-vector-to-bytea";
pub const SQL_SERVER_UNIQUEIDENTIFIER_TO_UUID: &str = "sql-server-uniqueidentifier-to-uuid";
pub const VARBINARY_TO_STRING: &str = "varbinary-to-string";
pub const BASE64_DECODE: &str = "base64-decode";

/// Character encoding of the source database, for decoding raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceEncoding(&'static Encoding);

impl SourceEncoding {
    /// Look up an encoding by WHATWG label (`utf8`, `latin1`, `cp1252`, ...).
    pub fn from_label(label: &str) -> Result<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Self)
            .ok_or_else(|| TransformError::Config(format!("Unknown source encoding: {}", label)))
    }

    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl Default for SourceEncoding {
    fn default() -> Self {
        Self(encoding_rs::UTF_8)
    }
}

/// Bytes to the `\x` hex bytea literal.
///
/// An empty string is how some drivers report an empty binary column and
/// encodes to NULL; any other string is ambiguous and is an error.
pub fn byte_vector_to_bytea(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Text(s) if s.is_empty() => Ok(Encoded::Null),
        RawValue::Text(s) => Err(TransformError::value(
            BYTE_VECTOR_TO_BYTEA,
            format!("called on a string: {:?}", s),
        )),
        RawValue::Bytes(b) => {
            let mut out = String::with_capacity(2 + b.len() * 2);
            out.push_str("\\x");
            out.push_str(&hex::encode(b));
            Ok(Encoded::Text(out))
        }
        other => Err(unsupported(BYTE_VECTOR_TO_BYTEA, other)),
    }
}

/// 16 raw bytes to a hyphenated lowercase UUID.
pub fn sql_server_uniqueidentifier_to_uuid(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Bytes(b) => {
            let id = Uuid::from_slice(b).map_err(|_| {
                TransformError::value(
                    SQL_SERVER_UNIQUEIDENTIFIER_TO_UUID,
                    format!("expected 16 bytes, got {}", b.len()),
                )
            })?;
            Ok(Encoded::Text(id.hyphenated().to_string()))
        }
        other => Err(unsupported(SQL_SERVER_UNIQUEIDENTIFIER_TO_UUID, other)),
    }
}

/// Decode raw bytes with the source encoding; strings pass through.
pub fn varbinary_to_string(value: &RawValue<'_>, encoding: SourceEncoding) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Text(s) => Ok(Encoded::text(&**s)),
        RawValue::Bytes(b) => encoding
            .0
            .decode_without_bom_handling_and_without_replacement(b)
            .map(|s| Encoded::Text(s.into_owned()))
            .ok_or_else(|| {
                TransformError::value(
                    VARBINARY_TO_STRING,
                    format!("bytes are not valid {}", encoding.name()),
                )
            }),
        other => Err(unsupported(VARBINARY_TO_STRING, other)),
    }
}

/// Standard-alphabet base64 to UTF-8 text.
pub fn base64_decode(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Text(s) => {
            let bytes = BASE64_STANDARD
                .decode(s.trim())
                .map_err(|e| TransformError::value(BASE64_DECODE, format!("invalid base64: {}", e)))?;
            String::from_utf8(bytes).map(Encoded::Text).map_err(|_| {
                TransformError::value(BASE64_DECODE, "decoded bytes are not UTF-8")
            })
        }
        other => Err(unsupported(BASE64_DECODE, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_vector_to_bytea() {
        let v = RawValue::from(vec![0xde_u8, 0xad, 0xbe, 0xef]);
        assert_eq!(byte_vector_to_bytea(&v).unwrap(), Encoded::text("\\xdeadbeef"));
        assert_eq!(byte_vector_to_bytea(&RawValue::Null).unwrap(), Encoded::Null);
        assert_eq!(byte_vector_to_bytea(&"".into()).unwrap(), Encoded::Null);
    }

    #[test]
    fn test_byte_vector_to_bytea_length() {
        for k in [0usize, 1, 7, 64] {
            let v = RawValue::from(vec![0xabu8; k]);
            let out = byte_vector_to_bytea(&v).unwrap().into_option().unwrap();
            assert_eq!(out.len(), 2 * k + 2);
            assert!(out.starts_with("\\x"));
        }
    }

    #[test]
    fn test_byte_vector_to_bytea_rejects_strings() {
        let err = byte_vector_to_bytea(&"abc".into()).unwrap_err();
        assert!(matches!(err, TransformError::Value { .. }));
    }

    #[test]
    fn test_uniqueidentifier_to_uuid() {
        let bytes: Vec<u8> = (0u8..16).collect();
        assert_eq!(
            sql_server_uniqueidentifier_to_uuid(&bytes.into()).unwrap(),
            Encoded::text("00010203-0405-0607-0809-0a0b0c0d0e0f")
        );
        assert!(sql_server_uniqueidentifier_to_uuid(&vec![1u8; 15].into()).is_err());
        assert_eq!(
            sql_server_uniqueidentifier_to_uuid(&RawValue::Null).unwrap(),
            Encoded::Null
        );
    }

    #[test]
    fn test_varbinary_to_string() {
        let utf8 = SourceEncoding::default();
        assert_eq!(
            varbinary_to_string(&RawValue::from("caf\u{e9}".as_bytes()), utf8).unwrap(),
            Encoded::text("caf\u{e9}")
        );
        assert_eq!(varbinary_to_string(&"plain".into(), utf8).unwrap(), Encoded::text("plain"));
        assert!(varbinary_to_string(&RawValue::from(vec![0xff_u8, 0xfe]), utf8).is_err());

        let latin1 = SourceEncoding::from_label("latin1").unwrap();
        assert_eq!(
            varbinary_to_string(&RawValue::from(vec![0x63_u8, 0x61, 0x66, 0xe9]), latin1).unwrap(),
            Encoded::text("caf\u{e9}")
        );
    }

    #[test]
    fn test_unknown_encoding_is_config_error() {
        let err = SourceEncoding::from_label("klingon").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_base64_decode() {
        assert_eq!(base64_decode(&"aGVsbG8=".into()).unwrap(), Encoded::text("hello"));
        assert_eq!(base64_decode(&RawValue::Null).unwrap(), Encoded::Null);
        assert!(base64_decode(&"***".into()).is_err());
    }
}
