//! Raw source values and encoded target values.
//!
//! Source drivers disambiguate each field into a [`RawValue`] once, when the
//! value is read. Encoders then match on the variant instead of inspecting the
//! shape of their argument at call time.

use std::borrow::Cow;
use std::fmt;

/// One element of a source bit-vector.
///
/// Some drivers hand bits over as characters (`'\0'` / `'\u{1}'`), others as
/// small integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitElem {
    Char(char),
    Int(u8),
}

impl BitElem {
    /// Whether this element denotes a set bit.
    pub fn is_set(self) -> bool {
        match self {
            BitElem::Char(c) => c != '\0',
            BitElem::Int(i) => i != 0,
        }
    }
}

/// A decoded field as produced by a source driver.
///
/// Uses `Cow` for string and byte data so readers can lend their buffers
/// instead of allocating per field.
///
/// # Example
///
/// ```rust
/// use std::borrow::Cow;
/// use pg_migrate_transforms::RawValue;
///
/// let borrowed: RawValue<'_> = RawValue::Text(Cow::Borrowed("0000-00-00"));
/// let owned: RawValue<'static> = borrowed.into_owned();
/// assert!(!owned.is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue<'a> {
    /// SQL NULL / absent value.
    Null,

    /// Text data.
    Text(Cow<'a, str>),

    /// Integer. Wide enough for unsigned 64-bit source columns.
    Int(i128),

    /// IEEE double.
    Float(f64),

    /// Raw bytes (binary, varbinary, blob, uniqueidentifier).
    Bytes(Cow<'a, [u8]>),

    /// Bit-vector (MySQL `bit(n)`).
    Bits(Cow<'a, [BitElem]>),
}

impl<'a> RawValue<'a> {
    /// Convert to a fully owned value with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> RawValue<'static> {
        match self {
            RawValue::Null => RawValue::Null,
            RawValue::Text(v) => RawValue::Text(Cow::Owned(v.into_owned())),
            RawValue::Int(v) => RawValue::Int(v),
            RawValue::Float(v) => RawValue::Float(v),
            RawValue::Bytes(v) => RawValue::Bytes(Cow::Owned(v.into_owned())),
            RawValue::Bits(v) => RawValue::Bits(Cow::Owned(v.into_owned())),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Short variant name, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Text(_) => "text",
            RawValue::Int(_) => "integer",
            RawValue::Float(_) => "float",
            RawValue::Bytes(_) => "bytes",
            RawValue::Bits(_) => "bit-vector",
        }
    }

    /// Borrow the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Create a text value from a borrowed string slice.
    #[must_use]
    pub fn text_borrowed(s: &'a str) -> Self {
        RawValue::Text(Cow::Borrowed(s))
    }

    /// Create a text value from an owned String.
    #[must_use]
    pub fn text_owned(s: String) -> RawValue<'static> {
        RawValue::Text(Cow::Owned(s))
    }

    /// Create a bytes value from a borrowed byte slice.
    #[must_use]
    pub fn bytes_borrowed(b: &'a [u8]) -> Self {
        RawValue::Bytes(Cow::Borrowed(b))
    }
}

impl From<i32> for RawValue<'static> {
    fn from(v: i32) -> Self {
        RawValue::Int(v.into())
    }
}

impl From<i64> for RawValue<'static> {
    fn from(v: i64) -> Self {
        RawValue::Int(v.into())
    }
}

impl From<u32> for RawValue<'static> {
    fn from(v: u32) -> Self {
        RawValue::Int(v.into())
    }
}

impl From<f64> for RawValue<'static> {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<String> for RawValue<'static> {
    fn from(v: String) -> Self {
        RawValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for RawValue<'a> {
    fn from(v: &'a str) -> Self {
        RawValue::Text(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for RawValue<'static> {
    fn from(v: Vec<u8>) -> Self {
        RawValue::Bytes(Cow::Owned(v))
    }
}

impl<'a> From<&'a [u8]> for RawValue<'a> {
    fn from(v: &'a [u8]) -> Self {
        RawValue::Bytes(Cow::Borrowed(v))
    }
}

impl From<Vec<BitElem>> for RawValue<'static> {
    fn from(v: Vec<BitElem>) -> Self {
        RawValue::Bits(Cow::Owned(v))
    }
}

impl<'a, T> From<Option<T>> for RawValue<'a>
where
    T: Into<RawValue<'a>>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(RawValue::Null, Into::into)
    }
}

/// Result of encoding one field for the target store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    /// Explicit SQL NULL.
    Null,

    /// Target-format text literal.
    Text(String),

    /// Input was recognised as neither true, false nor null.
    ///
    /// Only the SQL Server bit literal encoder produces this. Downstream
    /// handling is left to the caller.
    Indeterminate,
}

impl Encoded {
    /// Build a text result.
    pub fn text(s: impl Into<String>) -> Self {
        Encoded::Text(s.into())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Encoded::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Encoded::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Collapse to an optional string; `Indeterminate` becomes `None`.
    #[must_use]
    pub fn into_option(self) -> Option<String> {
        match self {
            Encoded::Text(s) => Some(s),
            Encoded::Null | Encoded::Indeterminate => None,
        }
    }
}

impl From<Option<String>> for Encoded {
    fn from(v: Option<String>) -> Self {
        v.map_or(Encoded::Null, Encoded::Text)
    }
}

impl From<String> for Encoded {
    fn from(v: String) -> Self {
        Encoded::Text(v)
    }
}

impl From<&str> for Encoded {
    fn from(v: &str) -> Self {
        Encoded::Text(v.to_string())
    }
}

/// Renders the way a COPY text stream spells each outcome.
impl fmt::Display for Encoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoded::Null => f.write_str("\\N"),
            Encoded::Text(s) => f.write_str(s),
            Encoded::Indeterminate => f.write_str("?"),
        }
    }
}
