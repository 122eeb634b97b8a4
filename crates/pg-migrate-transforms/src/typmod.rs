//! Type modifier extraction from source column declarations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};

/// Category tags whose parentheses list labels, not numeric precision.
const LABEL_CATEGORIES: &[&str] = &["enum", "set"];

/// A `(precision, scale)` type modifier, e.g. the `(10,2)` in `decimal(10,2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Typmod {
    pub precision: i32,
    #[serde(default)]
    pub scale: i32,
}

impl Typmod {
    pub fn new(precision: i32, scale: i32) -> Self {
        Self { precision, scale }
    }

    /// Typmod with only a precision; scale defaults to 0.
    pub fn precision(precision: i32) -> Self {
        Self::new(precision, 0)
    }
}

impl fmt::Display for Typmod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.precision, self.scale)
    }
}

/// Parse the typmod out of a column declaration.
///
/// `data_type` is the source dialect's category tag and `column_type` the full
/// declaration string. Returns `Ok(None)` for enum/set categories, for a
/// declaration without parentheses and for an empty interior. A non-integer
/// token (or more than two of them) is a configuration error.
///
/// # Examples
///
/// ```
/// use pg_migrate_transforms::typmod::{parse_typmod, Typmod};
///
/// assert_eq!(parse_typmod("decimal", "decimal(10,2)").unwrap(), Some(Typmod::new(10, 2)));
/// assert_eq!(parse_typmod("varchar", "varchar(255)").unwrap(), Some(Typmod::precision(255)));
/// assert_eq!(parse_typmod("enum", "enum('a','b')").unwrap(), None);
/// ```
pub fn parse_typmod(data_type: &str, column_type: &str) -> Result<Option<Typmod>> {
    let category = data_type.trim();
    if LABEL_CATEGORIES
        .iter()
        .any(|c| category.eq_ignore_ascii_case(c))
    {
        return Ok(None);
    }

    let Some(open) = column_type.find('(') else {
        return Ok(None);
    };
    let rest = &column_type[open + 1..];
    let Some(close) = rest.find(')') else {
        return Ok(None);
    };
    let interior = rest[..close].trim();
    if interior.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = interior.split(',').map(str::trim).collect();
    let parse = |token: &str| -> Result<i32> {
        token.parse::<i32>().map_err(|_| {
            TransformError::Config(format!(
                "Invalid typmod in column type '{}': '{}' is not an integer",
                column_type, token
            ))
        })
    };

    match *parts.as_slice() {
        [p] => Ok(Some(Typmod::precision(parse(p)?))),
        [p, s] => Ok(Some(Typmod::new(parse(p)?, parse(s)?))),
        _ => Err(TransformError::Config(format!(
            "Invalid typmod in column type '{}': expected at most 2 components, got {}",
            column_type,
            parts.len()
        ))),
    }
}
