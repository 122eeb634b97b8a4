//! MySQL geometry text (`ST_AsText`) to PostgreSQL geometric literals.

use crate::core::{Encoded, RawValue};
use crate::error::{Result, TransformError};

use super::unsupported;

pub const CONVERT_MYSQL_POINT: &str = "convert-mysql-point";
pub const CONVERT_MYSQL_LINESTRING: &str = "convert-mysql-linestring";

/// Strip a case-insensitive `PREFIX(` ... `)` wrapper.
fn unwrap_call<'s>(transform: &str, s: &'s str, prefix: &str) -> Result<&'s str> {
    s.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .and_then(|_| s[prefix.len()..].strip_suffix(')'))
        .ok_or_else(|| {
            TransformError::value(transform, format!("expected {}...): {:?}", prefix, s))
        })
}

/// `x y` to `(x,y)`.
fn point(transform: &str, coords: &str) -> Result<String> {
    let (x, y) = coords
        .trim()
        .split_once(' ')
        .ok_or_else(|| {
            TransformError::value(transform, format!("malformed point {:?}", coords))
        })?;
    Ok(format!("({},{})", x, y.trim()))
}

/// `POINT(48.55 7.69)` to `(48.55,7.69)`.
pub fn convert_mysql_point(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Text(s) => {
            let coords = unwrap_call(CONVERT_MYSQL_POINT, s, "POINT(")?;
            Ok(Encoded::Text(point(CONVERT_MYSQL_POINT, coords)?))
        }
        other => Err(unsupported(CONVERT_MYSQL_POINT, other)),
    }
}

/// `LINESTRING(x1 y1,x2 y2)` to the open path `[(x1,y1),(x2,y2)]`.
pub fn convert_mysql_linestring(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Text(s) => {
            let data = unwrap_call(CONVERT_MYSQL_LINESTRING, s, "LINESTRING(")?;
            let points = data
                .split(',')
                .map(|p| point(CONVERT_MYSQL_LINESTRING, p))
                .collect::<Result<Vec<_>>>()?;
            Ok(Encoded::Text(format!("[{}]", points.join(","))))
        }
        other => Err(unsupported(CONVERT_MYSQL_LINESTRING, other)),
    }
}
