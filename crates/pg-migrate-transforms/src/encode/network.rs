//! IPv4 addresses stored as unsigned integers (e.g. GeoIP tables).

use std::sync::LazyLock;

use crate::core::{Encoded, RawValue};
use crate::error::{Result, TransformError};

use super::unsupported;

pub const INT_TO_IP: &str = "int-to-ip";
pub const IP_RANGE: &str = "ip-range";

/// `"a.b"` for every 16-bit value `(a << 8) | b`.
static OCTET_PAIRS: LazyLock<Vec<String>> = LazyLock::new(|| {
    (0..=u16::MAX)
        .map(|pair| format!("{}.{}", pair >> 8, pair & 0xff))
        .collect()
});

/// Render a 32-bit address as a dotted quad.
pub fn int_to_ip(addr: u32) -> String {
    let hi = &OCTET_PAIRS[(addr >> 16) as usize];
    let lo = &OCTET_PAIRS[(addr & 0xffff) as usize];
    let mut out = String::with_capacity(hi.len() + lo.len() + 1);
    out.push_str(hi);
    out.push('.');
    out.push_str(lo);
    out
}

fn to_address(transform: &str, value: &RawValue<'_>) -> Result<Option<u32>> {
    let addr = match value {
        RawValue::Null => return Ok(None),
        RawValue::Int(i) => u32::try_from(*i).ok(),
        RawValue::Text(s) => s.trim().parse::<u32>().ok(),
        other => return Err(unsupported(transform, other)),
    };
    addr.map(Some).ok_or_else(|| {
        TransformError::value(
            transform,
            format!("{:?} is not a 32-bit unsigned integer", value),
        )
    })
}

/// [`int_to_ip`] over a raw integer or integer string.
pub fn int_to_ip_value(value: &RawValue<'_>) -> Result<Encoded> {
    Ok(to_address(INT_TO_IP, value)?
        .map(int_to_ip)
        .into())
}

/// Two integer bounds to a `start-end` dotted-quad range; NULL if either is.
pub fn ip_range(start: &RawValue<'_>, end: &RawValue<'_>) -> Result<Encoded> {
    match (to_address(IP_RANGE, start)?, to_address(IP_RANGE, end)?) {
        (Some(start), Some(end)) => Ok(Encoded::Text(format!(
            "{}-{}",
            int_to_ip(start),
            int_to_ip(end)
        ))),
        _ => Ok(Encoded::Null),
    }
}
