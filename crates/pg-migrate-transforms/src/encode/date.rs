//! Date and time encoders.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Encoded, RawValue};
use crate::error::{Result, TransformError};

use super::numeric::parse_integer;
use super::unsupported;

pub const ZERO_DATES_TO_NULL: &str = "zero-dates-to-null";
pub const DATE_WITH_NO_SEPARATOR: &str = "date-with-no-separator";
pub const TIME_WITH_NO_SEPARATOR: &str = "time-with-no-separator";
pub const SQLITE_TIMESTAMP_TO_TIMESTAMP: &str = "sqlite-timestamp-to-timestamp";
pub const UNIX_TIMESTAMP_TO_TIMESTAMPTZ: &str = "unix-timestamp-to-timestamptz";

/// Named sub-field of an unseparated date or time string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Seconds,
    Msecs,
}

impl DateField {
    const COUNT: usize = 7;

    fn index(self) -> usize {
        self as usize
    }
}

/// One `(name, start, end)` descriptor. `end: None` runs to the end of input.
///
/// Deserializes from a YAML triple such as `[year, 0, 4]` or `[msecs, 6, ~]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec(pub DateField, pub usize, pub Option<usize>);

impl FieldSpec {
    pub fn new(field: DateField, start: usize, end: usize) -> Self {
        Self(field, start, Some(end))
    }

    /// A field running from `start` to the end of the input.
    pub fn open(field: DateField, start: usize) -> Self {
        Self(field, start, None)
    }
}

/// Ordered list of field descriptors consumed by a single generic slicer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    fields: Vec<FieldSpec>,
}

/// Sub-strings cut from one input, indexed by [`DateField`].
struct Fields<'s>([&'s str; DateField::COUNT]);

impl<'s> Fields<'s> {
    fn get(&self, field: DateField) -> &'s str {
        self.0[field.index()]
    }
}

impl FieldLayout {
    /// Build a layout, rejecting inverted ranges and duplicate fields.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        if fields.is_empty() {
            return Err(TransformError::Config(
                "date/time layout needs at least one field".into(),
            ));
        }
        for (i, spec) in fields.iter().enumerate() {
            if let Some(end) = spec.2 {
                if end < spec.1 {
                    return Err(TransformError::Config(format!(
                        "layout field {:?} ends ({}) before it starts ({})",
                        spec.0, end, spec.1
                    )));
                }
            }
            if fields[..i].iter().any(|other| other.0 == spec.0) {
                return Err(TransformError::Config(format!(
                    "layout field {:?} appears twice",
                    spec.0
                )));
            }
        }
        Ok(Self { fields })
    }

    /// Layout for [`date_with_no_separator`]: year, month and day are
    /// required, and an hour field also requires minute and seconds.
    pub fn for_date(fields: Vec<FieldSpec>) -> Result<Self> {
        let layout = Self::new(fields)?;
        layout.require(
            DATE_WITH_NO_SEPARATOR,
            &[DateField::Year, DateField::Month, DateField::Day],
        )?;
        if layout.has(DateField::Hour) {
            layout.require(
                DATE_WITH_NO_SEPARATOR,
                &[DateField::Minute, DateField::Seconds],
            )?;
        }
        Ok(layout)
    }

    /// Layout for [`time_with_no_separator`]: hour, minute and seconds are
    /// required.
    pub fn for_time(fields: Vec<FieldSpec>) -> Result<Self> {
        let layout = Self::new(fields)?;
        layout.require(
            TIME_WITH_NO_SEPARATOR,
            &[DateField::Hour, DateField::Minute, DateField::Seconds],
        )?;
        Ok(layout)
    }

    fn require(&self, transform: &str, required: &[DateField]) -> Result<()> {
        match required.iter().find(|field| !self.has(**field)) {
            Some(missing) => Err(TransformError::Config(format!(
                "{} layout is missing the {:?} field",
                transform, missing
            ))),
            None => Ok(()),
        }
    }

    /// `YYYYMMDDHHMMSS`.
    pub fn datetime() -> Self {
        use DateField::*;
        Self {
            fields: vec![
                FieldSpec::new(Year, 0, 4),
                FieldSpec::new(Month, 4, 6),
                FieldSpec::new(Day, 6, 8),
                FieldSpec::new(Hour, 8, 10),
                FieldSpec::new(Minute, 10, 12),
                FieldSpec::new(Seconds, 12, 14),
            ],
        }
    }

    /// `HHMMSS` followed by an optional fraction.
    pub fn time() -> Self {
        use DateField::*;
        Self {
            fields: vec![
                FieldSpec::new(Hour, 0, 2),
                FieldSpec::new(Minute, 2, 4),
                FieldSpec::new(Seconds, 4, 6),
                FieldSpec::open(Msecs, 6),
            ],
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Input length implied by the furthest fixed end offset.
    fn expected_len(&self) -> usize {
        self.fields
            .iter()
            .map(|spec| spec.2.unwrap_or(spec.1))
            .max()
            .unwrap_or(0)
    }

    fn has(&self, field: DateField) -> bool {
        self.fields.iter().any(|spec| spec.0 == field)
    }

    /// Cut every field out of `input`, or `None` if one falls outside it.
    fn slice<'s>(&self, input: &'s str) -> Option<Fields<'s>> {
        let mut out = [""; DateField::COUNT];
        for FieldSpec(field, start, end) in &self.fields {
            let part = match end {
                Some(end) => input.get(*start..*end)?,
                None => input.get(*start..)?,
            };
            out[field.index()] = part;
        }
        Some(Fields(out))
    }
}

fn all_zeros(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b == b'0')
}

/// MySQL accepts `0000-00-00` style dates; PostgreSQL wants NULL instead.
///
/// NULL when the input is empty, or when the year (`0..4`), month (`5..7`)
/// or day (`8..10`) sub-field is all zeros.
pub fn zero_dates_to_null(value: &RawValue<'_>) -> Result<Encoded> {
    match value {
        RawValue::Null => Ok(Encoded::Null),
        RawValue::Text(s) if s.is_empty() => Ok(Encoded::Null),
        RawValue::Text(s) => {
            let zero = |range: std::ops::Range<usize>| s.get(range).is_some_and(all_zeros);
            if zero(0..4) || zero(5..7) || zero(8..10) {
                Ok(Encoded::Null)
            } else {
                Ok(Encoded::text(&**s))
            }
        }
        other => Err(unsupported(ZERO_DATES_TO_NULL, other)),
    }
}

/// Format a digit string such as `20041002152952` as `2004-10-02 15:29:52`.
///
/// NULL on empty input, on a length that does not match the layout, and on
/// a zero year, month or day. Layouts without time fields produce a bare
/// date.
pub fn date_with_no_separator(value: &RawValue<'_>, layout: &FieldLayout) -> Result<Encoded> {
    let s = match value {
        RawValue::Null => return Ok(Encoded::Null),
        RawValue::Text(s) => &**s,
        other => return Err(unsupported(DATE_WITH_NO_SEPARATOR, other)),
    };
    if s.is_empty() || s.len() != layout.expected_len() {
        return Ok(Encoded::Null);
    }
    let Some(fields) = layout.slice(s) else {
        return Ok(Encoded::Null);
    };

    let (year, month, day) = (
        fields.get(DateField::Year),
        fields.get(DateField::Month),
        fields.get(DateField::Day),
    );
    if all_zeros(year) || all_zeros(month) || all_zeros(day) {
        return Ok(Encoded::Null);
    }

    let mut out = format!("{}-{}-{}", year, month, day);
    if layout.has(DateField::Hour) {
        out.push_str(&format!(
            " {}:{}:{}",
            fields.get(DateField::Hour),
            fields.get(DateField::Minute),
            fields.get(DateField::Seconds)
        ));
    }
    Ok(Encoded::Text(out))
}

/// Format a digit string such as `1529521234` as `15:29:52.1234`.
pub fn time_with_no_separator(value: &RawValue<'_>, layout: &FieldLayout) -> Result<Encoded> {
    let s = match value {
        RawValue::Null => return Ok(Encoded::Null),
        RawValue::Text(s) => &**s,
        other => return Err(unsupported(TIME_WITH_NO_SEPARATOR, other)),
    };
    let fields = layout.slice(s).ok_or_else(|| {
        TransformError::value(
            TIME_WITH_NO_SEPARATOR,
            format!("{:?} is shorter than the time layout", s),
        )
    })?;

    let mut out = format!(
        "{}:{}:{}",
        fields.get(DateField::Hour),
        fields.get(DateField::Minute),
        fields.get(DateField::Seconds)
    );
    let msecs = fields.get(DateField::Msecs);
    if !msecs.is_empty() {
        out.push('.');
        out.push_str(msecs);
    }
    Ok(Encoded::Text(out))
}

/// SQLite stores bare years as integers; `0` means "no date".
///
/// Integer (or integer-looking string) `y` becomes `y-01-01`, zero becomes
/// NULL, and any other string passes through.
pub fn sqlite_timestamp_to_timestamp(value: &RawValue<'_>) -> Result<Encoded> {
    let year = match value {
        RawValue::Null => return Ok(Encoded::Null),
        RawValue::Int(y) => *y,
        RawValue::Text(s) => match parse_integer(s) {
            Some(y) => y,
            None => return Ok(Encoded::text(&**s)),
        },
        other => return Err(unsupported(SQLITE_TIMESTAMP_TO_TIMESTAMP, other)),
    };
    if year == 0 {
        Ok(Encoded::Null)
    } else {
        Ok(Encoded::Text(format!("{}-01-01", year)))
    }
}

static UNIX_EPOCH: LazyLock<NaiveDateTime> =
    LazyLock::new(|| DateTime::<Utc>::UNIX_EPOCH.naive_utc());

/// Seconds since 1970-01-01 UTC to `YYYY-MM-DD HH:MM:SSZ`.
pub fn unix_timestamp_to_timestamptz(value: &RawValue<'_>) -> Result<Encoded> {
    let seconds = match value {
        RawValue::Null => return Ok(Encoded::Null),
        RawValue::Int(n) => Some(*n),
        RawValue::Text(s) => parse_integer(s),
        other => return Err(unsupported(UNIX_TIMESTAMP_TO_TIMESTAMPTZ, other)),
    };

    let ts = seconds
        .and_then(|n| i64::try_from(n).ok())
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| UNIX_EPOCH.checked_add_signed(delta))
        .ok_or_else(|| {
            TransformError::value(
                UNIX_TIMESTAMP_TO_TIMESTAMPTZ,
                "not a representable number of seconds",
            )
        })?;

    Ok(Encoded::Text(ts.format("%Y-%m-%d %H:%M:%SZ").to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawValue<'_> {
        RawValue::text_borrowed(s)
    }

    #[test]
    fn test_zero_dates_to_null() {
        assert_eq!(zero_dates_to_null(&text("0000-00-00")).unwrap(), Encoded::Null);
        assert_eq!(zero_dates_to_null(&text("2020-00-15")).unwrap(), Encoded::Null);
        assert_eq!(zero_dates_to_null(&text("2020-05-00")).unwrap(), Encoded::Null);
        assert_eq!(zero_dates_to_null(&text("")).unwrap(), Encoded::Null);
        assert_eq!(zero_dates_to_null(&RawValue::Null).unwrap(), Encoded::Null);
        assert_eq!(
            zero_dates_to_null(&text("2020-05-15")).unwrap(),
            Encoded::text("2020-05-15")
        );
        assert_eq!(
            zero_dates_to_null(&text("2020-05-15 00:00:00")).unwrap(),
            Encoded::text("2020-05-15 00:00:00")
        );
    }

    #[test]
    fn test_zero_dates_short_input_passes_through() {
        assert_eq!(zero_dates_to_null(&text("2020")).unwrap(), Encoded::text("2020"));
        assert!(zero_dates_to_null(&RawValue::Int(0)).is_err());
    }

    #[test]
    fn test_date_with_no_separator() {
        let layout = FieldLayout::datetime();
        assert_eq!(
            date_with_no_separator(&text("20041002152952"), &layout).unwrap(),
            Encoded::text("2004-10-02 15:29:52")
        );
        assert_eq!(
            date_with_no_separator(&text("2004100215295"), &layout).unwrap(),
            Encoded::Null
        );
        assert_eq!(
            date_with_no_separator(&text("00000000000000"), &layout).unwrap(),
            Encoded::Null
        );
        assert_eq!(
            date_with_no_separator(&text("20040002152952"), &layout).unwrap(),
            Encoded::Null
        );
        assert_eq!(date_with_no_separator(&text(""), &layout).unwrap(), Encoded::Null);
    }

    #[test]
    fn test_date_with_custom_layout() {
        let layout = FieldLayout::for_date(vec![
            FieldSpec::new(DateField::Day, 0, 2),
            FieldSpec::new(DateField::Month, 2, 4),
            FieldSpec::new(DateField::Year, 4, 8),
        ])
        .unwrap();
        assert_eq!(
            date_with_no_separator(&text("02102004"), &layout).unwrap(),
            Encoded::text("2004-10-02")
        );
    }

    #[test]
    fn test_layout_validation() {
        assert!(FieldLayout::new(vec![]).is_err());
        assert!(FieldLayout::new(vec![FieldSpec::new(DateField::Year, 4, 0)]).is_err());
        assert!(FieldLayout::new(vec![
            FieldSpec::new(DateField::Year, 0, 4),
            FieldSpec::new(DateField::Year, 4, 8),
        ])
        .is_err());
    }

    #[test]
    fn test_date_layout_needs_printed_fields() {
        use DateField::*;
        assert!(FieldLayout::for_date(vec![FieldSpec::new(Year, 0, 4)])
            .unwrap_err()
            .is_config());

        let hour_only = vec![
            FieldSpec::new(Year, 0, 4),
            FieldSpec::new(Month, 4, 6),
            FieldSpec::new(Day, 6, 8),
            FieldSpec::new(Hour, 8, 10),
        ];
        assert!(FieldLayout::for_date(hour_only).unwrap_err().is_config());

        assert!(FieldLayout::for_date(FieldLayout::datetime().fields().to_vec()).is_ok());
    }

    #[test]
    fn test_time_layout_needs_printed_fields() {
        use DateField::*;
        let no_seconds = vec![FieldSpec::new(Hour, 0, 2), FieldSpec::new(Minute, 2, 4)];
        assert!(FieldLayout::for_time(no_seconds).unwrap_err().is_config());
        assert!(FieldLayout::for_time(FieldLayout::time().fields().to_vec()).is_ok());
    }

    #[test]
    fn test_time_with_no_separator() {
        let layout = FieldLayout::time();
        assert_eq!(
            time_with_no_separator(&text("1529521234"), &layout).unwrap(),
            Encoded::text("15:29:52.1234")
        );
        assert_eq!(
            time_with_no_separator(&text("152952"), &layout).unwrap(),
            Encoded::text("15:29:52")
        );
        assert_eq!(time_with_no_separator(&RawValue::Null, &layout).unwrap(), Encoded::Null);
        assert!(time_with_no_separator(&text("1529"), &layout).is_err());
    }

    #[test]
    fn test_sqlite_timestamp_to_timestamp() {
        assert_eq!(sqlite_timestamp_to_timestamp(&RawValue::Int(0)).unwrap(), Encoded::Null);
        assert_eq!(
            sqlite_timestamp_to_timestamp(&RawValue::Int(1998)).unwrap(),
            Encoded::text("1998-01-01")
        );
        assert_eq!(sqlite_timestamp_to_timestamp(&text("0")).unwrap(), Encoded::Null);
        assert_eq!(
            sqlite_timestamp_to_timestamp(&text("2004")).unwrap(),
            Encoded::text("2004-01-01")
        );
        assert_eq!(
            sqlite_timestamp_to_timestamp(&text("2004-10-02 15:29:52")).unwrap(),
            Encoded::text("2004-10-02 15:29:52")
        );
    }

    #[test]
    fn test_unix_timestamp_to_timestamptz() {
        assert_eq!(
            unix_timestamp_to_timestamptz(&text("0")).unwrap(),
            Encoded::text("1970-01-01 00:00:00Z")
        );
        assert_eq!(
            unix_timestamp_to_timestamptz(&text("1096730992")).unwrap(),
            Encoded::text("2004-10-02 15:29:52Z")
        );
        assert_eq!(
            unix_timestamp_to_timestamptz(&RawValue::Int(-1)).unwrap(),
            Encoded::text("1969-12-31 23:59:59Z")
        );
        assert_eq!(unix_timestamp_to_timestamptz(&RawValue::Null).unwrap(), Encoded::Null);
        assert!(unix_timestamp_to_timestamptz(&text("yesterday")).is_err());
    }
}
