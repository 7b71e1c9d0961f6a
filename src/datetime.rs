//! Datetime handling for dataframe columns
//!
//! Parsing of text and epoch values into datetimes, time zone localization
//! and conversion, and conversion of datetime columns into strings or epoch
//! seconds before they are bound to SQL parameters.
//!
//! Time zones are names of the IANA time zone database (`CET`,
//! `Europe/Stockholm`) or fixed UTC offsets: `UTC`, `GMT`, `Z`, `+HH:MM`,
//! `-HHMM` or `+HH`.

use std::collections::BTreeMap;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use tracing::debug;

use crate::dataframe::DataFrame;
use crate::error::{FrameSqlError, FrameSqlResult};
use crate::value::Value;

/// Default format used when datetime columns are converted to strings
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats tried, in order, when no explicit format is given
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Columns to parse as datetimes when loading a table
///
/// Maps a column name to an optional parse instruction: a strftime format
/// for text values, or an epoch unit (`s`, `ms`, `us`, `ns`, `D`) for
/// numeric values. Without instruction, common formats are tried and numbers
/// are read as epoch seconds.
pub type ParseDates = BTreeMap<String, Option<String>>;

/// Target data type for [`convert_datetime_columns`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatetimeDtype {
    /// Format datetimes as strings
    Str,
    /// Seconds since the unix epoch (UTC)
    Int,
}

/// Parse a string into a naive datetime
///
/// With a format, the string must match it, either as a full datetime or as a
/// date (midnight is assumed). Without one, a list of common formats is tried.
pub fn parse_datetime(s: &str, format: Option<&str>) -> Option<NaiveDateTime> {
    let s = s.trim();
    let parse_with = |fmt: &str| {
        NaiveDateTime::parse_from_str(s, fmt).ok().or_else(|| {
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
    };

    match format {
        Some(fmt) => parse_with(fmt),
        None => DATETIME_FORMATS
            .iter()
            .chain(DATE_FORMATS)
            .find_map(|fmt| parse_with(fmt))
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())),
    }
}

/// A time zone datetime columns are localized or converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// A zone of the IANA time zone database, with daylight saving rules
    Named(Tz),
    /// A fixed UTC offset
    Fixed(FixedOffset),
}

impl Zone {
    /// Interpret a naive datetime as local time of the zone
    ///
    /// Returns `None` for local times that are skipped or repeated by a
    /// daylight saving transition.
    pub fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Zone::Named(tz) => tz
                .from_local_datetime(naive)
                .single()
                .map(|dt| dt.with_timezone(&dt.offset().fix())),
            Zone::Fixed(offset) => offset.from_local_datetime(naive).single(),
        }
    }

    /// The same instant in the zone
    pub fn convert(&self, dt: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        match self {
            Zone::Named(tz) => {
                let zoned = dt.with_timezone(tz);
                zoned.with_timezone(&zoned.offset().fix())
            }
            Zone::Fixed(offset) => dt.with_timezone(offset),
        }
    }
}

/// Parse a time zone name or UTC offset
///
/// # Returns
/// * `Err(InvalidInput)` for names that are neither a known zone nor an offset
pub fn parse_timezone(name: &str) -> FrameSqlResult<Zone> {
    let trimmed = name.trim();
    if let Some(offset) = parse_offset(trimmed) {
        return Ok(Zone::Fixed(offset));
    }
    trimmed
        .parse::<Tz>()
        .map(Zone::Named)
        .map_err(|_| FrameSqlError::InvalidInput(format!("unknown time zone '{}'", name)))
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    if matches!(s.to_uppercase().as_str(), "UTC" | "GMT" | "Z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (&digits[..2], "0"),
        4 => (&digits[..2], &digits[2..]),
        _ => return None,
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Set a time zone on the naive datetime columns of a dataframe
///
/// Naive datetime columns are localized to `localize_tz` and then optionally
/// converted to `target_tz`. Modifies `df` in place.
///
/// # Returns
/// * `Err(InvalidInput)` for unknown time zones or columns that are already time zone aware
pub fn datetime_columns_to_timezone(
    df: &mut DataFrame,
    localize_tz: &str,
    target_tz: Option<&str>,
) -> FrameSqlResult<()> {
    let localize = parse_timezone(localize_tz)?;
    let target = target_tz.map(parse_timezone).transpose()?;

    for idx in df.datetime_columns() {
        let column = df.all_columns()[idx].clone();
        df.map_column(idx, |value| match value {
            Value::DateTime(naive) => {
                let local = localize.localize(naive).ok_or_else(|| {
                    FrameSqlError::InvalidInput(format!(
                        "cannot localize '{}' in column '{}' to {}",
                        naive, column, localize_tz
                    ))
                })?;
                Ok(Value::DateTimeTz(match &target {
                    Some(zone) => zone.convert(&local),
                    None => local,
                }))
            }
            Value::DateTimeTz(_) => Err(FrameSqlError::InvalidInput(format!(
                "column '{}' is already time zone aware. localize_tz={}, target_tz={:?}",
                column, localize_tz, target_tz
            ))),
            other => Ok(other.clone()),
        })?;
        debug!("Localized column {} to {} (target {:?})", column, localize_tz, target_tz);
    }
    Ok(())
}

/// Convert the datetime columns of a dataframe into strings or epoch seconds
///
/// Naive datetimes are taken to be in UTC when converting to epoch seconds.
///
/// # Returns
/// * A copy of `df` with the datetime columns converted
/// * `Err(InvalidInput)` if `datetime_format` is not a valid strftime format
pub fn convert_datetime_columns(
    df: &DataFrame,
    dtype: DatetimeDtype,
    datetime_format: &str,
) -> FrameSqlResult<DataFrame> {
    if dtype == DatetimeDtype::Str
        && StrftimeItems::new(datetime_format).any(|item| matches!(item, Item::Error))
    {
        return Err(FrameSqlError::InvalidInput(format!(
            "invalid datetime format string: {}",
            datetime_format
        )));
    }

    let mut output = df.clone();
    for idx in output.datetime_columns() {
        output.map_column(idx, |value| {
            Ok(match (dtype, value) {
                (DatetimeDtype::Str, Value::DateTime(dt)) => {
                    Value::String(dt.format(datetime_format).to_string())
                }
                (DatetimeDtype::Str, Value::DateTimeTz(dt)) => {
                    Value::String(dt.format(datetime_format).to_string())
                }
                (DatetimeDtype::Int, Value::DateTime(dt)) => {
                    Value::Integer(dt.and_utc().timestamp())
                }
                (DatetimeDtype::Int, Value::DateTimeTz(dt)) => Value::Integer(dt.timestamp()),
                (_, other) => other.clone(),
            })
        })?;
    }
    Ok(output)
}

/// Parse the named columns of a dataframe into datetimes
///
/// Columns that are not part of the dataframe are skipped. Values that cannot
/// be parsed become NULL.
pub fn parse_date_columns(df: &mut DataFrame, parse_dates: &ParseDates) -> FrameSqlResult<()> {
    for (column, instruction) in parse_dates {
        let Some(idx) = df.column_index(column) else {
            debug!("parse_dates column {} not in result, skipping", column);
            continue;
        };
        let instruction = instruction.as_deref();
        df.map_column(idx, |value| {
            Ok(match value {
                Value::String(s) => parse_datetime(s, instruction).map_or(Value::Null, Value::DateTime),
                Value::Integer(n) => from_epoch(*n as f64, instruction)?,
                Value::Float(f) if f.is_finite() => from_epoch(*f, instruction)?,
                Value::Float(_) => Value::Null,
                other => other.clone(),
            })
        })?;
    }
    Ok(())
}

fn from_epoch(amount: f64, unit: Option<&str>) -> FrameSqlResult<Value> {
    let nanos_per_unit = match unit.unwrap_or("s") {
        "s" => 1e9,
        "ms" => 1e6,
        "us" => 1e3,
        "ns" => 1.0,
        "D" => 86_400e9,
        other => {
            return Err(FrameSqlError::InvalidInput(format!(
                "unknown epoch unit '{}'. Expected 's', 'ms', 'us', 'ns' or 'D'",
                other
            )))
        }
    };
    let nanos = (amount * nanos_per_unit) as i64;
    Ok(Value::DateTime(DateTime::from_timestamp_nanos(nanos).naive_utc()))
}
