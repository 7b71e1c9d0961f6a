//! Cell values for framesql dataframes
//!
//! This module provides the [`Value`] type stored in every dataframe cell and
//! bound to every SQL parameter. It supports the common SQL data types, type
//! inference from text, and comparisons that coerce between integers and floats.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Represents a value in a dataframe cell or a SQL parameter
///
/// Integer and Float values compare equal when they hold the same number,
/// following SQL comparison rules. Datetimes come in a naive flavour (no time
/// zone) and a time zone aware flavour with a fixed UTC offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Represents a NULL or missing value
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value (true/false)
    Boolean(bool),
    /// Date and time without a time zone
    DateTime(NaiveDateTime),
    /// Date and time with a fixed UTC offset
    DateTimeTz(DateTime<FixedOffset>),
}

impl Value {
    /// Parse a string into a value with automatic type inference
    ///
    /// The string is tried, in order, as an integer, a finite float and a
    /// boolean (`true`/`false`, case insensitive). Empty strings and `nan`
    /// become NULL and anything else is stored as a string.
    pub fn infer(s: &str) -> Self {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }

        match s.to_lowercase().as_str() {
            "true" => return Value::Boolean(true),
            "false" => return Value::Boolean(false),
            "" | "nan" => return Value::Null,
            _ => {}
        }

        match s.parse::<f64>() {
            Ok(fl) if fl.is_finite() => Value::Float(fl),
            _ => Value::String(s.to_string()),
        }
    }

    /// Whether the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value is a float NaN
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Float(f) if f.is_nan())
    }

    /// Whether the value is a missing value (NULL or NaN)
    pub fn is_missing(&self) -> bool {
        self.is_null() || self.is_nan()
    }

    /// Name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::DateTime(_) => "datetime",
            Value::DateTimeTz(_) => "datetime with time zone",
        }
    }

    /// Whether the value holds a datetime, naive or time zone aware
    pub fn is_datetime(&self) -> bool {
        matches!(self, Value::DateTime(_) | Value::DateTimeTz(_))
    }

    // Precedence between different types: NULL < Boolean < Number < DateTime < String
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::DateTime(_) | Value::DateTimeTz(_) => 3,
            Value::String(_) => 4,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::DateTimeTz(a), Value::DateTimeTz(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) => *a as f64 == *b,
            (Value::Float(a), Value::Integer(b)) => *a == *b as f64,
            _ => false,
        }
    }
}

/// Ordering comparison with SQL-like coercion
///
/// NULL sorts first, integers and floats compare numerically, naive and
/// aware datetimes compare on their wall clock and UTC instant respectively,
/// and different types follow the precedence NULL < Boolean < Number <
/// DateTime < String.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
            (Value::DateTimeTz(a), Value::DateTimeTz(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTimeTz(b)) => a.partial_cmp(&b.naive_utc()),
            (Value::DateTimeTz(a), Value::DateTime(b)) => a.naive_utc().partial_cmp(b),
            _ => self.rank().partial_cmp(&other.rank()),
        }
    }
}

/// Human-readable representation, also used when writing CSV output and when
/// a placeholder is replaced with a literal value
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(float) => write!(f, "{}", float),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::DateTimeTz(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f%:z")),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTimeTz(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_infer() {
        assert_eq!(Value::infer("42"), Value::Integer(42));
        assert_eq!(Value::infer("18.74"), Value::Float(18.74));
        assert_eq!(Value::infer("TRUE"), Value::Boolean(true));
        assert_eq!(Value::infer("false"), Value::Boolean(false));
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("Zezima"), Value::String("Zezima".to_string()));
    }

    #[test]
    fn test_infer_keeps_ordinary_words_as_text() {
        assert_eq!(Value::infer("no"), Value::from("no"));
        assert_eq!(Value::infer("Yes"), Value::from("Yes"));
        assert_eq!(Value::infer("inf"), Value::from("inf"));
        assert_eq!(Value::infer("-Infinity"), Value::from("-Infinity"));
        assert_eq!(Value::infer("NaN"), Value::Null);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert!(Value::Integer(1) < Value::Float(1.5));
        assert!(Value::Null < Value::Boolean(false));
        assert!(Value::Integer(100) < Value::String("1".to_string()));
    }

    #[test]
    fn test_display_datetime() {
        let dt = NaiveDate::from_ymd_opt(1990, 7, 14)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(Value::from(dt).to_string(), "1990-07-14 12:30:00");

        let offset = FixedOffset::east_opt(3600).unwrap();
        let aware = dt.and_local_timezone(offset).unwrap();
        assert_eq!(Value::from(aware).to_string(), "1990-07-14 12:30:00+01:00");
    }

    #[test]
    fn test_missing_values() {
        assert!(Value::Float(f64::NAN).is_missing());
        assert!(Value::from(None::<i64>).is_null());
        assert!(!Value::Integer(0).is_missing());
    }
}
