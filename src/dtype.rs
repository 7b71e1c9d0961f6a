//! Column data types
//!
//! [`DataType`] names the type a dataframe column can be converted into with
//! [`DataFrame::astype`](crate::dataframe::DataFrame::astype), and the SQL type
//! used when a table is created from a dataframe.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;

use crate::datetime::parse_datetime;
use crate::error::{FrameSqlError, FrameSqlResult};
use crate::value::Value;

/// Data type of a dataframe column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit signed integers
    Integer,
    /// 64-bit floating point numbers
    Float,
    /// UTF-8 strings
    String,
    /// Booleans
    Boolean,
    /// Naive datetimes
    DateTime,
}

impl DataType {
    /// SQL column type used when creating a table for this data type
    pub fn sql_type(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Float => "REAL",
            DataType::String => "TEXT",
            DataType::Boolean => "INTEGER",
            DataType::DateTime => "TIMESTAMP",
        }
    }

    /// Infer the data type of a column from its values
    ///
    /// Missing values are skipped. Integers mixed with floats give
    /// [`DataType::Float`]; any other mix, or a column with only missing values,
    /// gives [`DataType::String`].
    pub fn infer<'a, I>(values: I) -> DataType
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut inferred: Option<DataType> = None;
        for value in values {
            let current = match value {
                Value::Null => continue,
                Value::Float(f) if f.is_nan() => continue,
                Value::Integer(_) => DataType::Integer,
                Value::Float(_) => DataType::Float,
                Value::Boolean(_) => DataType::Boolean,
                Value::String(_) => DataType::String,
                Value::DateTime(_) | Value::DateTimeTz(_) => DataType::DateTime,
            };
            inferred = Some(match (inferred, current) {
                (None, current) => current,
                (Some(previous), current) if previous == current => current,
                (Some(DataType::Integer), DataType::Float)
                | (Some(DataType::Float), DataType::Integer) => DataType::Float,
                _ => return DataType::String,
            });
        }
        inferred.unwrap_or(DataType::String)
    }

    /// Convert a single value into this data type
    ///
    /// NULL stays NULL. Returns a description of the failure when the value
    /// cannot be represented in the target type.
    pub fn cast(&self, value: &Value) -> Result<Value, String> {
        let fail = || format!("cannot convert {} value '{}' to {}", value.type_name(), value, self);

        let converted = match (self, value) {
            (_, Value::Null) => Value::Null,

            (DataType::Integer, Value::Integer(i)) => Value::Integer(*i),
            (DataType::Integer, Value::Float(f)) if f.is_finite() && f.fract() == 0.0 => {
                Value::Integer(*f as i64)
            }
            (DataType::Integer, Value::Boolean(b)) => Value::Integer(i64::from(*b)),
            (DataType::Integer, Value::String(s)) => {
                Value::Integer(s.trim().parse::<i64>().map_err(|_| fail())?)
            }

            (DataType::Float, Value::Integer(i)) => Value::Float(*i as f64),
            (DataType::Float, Value::Float(f)) => Value::Float(*f),
            (DataType::Float, Value::Boolean(b)) => Value::Float(if *b { 1.0 } else { 0.0 }),
            (DataType::Float, Value::String(s)) => {
                Value::Float(s.trim().parse::<f64>().map_err(|_| fail())?)
            }

            (DataType::String, Value::String(s)) => Value::String(s.clone()),
            (DataType::String, other) => Value::String(other.to_string()),

            (DataType::Boolean, Value::Boolean(b)) => Value::Boolean(*b),
            (DataType::Boolean, Value::Integer(i)) => Value::Boolean(*i != 0),
            (DataType::Boolean, Value::Float(f)) if !f.is_nan() => Value::Boolean(*f != 0.0),
            (DataType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Value::Boolean(true),
                "false" | "no" | "0" => Value::Boolean(false),
                _ => return Err(fail()),
            },

            (DataType::DateTime, Value::DateTime(dt)) => Value::DateTime(*dt),
            (DataType::DateTime, Value::DateTimeTz(dt)) => Value::DateTimeTz(*dt),
            (DataType::DateTime, Value::String(s)) => {
                Value::DateTime(parse_datetime(s, None).ok_or_else(fail)?)
            }
            (DataType::DateTime, Value::Integer(secs)) => Value::DateTime(
                DateTime::from_timestamp(*secs, 0)
                    .ok_or_else(fail)?
                    .naive_utc(),
            ),

            _ => return Err(fail()),
        };
        Ok(converted)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::DateTime => "datetime",
        };
        write!(f, "{}", name)
    }
}

/// Parse data type names, accepting the common spellings of each type
impl FromStr for DataType {
    type Err = FrameSqlError;

    fn from_str(s: &str) -> FrameSqlResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "int" | "int8" | "int16" | "int32" | "int64" | "integer" => Ok(DataType::Integer),
            "float" | "float32" | "float64" | "real" | "double" => Ok(DataType::Float),
            "str" | "string" | "text" | "object" => Ok(DataType::String),
            "bool" | "boolean" => Ok(DataType::Boolean),
            "datetime" | "datetime64" | "datetime64[ns]" | "timestamp" => Ok(DataType::DateTime),
            _ => Err(FrameSqlError::InvalidInput(format!(
                "unknown data type '{}'",
                s
            ))),
        }
    }
}
