//! Column values.
//!
//! This module defines the `Value` type stored in one cell of a row.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::DataKind;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value.
    Null,
    /// String value.
    String(String),
    /// Boolean value.
    Boolean(bool),
    /// Instant in time.
    DateTime(DateTime<Utc>),
    /// 64-bit signed integer.
    Integer(i64),
    /// Floating-point number.
    Decimal(f64),
    /// Binary data.
    Binary(Vec<u8>),
}

impl Value {
    /// Creates a string value.
    pub fn string(v: impl Into<String>) -> Self {
        Value::String(v.into())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the data kind of this value, or `None` for NULL.
    pub fn kind(&self) -> Option<DataKind> {
        match self {
            Value::Null => None,
            Value::String(_) => Some(DataKind::String),
            Value::Boolean(_) => Some(DataKind::Boolean),
            Value::DateTime(_) => Some(DataKind::DateTime),
            Value::Integer(_) => Some(DataKind::Integer),
            Value::Decimal(_) => Some(DataKind::Decimal),
            Value::Binary(_) => Some(DataKind::Binary),
        }
    }

    /// Returns the string contents, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::DateTime(ts) => write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Binary(bytes) => {
                write!(f, "0x")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Decimal(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kind() {
        assert_eq!(Value::Null.kind(), None);
        assert_eq!(Value::from("a").kind(), Some(DataKind::String));
        assert_eq!(Value::from(3_i64).kind(), Some(DataKind::Integer));
        assert_eq!(Value::from(1.5).kind(), Some(DataKind::Decimal));
        assert_eq!(Value::from(true).kind(), Some(DataKind::Boolean));
        assert_eq!(Value::Binary(vec![1]).kind(), Some(DataKind::Binary));
    }

    #[test]
    fn test_option_conversion() {
        let none: Option<&str> = None;
        assert!(Value::from(none).is_null());
        assert_eq!(Value::from(Some("x")).as_str(), Some("x"));
    }

    #[test]
    fn test_display() {
        let ts = Utc.with_ymd_and_hms(2013, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(Value::from(ts).to_string(), "2013-05-01T12:30:00.000Z");
        assert_eq!(Value::Binary(vec![0xde, 0xad]).to_string(), "0xdead");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
