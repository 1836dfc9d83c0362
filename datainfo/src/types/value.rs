use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::types::DataType;

/// A dynamically typed single element of a data object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
    Bytes(Vec<u8>),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::Null => DataType::Object,
            ScalarValue::Boolean(_) => DataType::Bool,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::UInt64(_) => DataType::UInt64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(s) => DataType::Str(s.chars().count()),
            ScalarValue::Bytes(b) => DataType::Bytes(b.len()),
        }
    }

    /// Numeric view of the value; `None` for text and nulls.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Boolean(v) => Some(f64::from(u8::from(*v))),
            ScalarValue::Int64(v) => Some(*v as f64),
            ScalarValue::UInt64(v) => Some(*v as f64),
            ScalarValue::Float64(v) => Some(v.into_inner()),
            _ => None,
        }
    }
}

/// Formats a float the way a summary reader expects: integral values keep a
/// trailing `.0`, non-finite values are spelled `nan`/`inf`.
pub(crate) fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        let spelled = if v > 0.0 { "inf" } else { "-inf" };
        spelled.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "None"),
            ScalarValue::Boolean(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::UInt64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{}", format_float(v.into_inner())),
            ScalarValue::Utf8(v) => write!(f, "{v}"),
            ScalarValue::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int64(value.into())
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<u64> for ScalarValue {
    fn from(value: u64) -> Self {
        ScalarValue::UInt64(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(OrderedFloat(value))
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ScalarValue::from(1.0).to_string(), "1.0");
        assert_eq!(ScalarValue::from(2.5).to_string(), "2.5");
        assert_eq!(ScalarValue::from(f64::NAN).to_string(), "nan");
        assert_eq!(ScalarValue::from(-3).to_string(), "-3");
        assert_eq!(ScalarValue::from(true).to_string(), "True");
    }

    #[test]
    fn test_ordering_with_floats() {
        let mut values = vec![
            ScalarValue::from(3.0),
            ScalarValue::from(-1.5),
            ScalarValue::from(2.0),
        ];
        values.sort();
        assert_eq!(values[0], ScalarValue::from(-1.5));
        assert_eq!(values[2], ScalarValue::from(3.0));
    }
}
