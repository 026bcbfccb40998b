//! Typed cell values and their sentinel states

use chrono::{NaiveDateTime, TimeDelta};

/// Marker text for an undefined category
pub const UNDEFINED_LITERAL: &str = "<undefined>";

/// One value of a table column.
///
/// Besides ordinary values a column may hold the sentinels its type admits:
/// `Missing` (floats, datetime, duration), `PosInfinity` / `NegInfinity`
/// (floats, datetime, duration) and `Undefined` (categorical only).
/// See [`TypeTag::admits`](crate::registry::TypeTag::admits).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    PosInfinity,
    NegInfinity,
    Undefined,
    /// float64 and float32; always finite
    Float(f64),
    /// int8 through int64
    Int(i64),
    /// uint8 through uint64
    UInt(u64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Duration(TimeDelta),
    Category(String),
    Text(String),
}

impl Value {
    /// Float value with NaN and infinities mapped onto sentinels
    pub fn float(f: f64) -> Self {
        if f.is_nan() {
            Value::Missing
        } else if f == f64::INFINITY {
            Value::PosInfinity
        } else if f == f64::NEG_INFINITY {
            Value::NegInfinity
        } else {
            Value::Float(f)
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn category(s: impl Into<String>) -> Self {
        Value::Category(s.into())
    }

    /// Check if the value is one of the sentinel states
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            Value::Missing | Value::PosInfinity | Value::NegInfinity | Value::Undefined
        )
    }

    /// Numeric view of floats and integers, with float sentinels as NaN/±inf
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            Value::Missing => Some(f64::NAN),
            Value::PosInfinity => Some(f64::INFINITY),
            Value::NegInfinity => Some(f64::NEG_INFINITY),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::PosInfinity => "+Inf",
            Value::NegInfinity => "-Inf",
            Value::Undefined => "undefined",
            Value::Float(_) => "float",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Bool(_) => "bool",
            Value::DateTime(_) => "datetime",
            Value::Duration(_) => "duration",
            Value::Category(_) => "category",
            Value::Text(_) => "text",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Missing => write!(f, "<missing>"),
            Value::PosInfinity => write!(f, "Inf"),
            Value::NegInfinity => write!(f, "-Inf"),
            Value::Undefined => f.write_str(UNDEFINED_LITERAL),
            Value::Float(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::Duration(d) => write!(f, "{}", d),
            Value::Category(s) | Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::float(f as f64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Value::Duration(d)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_sentinels() {
        assert_eq!(Value::from(f64::NAN), Value::Missing);
        assert_eq!(Value::from(f64::INFINITY), Value::PosInfinity);
        assert_eq!(Value::from(f64::NEG_INFINITY), Value::NegInfinity);
        assert_eq!(Value::from(1.5), Value::Float(1.5));
        assert_eq!(Value::from(None::<f64>), Value::Missing);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(Value::Int(-3).as_f64(), Some(-3.0));
        assert!(Value::Missing.as_f64().unwrap().is_nan());
        assert_eq!(Value::text("x").as_f64(), None);
    }
}
