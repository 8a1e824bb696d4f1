use std::fmt;

use serde::{Deserialize, Serialize};
use strata_error::{DbError, ErrorKind, Result};

use super::datatype::DataType;

/// A single owned value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
        }
    }

    pub fn try_as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(b) => Ok(*b),
            other => Err(invalid_cast(other, "bool")),
        }
    }

    pub fn try_as_i64(&self) -> Result<i64> {
        match self {
            Self::Int64(v) => Ok(*v),
            other => Err(invalid_cast(other, "i64")),
        }
    }

    pub fn try_as_usize(&self) -> Result<usize> {
        let v = self.try_as_i64()?;
        usize::try_from(v).map_err(|_| invalid_cast(self, "usize"))
    }

    pub fn try_into_string(self) -> Result<String> {
        match self {
            Self::Utf8(s) => Ok(s),
            other => Err(invalid_cast(&other, "string")),
        }
    }
}

fn invalid_cast(value: &ScalarValue, target: &str) -> DbError {
    DbError::with_kind(
        ErrorKind::InvalidArgument,
        format!("Cannot interpret {value} as {target}"),
    )
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int64(value as i64)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
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

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "'{v}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usize_from_negative() {
        let err = ScalarValue::Int64(-1).try_as_usize().unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
        assert_eq!(4, ScalarValue::Int64(4).try_as_usize().unwrap());
    }

    #[test]
    fn display() {
        assert_eq!("'abc'", ScalarValue::from("abc").to_string());
        assert_eq!("NULL", ScalarValue::Null.to_string());
    }
}
