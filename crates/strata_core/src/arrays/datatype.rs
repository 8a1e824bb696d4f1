use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical type of a column or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Type of the NULL literal, also used for expressions whose type is not
    /// known yet.
    Null,
    Boolean,
    Int64,
    Float64,
    Utf8,
    Timestamp,
}

impl DataType {
    pub const fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Int64 => write!(f, "Int64"),
            Self::Float64 => write!(f, "Float64"),
            Self::Utf8 => write!(f, "Utf8"),
            Self::Timestamp => write!(f, "Timestamp"),
        }
    }
}
