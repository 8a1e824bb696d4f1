use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arrays::datatype::DataType;

/// A named output column of a plan node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Table (or alias) the column is reachable through.
    pub table: Option<String>,
    pub datatype: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, datatype: DataType, nullable: bool) -> Self {
        Field {
            name: name.into(),
            table: None,
            datatype,
            nullable,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Check if a possibly qualified reference names this field.
    ///
    /// Names and qualifiers compare case insensitively.
    pub fn matches(&self, table: Option<&str>, name: &str) -> bool {
        if !self.name.eq_ignore_ascii_case(name) {
            return false;
        }
        match (table, &self.table) {
            (None, _) => true,
            (Some(want), Some(have)) => want.eq_ignore_ascii_case(have),
            (Some(_), None) => false,
        }
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.table
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(table))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{} {}", self.name, self.datatype),
            None => write!(f, "{} {}", self.name, self.datatype),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_qualified() {
        let field = Field::new("a", DataType::Int64, true).with_table("t1");
        assert!(field.matches(None, "a"));
        assert!(field.matches(Some("T1"), "A"));
        assert!(!field.matches(Some("t2"), "a"));
        assert!(!field.matches(None, "b"));

        let field = Field::new("a", DataType::Int64, true);
        assert!(!field.matches(Some("t1"), "a"));
    }
}
