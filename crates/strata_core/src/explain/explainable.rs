use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An entry in an output for explaining a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainEntry {
    /// Name of the node.
    pub name: String,
    /// Items to display in the explain entry.
    ///
    /// Using a btree to ensure consistent ordering.
    pub items: BTreeMap<String, ExplainValue>,
}

impl ExplainEntry {
    /// Create a new explain entry for a plan node.
    pub fn new(name: impl Into<String>) -> Self {
        ExplainEntry {
            name: name.into(),
            items: BTreeMap::new(),
        }
    }

    /// Put a value in the explain entry.
    pub fn with_value(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let val = ExplainValue::Value(value.to_string());
        self.items.insert(key.into(), val);
        self
    }

    /// Put a value in the entry only when explaining verbosely.
    pub fn with_verbose_value(
        self,
        key: impl Into<String>,
        conf: ExplainConfig,
        value: impl fmt::Display,
    ) -> Self {
        if conf.verbose {
            self.with_value(key, value)
        } else {
            self
        }
    }

    /// Put a list of values in the explain entry.
    pub fn with_values<S: fmt::Display>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        let vals = ExplainValue::Values(values.into_iter().map(|s| s.to_string()).collect());
        self.items.insert(key.into(), vals);
        self
    }
}

impl fmt::Display for ExplainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.items.is_empty() {
            write!(f, " (")?;
            for (idx, (k, v)) in self.items.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{k} = {v}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplainValue {
    Value(String),
    Values(Vec<String>),
}

impl fmt::Display for ExplainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Values(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExplainConfig {
    pub verbose: bool,
}

/// Trait for describing plan nodes in explain output.
pub trait Explainable {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_display_ordered() {
        let ent = ExplainEntry::new("Join")
            .with_value("join_type", "INNER")
            .with_values("columns", ["a", "b"]);
        assert_eq!("Join (columns = [a, b], join_type = INNER)", ent.to_string());
    }

    #[test]
    fn verbose_values_skipped() {
        let ent = ExplainEntry::new("Scan").with_verbose_value(
            "database",
            ExplainConfig { verbose: false },
            "mydb",
        );
        assert_eq!("Scan", ent.to_string());
    }
}
