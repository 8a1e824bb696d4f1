use fmtutil::IntoDisplayableSlice;

use super::operator::LogicalNode;
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Table reference as written in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalUnresolvedTable {
    /// Database qualifier, current database if not provided.
    pub database: Option<String>,
    pub name: String,
}

impl Explainable for LogicalUnresolvedTable {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let ent = ExplainEntry::new("UnresolvedTable").with_value("table", &self.name);
        match &self.database {
            Some(database) => ent.with_value("database", database),
            None => ent,
        }
    }
}

impl LogicalNode for LogicalUnresolvedTable {
    fn name(&self) -> &'static str {
        "UnresolvedTable"
    }

    fn output_schema(&self, _input: Vec<Field>) -> Vec<Field> {
        Vec::new()
    }

    fn is_bound(&self) -> bool {
        false
    }
}

/// Scan of a table in a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalScan {
    pub database: String,
    pub table: String,
    /// Columns of the table, qualified by the table name.
    pub schema: Vec<Field>,
}

impl Explainable for LogicalScan {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Scan")
            .with_value("table", &self.table)
            .with_verbose_value("database", conf, &self.database)
            .with_verbose_value("columns", conf, format!("[{}]", self.schema.display_as_list()))
    }
}

impl LogicalNode for LogicalScan {
    fn name(&self) -> &'static str {
        "Scan"
    }

    fn output_schema(&self, _input: Vec<Field>) -> Vec<Field> {
        self.schema.clone()
    }
}
