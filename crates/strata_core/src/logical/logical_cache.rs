use super::operator::LogicalNode;
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Materializes the child once and replays the rows on every subsequent
/// execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalCachedResults;

impl Explainable for LogicalCachedResults {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("CachedResults")
    }
}

impl LogicalNode for LogicalCachedResults {
    fn name(&self) -> &'static str {
        "CachedResults"
    }

    fn output_schema(&self, input: Vec<Field>) -> Vec<Field> {
        input
    }
}

/// Removes the leading outer scope columns from rows handed to the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalStripRow {
    pub num_columns: usize,
}

impl Explainable for LogicalStripRow {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("StripRow").with_value("num_columns", self.num_columns)
    }
}

impl LogicalNode for LogicalStripRow {
    fn name(&self) -> &'static str {
        "StripRow"
    }

    fn output_schema(&self, input: Vec<Field>) -> Vec<Field> {
        input
    }
}
