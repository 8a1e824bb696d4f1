use super::operator::LogicalNode;
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Produces exactly one row with no columns. Source for `SELECT` without
/// `FROM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalSingleRow;

impl Explainable for LogicalSingleRow {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("SingleRow")
    }
}

impl LogicalNode for LogicalSingleRow {
    fn name(&self) -> &'static str {
        "SingleRow"
    }

    fn output_schema(&self, _input: Vec<Field>) -> Vec<Field> {
        Vec::new()
    }
}
