use std::fmt;

use super::operator::LogicalNode;
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughKind {
    /// Tracks the running statement in the process list.
    QueryProcess,
    /// Begins an implicit transaction before executing the child.
    StartTransaction,
}

impl fmt::Display for PassthroughKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryProcess => write!(f, "QueryProcess"),
            Self::StartTransaction => write!(f, "StartTransaction"),
        }
    }
}

/// Wrapper that only makes sense at the root of a top-level statement.
///
/// Has no effect on the rows produced by its child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalPassthrough {
    pub kind: PassthroughKind,
}

impl Explainable for LogicalPassthrough {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new(self.kind.to_string())
    }
}

impl LogicalNode for LogicalPassthrough {
    fn name(&self) -> &'static str {
        "Passthrough"
    }

    fn output_schema(&self, input: Vec<Field>) -> Vec<Field> {
        input
    }
}
