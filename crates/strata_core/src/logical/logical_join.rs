use std::fmt;

use strata_error::Result;

use super::operator::LogicalNode;
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Standard INNER join.
    Inner,
    /// Standard LEFT join.
    Left,
    /// Standard RIGHT join.
    Right,
    /// Standard full/outer join.
    Full,
    /// Cartesian product, no condition.
    Cross,
}

impl JoinType {
    /// Index of the child the executor iterates over exactly once.
    ///
    /// For right joins that's the right side, every other join drives from
    /// the left.
    pub const fn primary_child_idx(&self) -> usize {
        match self {
            JoinType::Right => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
            Self::Right => write!(f, "RIGHT"),
            Self::Full => write!(f, "FULL"),
            Self::Cross => write!(f, "CROSS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalJoin {
    pub join_type: JoinType,
    pub condition: Option<Expression>,
    /// Number of outer scope columns prefixed to every row this join sees.
    ///
    /// Zero unless the join lives inside a correlated subquery or trigger
    /// body.
    pub scope_len: usize,
}

impl Explainable for LogicalJoin {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Join").with_value("join_type", self.join_type);
        if let Some(condition) = &self.condition {
            ent = ent.with_value("condition", condition);
        }
        if self.scope_len > 0 {
            ent = ent.with_value("scope_len", self.scope_len);
        }
        ent
    }
}

impl LogicalNode for LogicalJoin {
    fn name(&self) -> &'static str {
        "Join"
    }

    fn output_schema(&self, input: Vec<Field>) -> Vec<Field> {
        input
    }

    fn expressions(&self) -> Vec<&Expression> {
        self.condition.iter().collect()
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        if let Some(condition) = &mut self.condition {
            func(condition)?;
        }
        Ok(())
    }
}
