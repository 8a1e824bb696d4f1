use strata_error::Result;

use super::operator::LogicalNode;
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalFilter {
    pub filter: Expression,
}

impl Explainable for LogicalFilter {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Filter").with_value("predicate", &self.filter)
    }
}

impl LogicalNode for LogicalFilter {
    fn name(&self) -> &'static str {
        "Filter"
    }

    fn output_schema(&self, input: Vec<Field>) -> Vec<Field> {
        input
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.filter]
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        func(&mut self.filter)
    }
}
