use strata_error::Result;

use super::operator::LogicalNode;
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalProject {
    pub projections: Vec<Expression>,
}

impl Explainable for LogicalProject {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        let ent = ExplainEntry::new("Project").with_values("projections", &self.projections);
        if conf.verbose {
            ent.with_values("datatypes", self.projections.iter().map(|p| p.datatype()))
        } else {
            ent
        }
    }
}

impl LogicalNode for LogicalProject {
    fn name(&self) -> &'static str {
        "Project"
    }

    fn output_schema(&self, _input: Vec<Field>) -> Vec<Field> {
        self.projections
            .iter()
            .map(|expr| {
                let field = Field::new(expr.output_name(), expr.datatype(), true);
                match expr.output_table() {
                    Some(table) => field.with_table(table),
                    None => field,
                }
            })
            .collect()
    }

    fn expressions(&self) -> Vec<&Expression> {
        self.projections.iter().collect()
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        for expr in &mut self.projections {
            func(expr)?;
        }
        Ok(())
    }
}
