use fmtutil::IntoDisplayableSlice;

use super::operator::LogicalNode;
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

/// Table function call as written in the query.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalUnresolvedTableFunction {
    pub name: String,
    pub args: Vec<Expression>,
}

impl Explainable for LogicalUnresolvedTableFunction {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("UnresolvedTableFunction")
            .with_value("function", &self.name)
            .with_values("arguments", &self.args)
    }
}

impl LogicalNode for LogicalUnresolvedTableFunction {
    fn name(&self) -> &'static str {
        "UnresolvedTableFunction"
    }

    fn output_schema(&self, _input: Vec<Field>) -> Vec<Field> {
        Vec::new()
    }

    fn expressions(&self) -> Vec<&Expression> {
        self.args.iter().collect()
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> strata_error::Result<()>
    where
        F: FnMut(&mut Expression) -> strata_error::Result<()>,
    {
        for arg in &mut self.args {
            func(arg)?;
        }
        Ok(())
    }

    fn is_bound(&self) -> bool {
        false
    }
}

/// Table function instantiated against a database.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalTableFunction {
    pub function: String,
    /// Name of the database the function was planned against.
    pub database: String,
    pub args: Vec<Expression>,
    pub schema: Vec<Field>,
}

impl Explainable for LogicalTableFunction {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("TableFunction")
            .with_value("function", &self.function)
            .with_values("arguments", &self.args)
            .with_verbose_value("database", conf, &self.database)
            .with_verbose_value("columns", conf, format!("[{}]", self.schema.display_as_list()))
    }
}

impl LogicalNode for LogicalTableFunction {
    fn name(&self) -> &'static str {
        "TableFunction"
    }

    fn output_schema(&self, _input: Vec<Field>) -> Vec<Field> {
        self.schema.clone()
    }

    fn expressions(&self) -> Vec<&Expression> {
        self.args.iter().collect()
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> strata_error::Result<()>
    where
        F: FnMut(&mut Expression) -> strata_error::Result<()>,
    {
        for arg in &mut self.args {
            func(arg)?;
        }
        Ok(())
    }
}
