use std::fmt::Debug;
use std::sync::Arc;

use strata_error::{DbError, ErrorKind, Result};

use crate::arrays::datatype::DataType;
use crate::arrays::scalar::ScalarValue;
use crate::catalog::Database;
use crate::expr::Expression;
use crate::logical::logical_table_function::LogicalTableFunction;
use crate::logical::schema::Field;

/// Implementation of a table function available in the catalog.
pub trait TableFunctionImpl: Debug + Sync + Send {
    fn name(&self) -> &'static str;

    /// Instantiate the function against a database with the call's
    /// arguments.
    fn plan(
        &self,
        database: &Arc<dyn Database>,
        args: Vec<Expression>,
    ) -> Result<LogicalTableFunction>;
}

/// `generate_series(start, stop)`
#[derive(Debug, Clone, Copy)]
pub struct GenerateSeries;

impl TableFunctionImpl for GenerateSeries {
    fn name(&self) -> &'static str {
        "generate_series"
    }

    fn plan(
        &self,
        database: &Arc<dyn Database>,
        args: Vec<Expression>,
    ) -> Result<LogicalTableFunction> {
        if args.len() != 2 {
            return Err(DbError::with_kind(
                ErrorKind::InvalidArgument,
                format!("generate_series expects 2 arguments, got {}", args.len()),
            ));
        }
        for arg in &args {
            match arg {
                Expression::Literal(lit) if matches!(lit.literal, ScalarValue::Int64(_)) => (),
                other => {
                    return Err(DbError::with_kind(
                        ErrorKind::InvalidArgument,
                        "generate_series expects integer literal arguments",
                    )
                    .with_field("argument", other));
                }
            }
        }

        Ok(LogicalTableFunction {
            function: self.name().to_string(),
            database: database.name().to_string(),
            args,
            schema: vec![Field::new("value", DataType::Int64, false).with_table(self.name())],
        })
    }
}

/// `list_tables()`, names of tables in the database.
#[derive(Debug, Clone, Copy)]
pub struct ListTables;

impl TableFunctionImpl for ListTables {
    fn name(&self) -> &'static str {
        "list_tables"
    }

    fn plan(
        &self,
        database: &Arc<dyn Database>,
        args: Vec<Expression>,
    ) -> Result<LogicalTableFunction> {
        if !args.is_empty() {
            return Err(DbError::with_kind(
                ErrorKind::InvalidArgument,
                "list_tables does not take arguments",
            ));
        }

        Ok(LogicalTableFunction {
            function: self.name().to_string(),
            database: database.name().to_string(),
            args,
            schema: vec![Field::new("table_name", DataType::Utf8, false).with_table(self.name())],
        })
    }
}
