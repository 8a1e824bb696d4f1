use std::sync::Arc;

use strata_error::Result;
use tracing::debug;

use super::AnalyzerRule;
use crate::analyzer::Analyzer;
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::catalog::unwrap_privileged;
use crate::logical::operator::{LogicalOperator, Node, PlanRef};
use crate::transform::Transformed;
use crate::transform::plan::transform_up;

/// Instantiates table function calls against the current database.
///
/// Table functions see the database without any privilege checking wrapper.
#[derive(Debug, Clone, Copy)]
pub struct ResolveTableFunctions;

impl AnalyzerRule for ResolveTableFunctions {
    fn name(&self) -> &'static str {
        "resolve_table_functions"
    }

    fn apply(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        _scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        transform_up(plan, &mut |node| {
            let unresolved = match node.as_ref() {
                LogicalOperator::UnresolvedTableFunction(n) => &n.node,
                _ => return Ok(Transformed::same(node.clone())),
            };

            let function = analyzer.catalog().table_function(&unresolved.name)?;
            let database = analyzer.catalog().database(ctx.current_database())?;
            let database = unwrap_privileged(database);

            let planned = function.plan(&database, unresolved.args.clone())?;
            debug!(
                function = %unresolved.name,
                database = %database.name(),
                "resolved table function"
            );

            Ok(Transformed::changed(Arc::new(
                LogicalOperator::TableFunction(Node::new(planned, Vec::new())),
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use strata_error::ErrorKind;

    use super::*;
    use crate::expr::{col, lit};
    use crate::logical::builder::table_function;
    use crate::testutil::{test_analyzer, test_context};

    #[test]
    fn instantiate_generate_series() {
        let analyzer = test_analyzer();
        let plan = table_function("generate_series", vec![lit(1_i64), lit(10_i64)]);
        let got = ResolveTableFunctions
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();

        match got.data.as_ref() {
            LogicalOperator::TableFunction(n) => {
                assert_eq!("generate_series", n.node.function);
                assert_eq!("mydb", n.node.database);
            }
            other => panic!("unexpected plan: {other}"),
        }
        assert_eq!("value", got.data.output_schema()[0].name);
    }

    #[test]
    fn unknown_table_function() {
        let analyzer = test_analyzer();
        let plan = table_function("nope", vec![]);
        let err = ResolveTableFunctions
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap_err();
        assert_eq!(ErrorKind::UnknownTableFunction, err.kind());
    }

    #[test]
    fn invalid_arguments() {
        let analyzer = test_analyzer();
        let plan = table_function("generate_series", vec![col("a"), lit(10_i64)]);
        let err = ResolveTableFunctions
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
    }
}
