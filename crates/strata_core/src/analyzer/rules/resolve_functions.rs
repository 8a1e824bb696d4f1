use strata_error::Result;
use tracing::debug;

use super::AnalyzerRule;
use crate::analyzer::Analyzer;
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::expr::Expression;
use crate::expr::function_expr::FunctionExpr;
use crate::logical::operator::PlanRef;
use crate::transform::Transformed;
use crate::transform::expr::transform_expr_up;
use crate::transform::plan::{transform_node_expressions, transform_up};

/// Replaces function calls with functions from the catalog.
///
/// The window spec captured by the parser is reattached after the function
/// is instantiated with its arguments.
#[derive(Debug, Clone, Copy)]
pub struct ResolveFunctions;

impl AnalyzerRule for ResolveFunctions {
    fn name(&self) -> &'static str {
        "resolve_functions"
    }

    fn apply(
        &self,
        _ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        _scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        transform_up(plan, &mut |node| {
            if node.resolved() {
                return Ok(Transformed::same(node.clone()));
            }

            transform_node_expressions(node, &mut |expr| {
                transform_expr_up(expr, &mut |e| match e {
                    Expression::UnresolvedFunction(unresolved) => {
                        let function = analyzer.catalog().function(&unresolved.name)?;
                        let resolved = FunctionExpr::try_new(function, unresolved.args)?
                            .with_window(unresolved.window)?;
                        debug!(function = %unresolved.name, "resolved function");
                        Ok(Transformed::changed(Expression::Function(resolved)))
                    }
                    other => Ok(Transformed::same(other)),
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use strata_error::ErrorKind;

    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::window::{
        OrderByExpr,
        WindowFrame,
        WindowFrameBound,
        WindowFrameUnit,
        WindowSpec,
    };
    use crate::expr::{call, col, column, lit, window_call};
    use crate::logical::builder::{project, scan};
    use crate::testutil::{test_analyzer, test_context};

    fn t1() -> PlanRef {
        scan("mydb", "t1", &[("a", DataType::Int64), ("b", DataType::Utf8)])
    }

    fn apply(plan: &PlanRef) -> Result<Transformed<PlanRef>> {
        ResolveFunctions.apply(&test_context(), &test_analyzer(), plan, &Scope::empty())
    }

    fn spec() -> WindowSpec {
        WindowSpec {
            partition_by: vec![column(1, "b", DataType::Utf8)],
            order_by: vec![OrderByExpr {
                expr: column(0, "a", DataType::Int64),
                desc: true,
                nulls_first: false,
            }],
            frame: Some(WindowFrame {
                unit: WindowFrameUnit::Rows,
                start: WindowFrameBound::UnboundedPreceding,
                end: WindowFrameBound::CurrentRow,
            }),
        }
    }

    #[test]
    fn resolve_scalar() {
        let plan = project(t1(), vec![call("ABS", vec![column(0, "a", DataType::Int64)])]);
        let got = apply(&plan).unwrap();
        assert!(got.is_changed());
        assert!(got.data.resolved());
        assert_eq!(DataType::Int64, got.data.output_schema()[0].datatype);
    }

    #[test]
    fn unknown_function() {
        let plan = project(t1(), vec![call("nope", vec![lit(1)])]);
        let err = apply(&plan).unwrap_err();
        assert_eq!(ErrorKind::UnknownFunction, err.kind());
    }

    #[test]
    fn bad_argument_count() {
        let plan = project(t1(), vec![call("abs", vec![])]);
        let err = apply(&plan).unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
    }

    #[test]
    fn window_preserved() {
        let plan = project(
            t1(),
            vec![window_call("lag", vec![column(0, "a", DataType::Int64), lit(2)], spec())],
        );
        let got = apply(&plan).unwrap();

        match got.data.expressions()[0] {
            Expression::Function(function) => {
                assert_eq!("lag", function.function.name());
                assert_eq!(2, function.inputs.len());
                assert_eq!(Some(&spec()), function.window.as_ref());
            }
            other => panic!("unexpected expression: {other}"),
        }
    }

    #[test]
    fn window_on_aggregate() {
        let plan = project(t1(), vec![window_call("sum", vec![col("a")], spec())]);
        let got = apply(&plan).unwrap();
        match got.data.expressions()[0] {
            Expression::Function(function) => assert_eq!(Some(&spec()), function.window.as_ref()),
            other => panic!("unexpected expression: {other}"),
        }
    }

    #[test]
    fn window_by_function_kind() {
        let plan = project(t1(), vec![window_call("abs", vec![lit(1)], spec())]);
        let got = apply(&plan).unwrap();
        match got.data.expressions()[0] {
            Expression::Function(function) => {
                assert_eq!("abs", function.function.name());
                assert_eq!(None, function.window);
            }
            other => panic!("unexpected expression: {other}"),
        }

        let plan = project(t1(), vec![call("row_number", vec![])]);
        let err = apply(&plan).unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
    }
}
