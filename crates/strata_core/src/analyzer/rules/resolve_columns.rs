use strata_error::{DbError, ErrorKind, Result};

use super::AnalyzerRule;
use crate::analyzer::Analyzer;
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::expr::Expression;
use crate::expr::column_expr::{ColumnExpr, UnresolvedColumnExpr};
use crate::logical::operator::PlanRef;
use crate::logical::schema::Field;
use crate::transform::Transformed;
use crate::transform::expr::transform_expr_up;
use crate::transform::plan::{
    stop_at_subquery_alias,
    transform_node_expressions,
    transform_up_with_context,
};

/// Binds column references to positions in the row.
///
/// A node's own input is searched first, then enclosing scopes from the
/// innermost outward. Nodes are only bound once all of their children are
/// resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolveColumns;

impl AnalyzerRule for ResolveColumns {
    fn name(&self) -> &'static str {
        "resolve_columns"
    }

    fn apply(
        &self,
        _ctx: &AnalysisContext,
        _analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        let scope_schema = scope.schema();

        transform_up_with_context(plan, &stop_at_subquery_alias, &mut |tctx| {
            let node = tctx.node;
            if !node.children().iter().all(|c| c.resolved()) {
                return Ok(Transformed::same(node.clone()));
            }

            let input = node.input_schema();
            transform_node_expressions(node, &mut |expr| {
                transform_expr_up(expr, &mut |e| match e {
                    Expression::UnresolvedColumn(col) => {
                        let bound = bind_column(&col, &input, &scope_schema)?;
                        Ok(Transformed::changed(Expression::Column(bound)))
                    }
                    other => Ok(Transformed::same(other)),
                })
            })
        })
    }
}

fn bind_column(col: &UnresolvedColumnExpr, input: &[Field], scope: &[Field]) -> Result<ColumnExpr> {
    let table = col.table.as_deref();

    let mut matches = input
        .iter()
        .enumerate()
        .filter(|(_, field)| field.matches(table, &col.name));

    if let Some((idx, field)) = matches.next() {
        if matches.next().is_some() {
            return Err(DbError::with_kind(
                ErrorKind::AmbiguousColumn,
                format!("Ambiguous column name '{col}'"),
            ));
        }
        return Ok(bound(scope.len() + idx, field));
    }

    // Innermost scope wins.
    if let Some((idx, field)) = scope
        .iter()
        .enumerate()
        .rev()
        .find(|(_, field)| field.matches(table, &col.name))
    {
        return Ok(bound(idx, field));
    }

    match table {
        Some(table)
            if input.iter().chain(scope.iter()).any(|f| f.has_table(table)) =>
        {
            Err(DbError::with_kind(
                ErrorKind::UnresolvedTableColumn,
                format!("Table '{table}' does not have column '{}'", col.name),
            )
            .with_field("column", col))
        }
        _ => Err(DbError::with_kind(
            ErrorKind::UnresolvedColumn,
            format!("Column '{col}' could not be found"),
        )
        .with_field("column", col)),
    }
}

fn bound(index: usize, field: &Field) -> ColumnExpr {
    ColumnExpr {
        index,
        table: field.table.clone(),
        name: field.name.clone(),
        datatype: field.datatype,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::{col, column, eq, lit, qualified_col};
    use crate::logical::builder::{cross_join, filter, project, scan};
    use crate::testutil::{test_analyzer, test_context};

    fn t1() -> PlanRef {
        scan("mydb", "t1", &[("a", DataType::Int64), ("b", DataType::Utf8)])
    }

    fn t2() -> PlanRef {
        scan("mydb", "t2", &[("c", DataType::Int64), ("a", DataType::Int64)])
    }

    fn apply(plan: &PlanRef, scope: &Scope) -> Result<Transformed<PlanRef>> {
        ResolveColumns.apply(&test_context(), &test_analyzer(), plan, scope)
    }

    #[test]
    fn bind_input_columns() {
        let plan = project(t1(), vec![col("b"), qualified_col("t1", "a")]);
        let got = apply(&plan, &Scope::empty()).unwrap();

        assert_eq!(
            vec![
                &Expression::Column(ColumnExpr {
                    index: 1,
                    table: Some("t1".to_string()),
                    name: "b".to_string(),
                    datatype: DataType::Utf8,
                }),
                &Expression::Column(ColumnExpr {
                    index: 0,
                    table: Some("t1".to_string()),
                    name: "a".to_string(),
                    datatype: DataType::Int64,
                }),
            ],
            got.data.expressions()
        );
        assert!(got.data.resolved());
    }

    #[test]
    fn ambiguous_column() {
        let plan = project(cross_join(t1(), t2()), vec![col("a")]);
        let err = apply(&plan, &Scope::empty()).unwrap_err();
        assert_eq!(ErrorKind::AmbiguousColumn, err.kind());

        // Qualifying removes the ambiguity.
        let plan = project(cross_join(t1(), t2()), vec![qualified_col("t2", "a")]);
        let got = apply(&plan, &Scope::empty()).unwrap();
        match got.data.expressions()[0] {
            Expression::Column(c) => assert_eq!(3, c.index),
            other => panic!("unexpected expression: {other}"),
        }
    }

    #[test]
    fn bind_from_scope_after_input() {
        let outer = filter(t1(), lit(true));
        let scope = Scope::empty().push(&outer);

        // `c` is local, `b` is from the enclosing query.
        let plan = filter(t2(), eq(col("c"), col("b")));
        let got = apply(&plan, &scope).unwrap();
        assert_eq!(
            vec![&eq(
                Expression::Column(ColumnExpr {
                    index: 2,
                    table: Some("t2".to_string()),
                    name: "c".to_string(),
                    datatype: DataType::Int64,
                }),
                Expression::Column(ColumnExpr {
                    index: 1,
                    table: Some("t1".to_string()),
                    name: "b".to_string(),
                    datatype: DataType::Utf8,
                }),
            )],
            got.data.expressions()
        );

        // Local `a` shadows the outer `a`.
        let plan = filter(t2(), eq(col("a"), lit(1)));
        let got = apply(&plan, &scope).unwrap();
        match got.data.expressions()[0] {
            Expression::Comparison(cmp) => match cmp.left.as_ref() {
                Expression::Column(c) => assert_eq!(3, c.index),
                other => panic!("unexpected expression: {other}"),
            },
            other => panic!("unexpected expression: {other}"),
        }
    }

    #[test]
    fn missing_columns() {
        let plan = project(t1(), vec![col("zzz")]);
        let err = apply(&plan, &Scope::empty()).unwrap_err();
        assert_eq!(ErrorKind::UnresolvedColumn, err.kind());
        assert!(err.is_deferrable());

        let plan = project(t1(), vec![qualified_col("t1", "zzz")]);
        let err = apply(&plan, &Scope::empty()).unwrap_err();
        assert_eq!(ErrorKind::UnresolvedTableColumn, err.kind());

        let plan = project(t1(), vec![qualified_col("t9", "a")]);
        let err = apply(&plan, &Scope::empty()).unwrap_err();
        assert_eq!(ErrorKind::UnresolvedColumn, err.kind());
    }

    #[test]
    fn waits_for_children() {
        let plan = project(crate::logical::builder::table("t1"), vec![col("a")]);
        let got = apply(&plan, &Scope::empty()).unwrap();
        assert!(!got.is_changed());

        // Already bound, nothing to do.
        let plan = project(t1(), vec![column(0, "a", DataType::Int64)]);
        let got = apply(&plan, &Scope::empty()).unwrap();
        assert!(!got.is_changed());
    }
}
