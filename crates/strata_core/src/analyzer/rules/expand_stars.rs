use std::sync::Arc;

use strata_error::{DbError, ErrorKind, Result};

use super::AnalyzerRule;
use crate::analyzer::Analyzer;
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::expr::Expression;
use crate::expr::column_expr::ColumnExpr;
use crate::logical::logical_project::LogicalProject;
use crate::logical::operator::{LogicalOperator, Node, PlanRef};
use crate::transform::Transformed;
use crate::transform::plan::{stop_at_subquery_alias, transform_up_with_context};

/// Expands `*` and `t.*` in projections to the matching input columns.
#[derive(Debug, Clone, Copy)]
pub struct ExpandStars;

impl AnalyzerRule for ExpandStars {
    fn name(&self) -> &'static str {
        "expand_stars"
    }

    fn apply(
        &self,
        _ctx: &AnalysisContext,
        _analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        let scope_len = scope.len();

        transform_up_with_context(plan, &stop_at_subquery_alias, &mut |tctx| {
            let node = tctx.node;
            let project = match node.as_ref() {
                LogicalOperator::Project(project) => project,
                _ => return Ok(Transformed::same(node.clone())),
            };

            let has_star = project
                .node
                .projections
                .iter()
                .any(|p| matches!(p, Expression::Star(_)));
            let input = project.get_one_child_exact()?;
            if !has_star || !input.resolved() {
                return Ok(Transformed::same(node.clone()));
            }

            let input_schema = input.output_schema();
            let mut projections = Vec::with_capacity(project.node.projections.len());

            for projection in &project.node.projections {
                let star = match projection {
                    Expression::Star(star) => star,
                    other => {
                        projections.push(other.clone());
                        continue;
                    }
                };

                let before = projections.len();
                for (idx, field) in input_schema.iter().enumerate() {
                    if let Some(table) = &star.table {
                        if !field.has_table(table) {
                            continue;
                        }
                    }
                    projections.push(Expression::Column(ColumnExpr {
                        index: scope_len + idx,
                        table: field.table.clone(),
                        name: field.name.clone(),
                        datatype: field.datatype,
                    }));
                }

                if let Some(table) = &star.table {
                    if projections.len() == before {
                        return Err(DbError::with_kind(
                            ErrorKind::UnknownTable,
                            format!("Table '{table}' not found for '{star}'"),
                        ));
                    }
                }
            }

            Ok(Transformed::changed(Arc::new(LogicalOperator::Project(
                Node::new(LogicalProject { projections }, project.children.clone()),
            ))))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::{col, qualified_star, star};
    use crate::logical::builder::{cross_join, filter, project, scan, table};
    use crate::testutil::{test_analyzer, test_context};

    fn t1() -> PlanRef {
        scan("mydb", "t1", &[("a", DataType::Int64), ("b", DataType::Utf8)])
    }

    fn t2() -> PlanRef {
        scan("mydb", "t2", &[("c", DataType::Int64)])
    }

    fn apply(plan: &PlanRef, scope: &Scope) -> Result<Transformed<PlanRef>> {
        ExpandStars.apply(&test_context(), &test_analyzer(), plan, scope)
    }

    fn names(plan: &PlanRef) -> Vec<String> {
        plan.output_schema().into_iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn expand_all() {
        let plan = project(cross_join(t1(), t2()), vec![star(), col("a")]);
        let got = apply(&plan, &Scope::empty()).unwrap();
        assert!(got.is_changed());
        assert_eq!(
            vec!["t1.a Int64", "t1.b Utf8", "t2.c Int64", "a Null"],
            names(&got.data)
        );
    }

    #[test]
    fn expand_qualified() {
        let plan = project(cross_join(t1(), t2()), vec![qualified_star("t2")]);
        let got = apply(&plan, &Scope::empty()).unwrap();
        assert_eq!(
            vec![&Expression::Column(ColumnExpr {
                index: 2,
                table: Some("t2".to_string()),
                name: "c".to_string(),
                datatype: DataType::Int64,
            })],
            got.data.expressions()
        );

        let plan = project(t1(), vec![qualified_star("t9")]);
        let err = apply(&plan, &Scope::empty()).unwrap_err();
        assert_eq!(ErrorKind::UnknownTable, err.kind());
    }

    #[test]
    fn indexes_after_scope() {
        let scope = Scope::empty().push(&filter(t2(), crate::expr::lit(true)));
        let plan = project(t1(), vec![star()]);
        let got = apply(&plan, &scope).unwrap();
        let indexes: Vec<_> = got
            .data
            .expressions()
            .into_iter()
            .map(|e| match e {
                Expression::Column(c) => c.index,
                other => panic!("unexpected expression: {other}"),
            })
            .collect();
        assert_eq!(vec![1, 2], indexes);
    }

    #[test]
    fn waits_for_input() {
        let plan = project(table("t1"), vec![star()]);
        let got = apply(&plan, &Scope::empty()).unwrap();
        assert!(!got.is_changed());
    }
}
