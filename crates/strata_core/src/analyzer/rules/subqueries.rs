//! Rules for derived tables and subquery expressions.

use std::sync::Arc;

use strata_error::{DbError, ErrorKind, Result};
use tracing::trace;

use super::AnalyzerRule;
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::analyzer::{
    AnalyzeOutcome,
    Analyzer,
    DEFAULT_RULES_BATCH,
    strip_passthrough_nodes,
};
use crate::expr::Expression;
use crate::expr::subquery_expr::SubqueryExpr;
use crate::logical::logical_alias::{LogicalSubqueryAlias, LogicalTableAlias};
use crate::logical::operator::{LogicalOperator, Node, PlanRef};
use crate::transform::Transformed;
use crate::transform::plan::{
    stop_at_subquery_alias,
    transform_plan_expressions_with_node,
    transform_up,
    transform_up_with_context,
};

/// Analyzes the children of subquery aliases through the default rules.
///
/// Subquery aliases cannot see the enclosing query, the child is analyzed
/// with an empty scope.
#[derive(Debug, Clone, Copy)]
pub struct ResolveSubqueries;

impl AnalyzerRule for ResolveSubqueries {
    fn name(&self) -> &'static str {
        "resolve_subqueries"
    }

    fn apply(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        _scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        analyze_subquery_aliases(plan, &mut |child| {
            analyzer.analyze_through_batch(
                &ctx.new_sub_context(),
                child,
                &Scope::empty(),
                DEFAULT_RULES_BATCH,
            )
        })
    }
}

/// Runs the full set of batches on the children of subquery aliases once the
/// enclosing plan is resolved.
#[derive(Debug, Clone, Copy)]
pub struct FinalizeSubqueries;

impl AnalyzerRule for FinalizeSubqueries {
    fn name(&self) -> &'static str {
        "finalize_subqueries"
    }

    fn apply(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        _scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        analyze_subquery_aliases(plan, &mut |child| {
            analyzer.analyze_starting_at_batch(
                &ctx.new_sub_context(),
                child,
                &Scope::empty(),
                DEFAULT_RULES_BATCH,
            )
        })
    }
}

/// Analyze the child of every outermost subquery alias in the plan with
/// `analyze`. Nested aliases are handled by the recursive analysis.
fn analyze_subquery_aliases<F>(plan: &PlanRef, analyze: &mut F) -> Result<Transformed<PlanRef>>
where
    F: FnMut(&PlanRef) -> Result<AnalyzeOutcome>,
{
    transform_up_with_context(plan, &stop_at_subquery_alias, &mut |tctx| {
        let node = tctx.node;
        let alias = match node.as_ref() {
            LogicalOperator::SubqueryAlias(alias) => alias,
            _ => return Ok(Transformed::same(node.clone())),
        };

        let child = alias.get_one_child_exact()?;
        // Deferred errors abort here. The enclosing analysis can't make the
        // alias resolvable since the child has no access to its scope.
        let analyzed = analyze(child)?.into_result()?;
        let child = strip_passthrough_nodes(&analyzed.data);

        check_column_count(&alias.node, &child)?;

        if !analyzed.is_changed() {
            return Ok(Transformed::same(node.clone()));
        }

        Ok(Transformed::changed(Arc::new(node.with_children(vec![child])?)))
    })
}

fn check_column_count(alias: &LogicalSubqueryAlias, child: &PlanRef) -> Result<()> {
    if alias.columns.is_empty() {
        return Ok(());
    }

    let width = child.output_schema().len();
    if width != alias.columns.len() {
        return Err(DbError::with_kind(
            ErrorKind::ColumnCountMismatch,
            format!(
                "Subquery '{}' has {width} columns, but {} column aliases were provided",
                alias.name,
                alias.columns.len()
            ),
        ));
    }

    Ok(())
}

/// Collapses a table alias directly on top of another alias into a single
/// alias with the outer name.
#[derive(Debug, Clone, Copy)]
pub struct FlattenTableAliases;

impl AnalyzerRule for FlattenTableAliases {
    fn name(&self) -> &'static str {
        "flatten_table_aliases"
    }

    fn apply(
        &self,
        _ctx: &AnalysisContext,
        _analyzer: &Analyzer,
        plan: &PlanRef,
        _scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        transform_up(plan, &mut |node| {
            let outer = match node.as_ref() {
                LogicalOperator::TableAlias(alias) => alias,
                _ => return Ok(Transformed::same(node.clone())),
            };

            let flattened = match outer.get_one_child_exact()?.as_ref() {
                LogicalOperator::SubqueryAlias(inner) => LogicalOperator::SubqueryAlias(Node::new(
                    LogicalSubqueryAlias {
                        name: outer.node.name.clone(),
                        columns: inner.node.columns.clone(),
                    },
                    inner.children.clone(),
                )),
                LogicalOperator::TableAlias(inner) => LogicalOperator::TableAlias(Node::new(
                    LogicalTableAlias {
                        name: outer.node.name.clone(),
                    },
                    inner.children.clone(),
                )),
                _ => return Ok(Transformed::same(node.clone())),
            };

            Ok(Transformed::changed(Arc::new(flattened)))
        })
    }
}

/// Analyzes the plans of subquery expressions with the owning node pushed
/// onto the scope.
///
/// Subquery expressions are always re-analyzed since changes to the
/// enclosing plan may shift the columns they reference. Deferred errors are
/// swallowed, keeping whatever progress was made for the next pass.
#[derive(Debug, Clone, Copy)]
pub struct ResolveSubqueryExprs;

impl AnalyzerRule for ResolveSubqueryExprs {
    fn name(&self) -> &'static str {
        "resolve_subquery_exprs"
    }

    fn apply(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        let transformed =
            transform_plan_expressions_with_node(plan, &stop_at_subquery_alias, &mut |node, expr| {
                let subquery = match expr {
                    Expression::Subquery(subquery) => subquery,
                    other => return Ok(Transformed::same(other)),
                };

                let sub_ctx = ctx.new_sub_context();
                let sub_scope = scope.push(node);

                let outcome = analyzer.analyze_with_scope(&sub_ctx, &subquery.query, &sub_scope)?;
                let analyzed = match outcome {
                    AnalyzeOutcome::Resolved(analyzed) => analyzed,
                    AnalyzeOutcome::Deferred { partial, error } => {
                        trace!(%error, "deferring subquery expression");
                        partial
                    }
                };

                if !analyzed.is_changed() {
                    return Ok(Transformed::same(Expression::Subquery(subquery)));
                }

                Ok(Transformed::changed(Expression::Subquery(SubqueryExpr {
                    query: strip_passthrough_nodes(&analyzed.data),
                    cache_results: subquery.cache_results,
                })))
            })?;

        // Re-analysis can rebuild an identical tree.
        if transformed.is_changed() && transformed.data.as_ref() == plan.as_ref() {
            return Ok(Transformed::same(plan.clone()));
        }

        Ok(transformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::{col, column, eq, lit, star, subquery};
    use crate::logical::builder::{
        filter,
        project,
        scan,
        single_row,
        subquery_alias,
        table,
        table_alias,
    };
    use crate::testutil::{test_analyzer, test_context};

    #[test]
    fn resolve_alias_child() {
        let analyzer = test_analyzer();
        let plan = subquery_alias("s", &["x", "y"], project(table("t1"), vec![star()]));
        let got = ResolveSubqueries
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert!(got.is_changed());
        assert!(got.data.resolved());

        let fields: Vec<_> = got.data.output_schema().into_iter().map(|f| f.to_string()).collect();
        assert_eq!(vec!["s.x Int64", "s.y Utf8"], fields);

        // Already resolved, nothing to do.
        let again = ResolveSubqueries
            .apply(&test_context(), &analyzer, &got.data, &Scope::empty())
            .unwrap();
        assert!(!again.is_changed());
        assert!(Arc::ptr_eq(&got.data, &again.data));
    }

    #[test]
    fn column_count_mismatch() {
        let analyzer = test_analyzer();
        let plan = subquery_alias("s", &["x"], project(table("t1"), vec![col("a"), col("b")]));
        let err = ResolveSubqueries
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap_err();
        assert_eq!(ErrorKind::ColumnCountMismatch, err.kind());
    }

    #[test]
    fn flatten_aliases() {
        let analyzer = test_analyzer();
        let inner = project(table("t1"), vec![col("a")]);
        let plan = table_alias("outer", subquery_alias("s", &["x"], inner.clone()));
        let got = FlattenTableAliases
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert_eq!(subquery_alias("outer", &["x"], inner), got.data);

        let plan = table_alias("outer", table_alias("t", table("t1")));
        let got = FlattenTableAliases
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert_eq!(table_alias("outer", table("t1")), got.data);

        let plan = table_alias("t", table("t1"));
        let got = FlattenTableAliases
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert!(!got.is_changed());
    }

    #[test]
    fn subquery_expr_sees_owning_node() {
        let analyzer = test_analyzer();
        let t1 = scan("mydb", "t1", &[("a", DataType::Int64), ("b", DataType::Utf8)]);
        // WHERE a = (SELECT a)
        let plan = filter(
            t1,
            eq(
                column(0, "a", DataType::Int64),
                subquery(project(single_row(), vec![col("a")])),
            ),
        );

        let got = ResolveSubqueryExprs
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert!(got.is_changed());
        assert!(got.data.resolved());

        // Resolved, re-analysis doesn't change anything.
        let again = ResolveSubqueryExprs
            .apply(&test_context(), &analyzer, &got.data, &Scope::empty())
            .unwrap();
        assert!(!again.is_changed());
    }

    #[test]
    fn subquery_expr_deferred_keeps_progress() {
        let analyzer = test_analyzer();
        let t1 = scan("mydb", "t1", &[("a", DataType::Int64)]);
        // Inner table resolves, `zzz` never will.
        let plan = filter(
            t1,
            eq(
                lit(1),
                subquery(project(table("t2"), vec![col("zzz")])),
            ),
        );

        let got = ResolveSubqueryExprs
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert!(got.is_changed());
        assert!(!got.data.resolved());

        let mut saw_scan = false;
        crate::transform::inspect::inspect_plan_expressions(&got.data, &mut |_, e| {
            if let Expression::Subquery(sq) = e {
                saw_scan = matches!(sq.query.children()[0].as_ref(), LogicalOperator::Scan(_));
            }
            true
        });
        assert!(saw_scan);
    }

    #[test]
    fn finalize_runs_later_batches() {
        let analyzer = test_analyzer();
        let t1 = scan("mydb", "t1", &[("a", DataType::Int64)]);
        let inner = project(t1, vec![column(0, "a", DataType::Int64)]);
        let plan = subquery_alias("s", &[], inner.clone());

        let got = FinalizeSubqueries
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        // Not a top-level statement, no passthrough left behind.
        assert!(!got.is_changed());
        assert_eq!(subquery_alias("s", &[], inner), got.data);
    }

    #[test]
    fn finalize_runs_full_rule_set() {
        let analyzer = test_analyzer();
        let plan = subquery_alias("s", &[], project(table("t1"), vec![col("a")]));

        let got = FinalizeSubqueries
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert!(got.is_changed());
        assert!(got.data.resolved());

        let child = &got.data.children()[0];
        assert!(matches!(child.as_ref(), LogicalOperator::Project(_)));
        assert!(matches!(child.children()[0].as_ref(), LogicalOperator::Scan(_)));
    }
}
