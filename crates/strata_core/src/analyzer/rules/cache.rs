//! Rules marking results that may be computed once and reused.

use std::sync::Arc;

use strata_error::Result;
use tracing::debug;

use super::AnalyzerRule;
use crate::analyzer::Analyzer;
use crate::analyzer::cacheability::{is_deterministic, node_is_cacheable};
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::expr::Expression;
use crate::expr::subquery_expr::SubqueryExpr;
use crate::logical::logical_cache::LogicalCachedResults;
use crate::logical::operator::{LogicalOperator, Node, PlanRef};
use crate::transform::Transformed;
use crate::transform::plan::{
    TransformContext,
    stop_at_subquery_alias,
    transform_plan_expressions_with_node,
    transform_up_with_context,
};

/// Marks subquery expressions that don't depend on the enclosing row as
/// cacheable.
///
/// Trigger bodies are skipped, they're analyzed fresh for every affected
/// row.
#[derive(Debug, Clone, Copy)]
pub struct CacheSubqueryResults;

impl AnalyzerRule for CacheSubqueryResults {
    fn name(&self) -> &'static str {
        "cache_subquery_results"
    }

    fn apply(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        if !analyzer.config().enable_subquery_caching
            || ctx.in_trigger()
            || matches!(plan.as_ref(), LogicalOperator::TriggerBlock(_))
        {
            return Ok(Transformed::same(plan.clone()));
        }

        transform_plan_expressions_with_node(plan, &stop_at_subquery_alias, &mut |node, expr| {
            let subquery = match expr {
                Expression::Subquery(subquery) if !subquery.cache_results => subquery,
                other => return Ok(Transformed::same(other)),
            };

            if !subquery.query.resolved() {
                return Ok(Transformed::same(Expression::Subquery(subquery)));
            }

            // Everything below this index comes from the rows of enclosing
            // queries.
            let lowest_allowed_idx = scope.push(node).len();
            if !(is_deterministic(&subquery.query)
                && node_is_cacheable(&subquery.query, lowest_allowed_idx))
            {
                return Ok(Transformed::same(Expression::Subquery(subquery)));
            }

            debug!(node = %node.name(), "caching subquery results");
            Ok(Transformed::changed(Expression::Subquery(SubqueryExpr {
                query: subquery.query,
                cache_results: true,
            })))
        })
    }
}

/// Caches subquery aliases used directly as join inputs.
///
/// A subquery alias can't reference the enclosing row, so re-running it for
/// every row of the other side is wasted work. The exception is the primary
/// input of the top-level statement's joins, which the executor only reads
/// once anyway.
#[derive(Debug, Clone, Copy)]
pub struct CacheSubqueryAliasesInJoins;

impl AnalyzerRule for CacheSubqueryAliasesInJoins {
    fn name(&self) -> &'static str {
        "cache_subquery_aliases_in_joins"
    }

    fn apply(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        if !analyzer.config().enable_join_caching {
            return Ok(Transformed::same(plan.clone()));
        }

        let mut transformed = wrap_join_subquery_aliases(plan)?;
        if ctx.is_root() && scope.is_empty() {
            transformed = transformed.and_then(|plan| unwrap_primary_join_input(&plan))?;
        }

        // Wrapping then unwrapping the same input rebuilds an identical
        // tree.
        if transformed.is_changed() && transformed.data.as_ref() == plan.as_ref() {
            return Ok(Transformed::same(plan.clone()));
        }

        Ok(transformed)
    }
}

/// Wrap every subquery alias that's a direct input of a join in a
/// `CachedResults` node.
pub fn wrap_join_subquery_aliases(plan: &PlanRef) -> Result<Transformed<PlanRef>> {
    transform_up_with_context(plan, &stop_at_subquery_alias, &mut |tctx| {
        let node = tctx.node;
        let is_join_input = matches!(tctx.parent, Some(LogicalOperator::Join(_)));
        if !is_join_input || !matches!(node.as_ref(), LogicalOperator::SubqueryAlias(_)) {
            return Ok(Transformed::same(node.clone()));
        }

        Ok(Transformed::changed(Arc::new(LogicalOperator::CachedResults(
            Node::new(LogicalCachedResults, vec![node.clone()]),
        ))))
    })
}

/// Remove the `CachedResults` wrapper from the primary input of the
/// statement's joins.
///
/// Only the primary side of each join is followed. Anything under the
/// other side runs once per primary row and keeps its cache.
pub fn unwrap_primary_join_input(plan: &PlanRef) -> Result<Transformed<PlanRef>> {
    transform_up_with_context(plan, &on_primary_path, &mut |tctx| {
        let node = tctx.node;
        let on_join = matches!(tctx.parent, Some(LogicalOperator::Join(_)));
        match node.as_ref() {
            LogicalOperator::CachedResults(cached) if on_join => {
                Ok(Transformed::changed(cached.get_one_child_exact()?.clone()))
            }
            _ => Ok(Transformed::same(node.clone())),
        }
    })
}

fn on_primary_path(tctx: &TransformContext<'_>) -> bool {
    match tctx.parent {
        Some(LogicalOperator::Join(join)) => {
            tctx.child_idx == join.node.join_type.primary_child_idx()
        }
        Some(LogicalOperator::CachedResults(_)) | Some(LogicalOperator::SubqueryAlias(_)) => {
            false
        }
        _ => true,
    }
}
