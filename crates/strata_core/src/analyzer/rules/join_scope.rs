use std::sync::Arc;

use strata_error::Result;

use super::AnalyzerRule;
use crate::analyzer::Analyzer;
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::logical::logical_cache::LogicalStripRow;
use crate::logical::logical_join::LogicalJoin;
use crate::logical::operator::{LogicalOperator, Node, PlanRef};
use crate::transform::Transformed;
use crate::transform::plan::{stop_at_subquery_alias, transform_up_with_context};

/// Records the width of the enclosing scope on joins inside nested queries.
///
/// Rows flowing through a nested query are prefixed with the enclosing
/// scope's columns. Join inputs get a `StripRow` so they only see their own
/// columns, and the join adds the prefix back.
#[derive(Debug, Clone, Copy)]
pub struct SetJoinScopeLen;

impl AnalyzerRule for SetJoinScopeLen {
    fn name(&self) -> &'static str {
        "set_join_scope_len"
    }

    fn apply(
        &self,
        _ctx: &AnalysisContext,
        _analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        let scope_len = scope.len();
        if scope_len == 0 {
            return Ok(Transformed::same(plan.clone()));
        }

        transform_up_with_context(plan, &stop_at_subquery_alias, &mut |tctx| {
            let node = tctx.node;
            let join = match node.as_ref() {
                LogicalOperator::Join(join) => join,
                _ => return Ok(Transformed::same(node.clone())),
            };

            let needs_strip =
                |child: &PlanRef| !matches!(child.as_ref(), LogicalOperator::StripRow(_));
            if join.node.scope_len == scope_len && !join.children.iter().any(needs_strip) {
                return Ok(Transformed::same(node.clone()));
            }

            let children = join
                .children
                .iter()
                .map(|child| {
                    if needs_strip(child) {
                        Arc::new(LogicalOperator::StripRow(Node::new(
                            LogicalStripRow {
                                num_columns: scope_len,
                            },
                            vec![child.clone()],
                        )))
                    } else {
                        child.clone()
                    }
                })
                .collect();

            Ok(Transformed::changed(Arc::new(LogicalOperator::Join(Node::new(
                LogicalJoin {
                    scope_len,
                    ..join.node.clone()
                },
                children,
            )))))
        })
    }
}
