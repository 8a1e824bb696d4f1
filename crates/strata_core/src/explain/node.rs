use serde::{Deserialize, Serialize};

use super::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::logical::operator::LogicalOperator;
use crate::transform::inspect::inspect_expr;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExplainNode {
    pub entry: ExplainEntry,
    pub children: Vec<ExplainNode>,
}

impl ExplainNode {
    pub fn new_from_logical_plan(verbose: bool, root: &LogicalOperator) -> Self {
        let config = ExplainConfig { verbose };
        Self::walk_logical(config, root)
    }

    fn walk_logical(config: ExplainConfig, plan: &LogicalOperator) -> Self {
        let entry = plan.explain_entry(config);

        let mut children: Vec<_> = plan
            .children()
            .iter()
            .map(|c| Self::walk_logical(config, c))
            .collect();

        // Subquery plans hang off of expressions, not children.
        for expr in plan.expressions() {
            Self::walk_subqueries(config, expr, &mut children);
        }

        if let LogicalOperator::CreateTrigger(n) = plan {
            children.push(Self::walk_logical(config, &n.node.body));
        }

        ExplainNode { entry, children }
    }

    fn walk_subqueries(config: ExplainConfig, expr: &Expression, out: &mut Vec<ExplainNode>) {
        inspect_expr(expr, &mut |e| {
            if let Expression::Subquery(subquery) = e {
                let entry = ExplainEntry::new("Subquery")
                    .with_value("cache_results", subquery.cache_results);
                out.push(ExplainNode {
                    entry,
                    children: vec![Self::walk_logical(config, &subquery.query)],
                });
                // Nested subqueries are reached through the inner plan.
                return false;
            }
            true
        });
    }
}
