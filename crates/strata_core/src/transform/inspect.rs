//! Read-only pre-order walks. Returning false from the visitor skips
//! everything below the visited node.

use crate::expr::Expression;
use crate::logical::operator::LogicalOperator;

pub fn inspect_plan<F>(plan: &LogicalOperator, f: &mut F)
where
    F: FnMut(&LogicalOperator) -> bool,
{
    if !f(plan) {
        return;
    }
    for child in plan.children() {
        inspect_plan(child, f);
    }
}

pub fn inspect_expr<F>(expr: &Expression, f: &mut F)
where
    F: FnMut(&Expression) -> bool,
{
    if !f(expr) {
        return;
    }
    for child in expr.children() {
        inspect_expr(child, f);
    }
}

/// Walk every expression of every node in the plan.
///
/// Returning false skips the children of the visited expression. All nodes
/// are always visited.
pub fn inspect_plan_expressions<F>(plan: &LogicalOperator, f: &mut F)
where
    F: FnMut(&LogicalOperator, &Expression) -> bool,
{
    inspect_plan(plan, &mut |node| {
        for expr in node.expressions() {
            inspect_expr(expr, &mut |e| f(node, e));
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{self, col, lit};
    use crate::logical::builder::{filter, project, single_row, table};

    #[test]
    fn prune_plan_walk() {
        let plan = project(filter(table("t1"), lit(true)), vec![lit(1)]);

        let mut names = Vec::new();
        inspect_plan(&plan, &mut |node| {
            names.push(node.name());
            !matches!(node, LogicalOperator::Filter(_))
        });
        assert_eq!(vec!["Project", "Filter"], names);
    }

    #[test]
    fn visit_all_expressions() {
        let plan = project(
            filter(single_row(), expr::eq(col("a"), lit(1))),
            vec![col("b")],
        );

        let mut seen = Vec::new();
        inspect_plan_expressions(&plan, &mut |node, e| {
            seen.push(format!("{}:{e}", node.name()));
            true
        });
        assert_eq!(vec!["Project:b", "Filter:a = 1", "Filter:a", "Filter:1"], seen);
    }
}
