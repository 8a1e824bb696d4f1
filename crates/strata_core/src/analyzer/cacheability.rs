//! Determinism and cacheability checks.
//!
//! A subquery is cacheable with respect to some minimum column index if it
//! never reads a column below that index (nothing from the enclosing rows)
//! and never calls a non-deterministic function.

use crate::expr::Expression;
use crate::logical::operator::LogicalOperator;
use crate::transform::inspect::{inspect_expr, inspect_plan, inspect_plan_expressions};

/// If evaluating `expr` once gives the same result for every row, given that
/// columns below `lowest_allowed_idx` change between rows.
pub fn expr_is_cacheable(expr: &Expression, lowest_allowed_idx: usize) -> bool {
    let mut cacheable = true;
    inspect_expr(expr, &mut |e| {
        match e {
            Expression::Column(col) if col.index < lowest_allowed_idx => cacheable = false,
            Expression::Function(function) if !function.function.is_deterministic() => {
                cacheable = false
            }
            Expression::Subquery(subquery) => {
                if !(is_deterministic(&subquery.query)
                    && node_is_cacheable(&subquery.query, lowest_allowed_idx))
                {
                    cacheable = false;
                }
                return false;
            }
            _ => (),
        }
        cacheable
    });
    cacheable
}

/// If all expressions in the plan are cacheable.
///
/// Subquery aliases are always cacheable, they cannot reference the
/// enclosing query, so they're not searched.
pub fn node_is_cacheable(plan: &LogicalOperator, lowest_allowed_idx: usize) -> bool {
    let mut cacheable = true;
    inspect_plan(plan, &mut |node| {
        if !cacheable {
            return false;
        }
        if matches!(node, LogicalOperator::SubqueryAlias(_)) {
            return false;
        }
        cacheable = node
            .expressions()
            .into_iter()
            .all(|expr| expr_is_cacheable(expr, lowest_allowed_idx));
        cacheable
    });
    cacheable
}

/// If the plan, including all nested subqueries, calls only deterministic
/// functions.
pub fn is_deterministic(plan: &LogicalOperator) -> bool {
    let mut deterministic = true;
    inspect_plan_expressions(plan, &mut |_, expr| {
        if !deterministic {
            return false;
        }
        if !expr_is_deterministic(expr) {
            deterministic = false;
        }
        // Checked the full expression already.
        false
    });
    deterministic
}

pub fn expr_is_deterministic(expr: &Expression) -> bool {
    let mut deterministic = true;
    inspect_expr(expr, &mut |e| {
        match e {
            Expression::Function(function) if !function.function.is_deterministic() => {
                deterministic = false
            }
            Expression::Subquery(subquery) => {
                if !is_deterministic(&subquery.query) {
                    deterministic = false;
                }
            }
            _ => (),
        }
        deterministic
    });
    deterministic
}
