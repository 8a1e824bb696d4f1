use std::sync::Arc;

use strata_error::Result;

use super::expr::transform_expr_up;
use super::{Transformed, TreeIdentity};
use crate::expr::Expression;
use crate::logical::operator::{LogicalOperator, PlanRef};

/// Position of a node being visited by a context aware transform.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub node: &'a PlanRef,
    /// Parent of the node before any rewrites. `None` for the root.
    pub parent: Option<&'a LogicalOperator>,
    /// Index of this node in the parent's children.
    pub child_idx: usize,
}

/// Rewrite a plan bottom-up, children before parents.
///
/// A parent is only rebuilt if one of its children changed.
pub fn transform_up<F>(plan: &PlanRef, f: &mut F) -> Result<Transformed<PlanRef>>
where
    F: FnMut(&PlanRef) -> Result<Transformed<PlanRef>>,
{
    let children = transform_children(plan, |_, child| transform_up(child, f))?;
    let node = f(&children.data)?;
    Ok(Transformed::new(
        node.data,
        children.identity.merge(node.identity),
    ))
}

/// Rewrite a plan bottom-up, giving the visitor the node's parent and
/// position.
///
/// The selector is checked before visiting a node. If it returns false, the
/// node and everything below it is left untouched.
pub fn transform_up_with_context<S, F>(
    plan: &PlanRef,
    selector: &S,
    f: &mut F,
) -> Result<Transformed<PlanRef>>
where
    S: Fn(&TransformContext<'_>) -> bool,
    F: FnMut(&TransformContext<'_>) -> Result<Transformed<PlanRef>>,
{
    let ctx = TransformContext {
        node: plan,
        parent: None,
        child_idx: 0,
    };
    transform_up_with_context_inner(ctx, selector, f)
}

fn transform_up_with_context_inner<S, F>(
    ctx: TransformContext<'_>,
    selector: &S,
    f: &mut F,
) -> Result<Transformed<PlanRef>>
where
    S: Fn(&TransformContext<'_>) -> bool,
    F: FnMut(&TransformContext<'_>) -> Result<Transformed<PlanRef>>,
{
    if !selector(&ctx) {
        return Ok(Transformed::same(ctx.node.clone()));
    }

    let parent = ctx.node.as_ref();
    let children = transform_children(ctx.node, |child_idx, child| {
        let child_ctx = TransformContext {
            node: child,
            parent: Some(parent),
            child_idx,
        };
        transform_up_with_context_inner(child_ctx, selector, f)
    })?;

    let node = f(&TransformContext {
        node: &children.data,
        parent: ctx.parent,
        child_idx: ctx.child_idx,
    })?;

    Ok(Transformed::new(
        node.data,
        children.identity.merge(node.identity),
    ))
}

/// Apply `f` to each direct child, rebuilding the node only if a child
/// changed.
pub fn transform_children<F>(plan: &PlanRef, mut f: F) -> Result<Transformed<PlanRef>>
where
    F: FnMut(usize, &PlanRef) -> Result<Transformed<PlanRef>>,
{
    let mut identity = TreeIdentity::Same;
    let mut children = Vec::with_capacity(plan.children().len());
    for (idx, child) in plan.children().iter().enumerate() {
        let child = f(idx, child)?;
        identity = identity.merge(child.identity);
        children.push(child.data);
    }

    if identity.is_changed() {
        Ok(Transformed::changed(Arc::new(plan.with_children(children)?)))
    } else {
        Ok(Transformed::same(plan.clone()))
    }
}

/// Apply `f` to each top-level expression of a single node.
pub fn transform_node_expressions<F>(plan: &PlanRef, f: &mut F) -> Result<Transformed<PlanRef>>
where
    F: FnMut(Expression) -> Result<Transformed<Expression>>,
{
    let exprs = plan.expressions();
    if exprs.is_empty() {
        return Ok(Transformed::same(plan.clone()));
    }

    let mut identity = TreeIdentity::Same;
    let mut new_exprs = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let expr = f(expr.clone())?;
        identity = identity.merge(expr.identity);
        new_exprs.push(expr.data);
    }

    if identity.is_changed() {
        Ok(Transformed::changed(Arc::new(
            plan.with_expressions(new_exprs)?,
        )))
    } else {
        Ok(Transformed::same(plan.clone()))
    }
}

/// Rewrite every expression of every selected node, bottom-up within each
/// expression. The visitor also receives the node owning the expression.
pub fn transform_plan_expressions_with_node<S, F>(
    plan: &PlanRef,
    selector: &S,
    f: &mut F,
) -> Result<Transformed<PlanRef>>
where
    S: Fn(&TransformContext<'_>) -> bool,
    F: FnMut(&PlanRef, Expression) -> Result<Transformed<Expression>>,
{
    transform_up_with_context(plan, selector, &mut |ctx| {
        let node = ctx.node;
        transform_node_expressions(node, &mut |expr| {
            transform_expr_up(expr, &mut |e| f(node, e))
        })
    })
}

/// Selector visiting every node.
pub fn select_all(_ctx: &TransformContext<'_>) -> bool {
    true
}

/// Selector that doesn't descend into the children of subquery aliases.
///
/// The alias itself is still visited.
pub fn stop_at_subquery_alias(ctx: &TransformContext<'_>) -> bool {
    !matches!(ctx.parent, Some(LogicalOperator::SubqueryAlias(_)))
}

#[cfg(test)]
mod tests {
    use strata_error::{DbError, ErrorKind};

    use super::*;
    use crate::expr::{col, lit};
    use crate::logical::builder::{
        filter,
        join,
        project,
        single_row,
        subquery_alias,
        table,
        table_alias,
    };
    use crate::logical::logical_join::JoinType;

    fn rename_tables(plan: &PlanRef) -> Result<Transformed<PlanRef>> {
        transform_up(plan, &mut |node| match node.as_ref() {
            LogicalOperator::UnresolvedTable(n) if n.node.name == "t1" => {
                Ok(Transformed::changed(table("renamed")))
            }
            _ => Ok(Transformed::same(node.clone())),
        })
    }

    #[test]
    fn same_returns_input() {
        let plan = project(filter(table("t2"), lit(true)), vec![lit(1)]);
        let out = rename_tables(&plan).unwrap();
        assert_eq!(TreeIdentity::Same, out.identity);
        assert!(Arc::ptr_eq(&plan, &out.data));
    }

    #[test]
    fn changed_shares_untouched_subtrees() {
        let untouched = table("t2");
        let plan = join(table("t1"), untouched.clone(), JoinType::Inner, None);

        let out = rename_tables(&plan).unwrap();
        assert_eq!(TreeIdentity::Changed, out.identity);
        assert_eq!(join(table("renamed"), table("t2"), JoinType::Inner, None), out.data);
        assert!(Arc::ptr_eq(&untouched, &out.data.children()[1]));
        // Input unchanged.
        assert_eq!(join(table("t1"), table("t2"), JoinType::Inner, None), plan);
    }

    #[test]
    fn bottom_up_order() {
        let plan = project(filter(single_row(), lit(true)), vec![lit(1)]);
        let mut order = Vec::new();
        transform_up(&plan, &mut |node| {
            order.push(node.name());
            Ok(Transformed::same(node.clone()))
        })
        .unwrap();
        assert_eq!(vec!["SingleRow", "Filter", "Project"], order);
    }

    #[test]
    fn error_aborts() {
        let plan = project(table("t1"), vec![lit(1)]);
        let err = transform_up(&plan, &mut |_| -> Result<Transformed<PlanRef>> {
            Err(DbError::with_kind(ErrorKind::Internal, "boom"))
        })
        .unwrap_err();
        assert_eq!(ErrorKind::Internal, err.kind());
    }

    #[test]
    fn context_reports_parent_and_position() {
        let plan = join(table("t1"), table("t2"), JoinType::Right, None);
        let mut seen = Vec::new();
        transform_up_with_context(&plan, &select_all, &mut |ctx| {
            seen.push((
                ctx.node.name(),
                ctx.parent.map(|p| p.name()),
                ctx.child_idx,
            ));
            Ok(Transformed::same(ctx.node.clone()))
        })
        .unwrap();

        assert_eq!(
            vec![
                ("UnresolvedTable", Some("Join"), 0),
                ("UnresolvedTable", Some("Join"), 1),
                ("Join", None, 0),
            ],
            seen
        );
    }

    #[test]
    fn selector_skips_subtree() {
        let plan = join(table("t1"), table("t2"), JoinType::Right, None);
        // Only descend into the right side of the join.
        let selector = |ctx: &TransformContext<'_>| match ctx.parent {
            Some(LogicalOperator::Join(_)) => ctx.child_idx == 1,
            _ => true,
        };

        let mut visited = Vec::new();
        transform_up_with_context(&plan, &selector, &mut |ctx| {
            if let LogicalOperator::UnresolvedTable(n) = ctx.node.as_ref() {
                visited.push(n.node.name.clone());
            }
            Ok(Transformed::same(ctx.node.clone()))
        })
        .unwrap();
        assert_eq!(vec!["t2".to_string()], visited);
    }

    #[test]
    fn plan_expressions_with_node() {
        let inner = project(table("t1"), vec![col("a")]);
        let plan = project(
            subquery_alias("s", &[], inner.clone()),
            vec![col("b"), crate::expr::eq(col("c"), lit(1))],
        );

        let out = transform_plan_expressions_with_node(
            &plan,
            &stop_at_subquery_alias,
            &mut |node, expr| match expr {
                Expression::UnresolvedColumn(c) => Ok(Transformed::changed(lit(format!(
                    "{}.{}",
                    node.name(),
                    c.name
                )))),
                other => Ok(Transformed::same(other)),
            },
        )
        .unwrap();

        assert_eq!(TreeIdentity::Changed, out.identity);
        assert_eq!(
            vec![
                &lit("Project.b"),
                &crate::expr::eq(lit("Project.c"), lit(1))
            ],
            out.data.expressions()
        );
        // Below the alias is untouched.
        let alias = &out.data.children()[0];
        assert!(Arc::ptr_eq(&inner, &alias.children()[0]));
    }

    #[test]
    fn node_expressions_same() {
        let plan = table_alias("x", project(single_row(), vec![lit(1)]));
        let out = transform_node_expressions(&plan, &mut |e| Ok(Transformed::changed(e))).unwrap();
        // Table alias has no expressions.
        assert_eq!(TreeIdentity::Same, out.identity);
    }
}
