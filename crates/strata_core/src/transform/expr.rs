use strata_error::Result;

use super::{Transformed, TreeIdentity};
use crate::arrays::scalar::ScalarValue;
use crate::expr::{Expression, lit};

/// Rewrite an expression bottom-up, sub-expressions before the expression
/// itself.
pub fn transform_expr_up<F>(expr: Expression, f: &mut F) -> Result<Transformed<Expression>>
where
    F: FnMut(Expression) -> Result<Transformed<Expression>>,
{
    let mut expr = expr;
    let mut identity = TreeIdentity::Same;

    expr.for_each_child_mut(&mut |child| {
        let owned = std::mem::replace(child, lit(ScalarValue::Null));
        let transformed = transform_expr_up(owned, f)?;
        identity = identity.merge(transformed.identity);
        *child = transformed.data;
        Ok(())
    })?;

    let transformed = f(expr)?;
    Ok(Transformed::new(
        transformed.data,
        identity.merge(transformed.identity),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{alias, call, col, eq};

    #[test]
    fn rewrite_leaves() {
        let e = alias(eq(col("a"), call("abs", vec![col("b")])), "x");
        let out = transform_expr_up(e, &mut |e| match e {
            Expression::UnresolvedColumn(c) => Ok(Transformed::changed(lit(c.name))),
            other => Ok(Transformed::same(other)),
        })
        .unwrap();

        assert_eq!(TreeIdentity::Changed, out.identity);
        assert_eq!(
            alias(eq(lit("a"), call("abs", vec![lit("b")])), "x"),
            out.data
        );
    }

    #[test]
    fn same_when_untouched() {
        let e = eq(lit(1), lit(2));
        let out = transform_expr_up(e.clone(), &mut |e| Ok(Transformed::same(e))).unwrap();
        assert_eq!(TreeIdentity::Same, out.identity);
        assert_eq!(e, out.data);
    }
}
