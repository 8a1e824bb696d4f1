pub mod alias_expr;
pub mod column_expr;
pub mod comparison_expr;
pub mod function_expr;
pub mod literal_expr;
pub mod subquery_expr;
pub mod window;

use std::fmt;

use alias_expr::AliasExpr;
use column_expr::{ColumnExpr, StarExpr, UnresolvedColumnExpr};
use comparison_expr::{ComparisonExpr, ComparisonOperator};
use function_expr::{FunctionExpr, UnresolvedFunctionExpr};
use literal_expr::LiteralExpr;
use strata_error::{DbError, ErrorKind, OptionExt, Result};
use subquery_expr::SubqueryExpr;
use window::WindowSpec;

use crate::arrays::datatype::DataType;
use crate::arrays::scalar::ScalarValue;
use crate::logical::operator::PlanRef;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(LiteralExpr),
    UnresolvedColumn(UnresolvedColumnExpr),
    Column(ColumnExpr),
    Star(StarExpr),
    Alias(AliasExpr),
    Comparison(ComparisonExpr),
    UnresolvedFunction(UnresolvedFunctionExpr),
    Function(FunctionExpr),
    Subquery(SubqueryExpr),
}

impl Expression {
    /// Calls `func` for every direct child of this expression.
    ///
    /// Function inputs come before any expressions in the window spec. A
    /// subquery's plan is not an expression child.
    pub fn for_each_child<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        match self {
            Self::Literal(_)
            | Self::UnresolvedColumn(_)
            | Self::Column(_)
            | Self::Star(_)
            | Self::Subquery(_) => (),
            Self::Alias(alias) => func(&alias.expr)?,
            Self::Comparison(cmp) => {
                func(&cmp.left)?;
                func(&cmp.right)?;
            }
            Self::UnresolvedFunction(function) => {
                for arg in &function.args {
                    func(arg)?;
                }
                if let Some(window) = &function.window {
                    window.for_each_expr(func)?;
                }
            }
            Self::Function(function) => {
                for input in &function.inputs {
                    func(input)?;
                }
                if let Some(window) = &function.window {
                    window.for_each_expr(func)?;
                }
            }
        }
        Ok(())
    }

    pub fn for_each_child_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        match self {
            Self::Literal(_)
            | Self::UnresolvedColumn(_)
            | Self::Column(_)
            | Self::Star(_)
            | Self::Subquery(_) => (),
            Self::Alias(alias) => func(&mut alias.expr)?,
            Self::Comparison(cmp) => {
                func(&mut cmp.left)?;
                func(&mut cmp.right)?;
            }
            Self::UnresolvedFunction(function) => {
                for arg in &mut function.args {
                    func(arg)?;
                }
                if let Some(window) = &mut function.window {
                    window.for_each_expr_mut(func)?;
                }
            }
            Self::Function(function) => {
                for input in &mut function.inputs {
                    func(input)?;
                }
                if let Some(window) = &mut function.window {
                    window.for_each_expr_mut(func)?;
                }
            }
        }
        Ok(())
    }

    pub fn children(&self) -> Vec<&Expression> {
        let mut children: Vec<&Expression> = Vec::new();
        match self {
            Self::Literal(_)
            | Self::UnresolvedColumn(_)
            | Self::Column(_)
            | Self::Star(_)
            | Self::Subquery(_) => (),
            Self::Alias(alias) => children.push(&alias.expr),
            Self::Comparison(cmp) => {
                children.push(&cmp.left);
                children.push(&cmp.right);
            }
            Self::UnresolvedFunction(function) => {
                children.extend(function.args.iter());
                if let Some(window) = &function.window {
                    children.extend(window.exprs());
                }
            }
            Self::Function(function) => {
                children.extend(function.inputs.iter());
                if let Some(window) = &function.window {
                    children.extend(window.exprs());
                }
            }
        }
        children
    }

    /// Rebuild this expression with new children, in the same order as
    /// returned by `children`.
    pub fn with_children(&self, children: Vec<Expression>) -> Result<Expression> {
        let expected = self.children().len();
        if expected != children.len() {
            return Err(DbError::with_kind(
                ErrorKind::Arity,
                format!(
                    "Expected {expected} children for expression, got {}",
                    children.len()
                ),
            )
            .with_field("expression", self));
        }

        let mut expr = self.clone();
        let mut children = children.into_iter();
        expr.for_each_child_mut(&mut |child| {
            *child = children.next().required("child expression")?;
            Ok(())
        })?;

        Ok(expr)
    }

    /// If this expression and everything it contains is bound.
    pub fn resolved(&self) -> bool {
        match self {
            Self::UnresolvedColumn(_) | Self::Star(_) | Self::UnresolvedFunction(_) => false,
            Self::Subquery(subquery) => subquery.query.resolved(),
            other => other.children().iter().all(|c| c.resolved()),
        }
    }

    /// Output type of this expression.
    ///
    /// Unresolved expressions report `DataType::Null`.
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Literal(lit) => lit.literal.datatype(),
            Self::Column(col) => col.datatype,
            Self::Alias(alias) => alias.expr.datatype(),
            Self::Comparison(_) => DataType::Boolean,
            Self::Function(function) => function.return_type(),
            Self::Subquery(subquery) => subquery
                .query
                .output_schema()
                .first()
                .map(|f| f.datatype)
                .unwrap_or(DataType::Null),
            Self::UnresolvedColumn(_) | Self::Star(_) | Self::UnresolvedFunction(_) => {
                DataType::Null
            }
        }
    }

    /// Name this expression gets when used as a projection.
    pub fn output_name(&self) -> String {
        match self {
            Self::Column(col) => col.name.clone(),
            Self::UnresolvedColumn(col) => col.name.clone(),
            Self::Alias(alias) => alias.name.clone(),
            other => other.to_string(),
        }
    }

    /// Table qualifier this expression carries when used as a projection.
    pub fn output_table(&self) -> Option<&str> {
        match self {
            Self::Column(col) => col.table.as_deref(),
            Self::UnresolvedColumn(col) => col.table.as_deref(),
            _ => None,
        }
    }

    pub fn is_subquery(&self) -> bool {
        matches!(self, Self::Subquery(_))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(expr) => write!(f, "{expr}"),
            Self::UnresolvedColumn(expr) => write!(f, "{expr}"),
            Self::Column(expr) => write!(f, "{expr}"),
            Self::Star(expr) => write!(f, "{expr}"),
            Self::Alias(expr) => write!(f, "{expr}"),
            Self::Comparison(expr) => write!(f, "{expr}"),
            Self::UnresolvedFunction(expr) => write!(f, "{expr}"),
            Self::Function(expr) => write!(f, "{expr}"),
            Self::Subquery(expr) => write!(f, "{expr}"),
        }
    }
}

pub fn lit(literal: impl Into<ScalarValue>) -> Expression {
    Expression::Literal(LiteralExpr {
        literal: literal.into(),
    })
}

/// Unqualified column reference.
pub fn col(name: impl Into<String>) -> Expression {
    Expression::UnresolvedColumn(UnresolvedColumnExpr {
        table: None,
        name: name.into(),
    })
}

pub fn qualified_col(table: impl Into<String>, name: impl Into<String>) -> Expression {
    Expression::UnresolvedColumn(UnresolvedColumnExpr {
        table: Some(table.into()),
        name: name.into(),
    })
}

/// Bound column reference.
pub fn column(index: usize, name: impl Into<String>, datatype: DataType) -> Expression {
    Expression::Column(ColumnExpr {
        index,
        table: None,
        name: name.into(),
        datatype,
    })
}

pub fn star() -> Expression {
    Expression::Star(StarExpr { table: None })
}

pub fn qualified_star(table: impl Into<String>) -> Expression {
    Expression::Star(StarExpr {
        table: Some(table.into()),
    })
}

pub fn alias(expr: Expression, name: impl Into<String>) -> Expression {
    Expression::Alias(AliasExpr {
        expr: Box::new(expr),
        name: name.into(),
    })
}

pub fn cmp(op: ComparisonOperator, left: Expression, right: Expression) -> Expression {
    Expression::Comparison(ComparisonExpr {
        left: Box::new(left),
        right: Box::new(right),
        op,
    })
}

pub fn eq(left: Expression, right: Expression) -> Expression {
    cmp(ComparisonOperator::Eq, left, right)
}

/// Unresolved function call.
pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Expression {
    Expression::UnresolvedFunction(UnresolvedFunctionExpr {
        name: name.into(),
        args,
        window: None,
    })
}

/// Unresolved function call with an OVER clause.
pub fn window_call(
    name: impl Into<String>,
    args: Vec<Expression>,
    window: WindowSpec,
) -> Expression {
    Expression::UnresolvedFunction(UnresolvedFunctionExpr {
        name: name.into(),
        args,
        window: Some(window),
    })
}

pub fn subquery(query: PlanRef) -> Expression {
    Expression::Subquery(SubqueryExpr {
        query,
        cache_results: false,
    })
}
