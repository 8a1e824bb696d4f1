use std::fmt;

use super::Expression;

#[derive(Debug, Clone, PartialEq)]
pub struct AliasExpr {
    pub expr: Box<Expression>,
    pub name: String,
}

impl fmt::Display for AliasExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.expr, self.name)
    }
}
