use std::fmt;

use crate::arrays::datatype::DataType;

/// Column reference as written in the query, not yet bound to a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnresolvedColumnExpr {
    /// Optional table qualifier.
    pub table: Option<String>,
    pub name: String,
}

impl fmt::Display for UnresolvedColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Column bound to a position in the row seen by its node.
///
/// Rows are laid out with every enclosing scope's columns first, followed by
/// the columns of the node's input. An index smaller than the width of the
/// enclosing scope is a correlated reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpr {
    pub index: usize,
    pub table: Option<String>,
    pub name: String,
    pub datatype: DataType,
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// `*` or `t.*` in a projection list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StarExpr {
    pub table: Option<String>,
}

impl fmt::Display for StarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.*"),
            None => write!(f, "*"),
        }
    }
}
