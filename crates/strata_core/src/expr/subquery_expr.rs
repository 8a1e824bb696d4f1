use std::fmt;

use crate::logical::operator::PlanRef;

/// Scalar subquery producing a single value per evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryExpr {
    pub query: PlanRef,
    /// Evaluate once and reuse the result for every row.
    pub cache_results: bool,
}

impl fmt::Display for SubqueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cache_results {
            write!(f, "(SUBQUERY cached)")
        } else {
            write!(f, "(SUBQUERY)")
        }
    }
}
