use strata_error::{DbError, ErrorKind, Result};

use crate::expr::Expression;
use crate::logical::operator::LogicalOperator;
use crate::transform::inspect::inspect_expr;

/// Check that a plan is fully resolved.
///
/// Errors with the first unresolved thing found. Children are searched
/// before a node's own expressions. Nested subquery plans and trigger bodies
/// are searched as well.
pub fn validate_resolved(plan: &LogicalOperator) -> Result<()> {
    match find_unresolved(plan) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn find_unresolved(plan: &LogicalOperator) -> Option<DbError> {
    if let Some(err) = plan.children().iter().find_map(|child| find_unresolved(child)) {
        return Some(err);
    }

    match plan {
        LogicalOperator::UnresolvedTable(n) => {
            return Some(
                DbError::with_kind(
                    ErrorKind::UnknownTable,
                    format!("Table '{}' could not be resolved", n.node.name),
                )
                .with_field("table", &n.node.name),
            );
        }
        LogicalOperator::UnresolvedTableFunction(n) => {
            return Some(DbError::with_kind(
                ErrorKind::UnknownTableFunction,
                format!("Table function '{}' could not be resolved", n.node.name),
            ));
        }
        LogicalOperator::CreateTrigger(n) => {
            if let Some(err) = find_unresolved(&n.node.body) {
                return Some(err);
            }
            if n.node.database.is_none() {
                return Some(
                    DbError::with_kind(ErrorKind::Unresolved, "Trigger database not bound")
                        .with_field("trigger", &n.node.name),
                );
            }
        }
        _ => (),
    }

    plan.expressions()
        .into_iter()
        .find_map(find_unresolved_expr)
        .map(|err| err.with_field("node", plan.name()))
}

fn find_unresolved_expr(expr: &Expression) -> Option<DbError> {
    let mut found = None;

    inspect_expr(expr, &mut |e| {
        if found.is_some() {
            return false;
        }

        match e {
            Expression::UnresolvedColumn(col) => {
                found = Some(
                    DbError::with_kind(
                        ErrorKind::UnresolvedColumn,
                        format!("Column '{col}' could not be found"),
                    )
                    .with_field("column", col),
                );
                false
            }
            Expression::UnresolvedFunction(function) => {
                found = Some(DbError::with_kind(
                    ErrorKind::UnknownFunction,
                    format!("Function '{}' could not be resolved", function.name),
                ));
                false
            }
            Expression::Star(star) => {
                found = Some(DbError::with_kind(
                    ErrorKind::Unresolved,
                    format!("Wildcard '{star}' was not expanded"),
                ));
                false
            }
            Expression::Subquery(subquery) => {
                found = find_unresolved(&subquery.query);
                false
            }
            _ => true,
        }
    });

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::expr::{call, col, column, eq, lit, subquery};
    use crate::logical::builder::{filter, project, scan, single_row, table};

    fn t1() -> crate::logical::operator::PlanRef {
        scan("mydb", "t1", &[("a", DataType::Int64)])
    }

    #[test]
    fn resolved_plan() {
        let plan = filter(t1(), eq(column(0, "a", DataType::Int64), lit(1)));
        validate_resolved(&plan).unwrap();
    }

    #[test]
    fn unresolved_column() {
        let plan = filter(t1(), eq(col("x"), lit(1)));
        let err = validate_resolved(&plan).unwrap_err();
        assert_eq!(ErrorKind::UnresolvedColumn, err.kind());
        assert_eq!(Some("x"), err.get_field("column"));
        assert_eq!(Some("Filter"), err.get_field("node"));
    }

    #[test]
    fn unresolved_in_subquery() {
        let sub = project(single_row(), vec![call("nope", vec![])]);
        let plan = filter(t1(), eq(column(0, "a", DataType::Int64), subquery(sub)));
        let err = validate_resolved(&plan).unwrap_err();
        assert_eq!(ErrorKind::UnknownFunction, err.kind());
    }

    #[test]
    fn deepest_problem_first() {
        // The projection can't be bound until the filter is.
        let plan = project(filter(t1(), eq(col("x"), lit(1))), vec![col("y")]);
        let err = validate_resolved(&plan).unwrap_err();
        assert_eq!(Some("x"), err.get_field("column"));
    }

    #[test]
    fn unresolved_table() {
        let plan = project(table("missing"), vec![lit(1)]);
        let err = validate_resolved(&plan).unwrap_err();
        assert_eq!(ErrorKind::UnknownTable, err.kind());
    }
}
