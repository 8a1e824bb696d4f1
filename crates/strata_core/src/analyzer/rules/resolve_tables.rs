use std::sync::Arc;

use strata_error::{DbError, ErrorKind, Result};

use super::AnalyzerRule;
use crate::analyzer::Analyzer;
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::logical::logical_scan::LogicalScan;
use crate::logical::operator::{LogicalOperator, Node, PlanRef};
use crate::transform::Transformed;
use crate::transform::plan::transform_up;

/// Replaces table references with scans of catalog tables.
#[derive(Debug, Clone, Copy)]
pub struct ResolveTables;

impl AnalyzerRule for ResolveTables {
    fn name(&self) -> &'static str {
        "resolve_tables"
    }

    fn apply(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        _scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        transform_up(plan, &mut |node| {
            let unresolved = match node.as_ref() {
                LogicalOperator::UnresolvedTable(n) => &n.node,
                _ => return Ok(Transformed::same(node.clone())),
            };

            let db_name = unresolved
                .database
                .as_deref()
                .unwrap_or(ctx.current_database());
            let database = analyzer.catalog().database(db_name)?;
            let table = database.get_table(&unresolved.name)?.ok_or_else(|| {
                DbError::with_kind(
                    ErrorKind::UnknownTable,
                    format!("Missing table '{}'", unresolved.name),
                )
                .with_field("database", db_name)
            })?;

            Ok(Transformed::changed(Arc::new(LogicalOperator::Scan(
                Node::new(
                    LogicalScan {
                        database: database.name().to_string(),
                        table: table.name.clone(),
                        schema: table.fields(&unresolved.name),
                    },
                    Vec::new(),
                ),
            ))))
        })
    }
}
