//! Helpers for constructing plans.
//!
//! These produce the unresolved shapes a parser hands to the analyzer, plus a
//! few resolved nodes for building plans directly.

use std::sync::Arc;

use chrono::Utc;

use super::logical_alias::{LogicalSubqueryAlias, LogicalTableAlias};
use super::logical_cache::{LogicalCachedResults, LogicalStripRow};
use super::logical_filter::LogicalFilter;
use super::logical_join::{JoinType, LogicalJoin};
use super::logical_passthrough::{LogicalPassthrough, PassthroughKind};
use super::logical_project::LogicalProject;
use super::logical_scan::{LogicalScan, LogicalUnresolvedTable};
use super::logical_single_row::LogicalSingleRow;
use super::logical_table_function::LogicalUnresolvedTableFunction;
use super::logical_trigger::{
    LogicalCreateTrigger,
    LogicalTriggerBlock,
    TriggerEvent,
    TriggerOrder,
    TriggerTiming,
};
use super::operator::{LogicalOperator, Node, PlanRef};
use super::schema::Field;
use crate::arrays::datatype::DataType;
use crate::expr::Expression;

pub fn single_row() -> PlanRef {
    Arc::new(LogicalOperator::SingleRow(Node::new(
        LogicalSingleRow,
        Vec::new(),
    )))
}

/// Unresolved table in the current database.
pub fn table(name: impl Into<String>) -> PlanRef {
    Arc::new(LogicalOperator::UnresolvedTable(Node::new(
        LogicalUnresolvedTable {
            database: None,
            name: name.into(),
        },
        Vec::new(),
    )))
}

pub fn qualified_table(database: impl Into<String>, name: impl Into<String>) -> PlanRef {
    Arc::new(LogicalOperator::UnresolvedTable(Node::new(
        LogicalUnresolvedTable {
            database: Some(database.into()),
            name: name.into(),
        },
        Vec::new(),
    )))
}

/// Resolved scan with the given columns.
pub fn scan(database: &str, table: &str, columns: &[(&str, DataType)]) -> PlanRef {
    let schema = columns
        .iter()
        .map(|(name, datatype)| Field::new(*name, *datatype, true).with_table(table))
        .collect();
    Arc::new(LogicalOperator::Scan(Node::new(
        LogicalScan {
            database: database.to_string(),
            table: table.to_string(),
            schema,
        },
        Vec::new(),
    )))
}

pub fn table_function(name: impl Into<String>, args: Vec<Expression>) -> PlanRef {
    Arc::new(LogicalOperator::UnresolvedTableFunction(Node::new(
        LogicalUnresolvedTableFunction {
            name: name.into(),
            args,
        },
        Vec::new(),
    )))
}

pub fn project(child: PlanRef, projections: Vec<Expression>) -> PlanRef {
    Arc::new(LogicalOperator::Project(Node::new(
        LogicalProject { projections },
        vec![child],
    )))
}

pub fn filter(child: PlanRef, filter: Expression) -> PlanRef {
    Arc::new(LogicalOperator::Filter(Node::new(
        LogicalFilter { filter },
        vec![child],
    )))
}

pub fn join(
    left: PlanRef,
    right: PlanRef,
    join_type: JoinType,
    condition: Option<Expression>,
) -> PlanRef {
    Arc::new(LogicalOperator::Join(Node::new(
        LogicalJoin {
            join_type,
            condition,
            scope_len: 0,
        },
        vec![left, right],
    )))
}

pub fn cross_join(left: PlanRef, right: PlanRef) -> PlanRef {
    join(left, right, JoinType::Cross, None)
}

pub fn subquery_alias(name: impl Into<String>, columns: &[&str], child: PlanRef) -> PlanRef {
    Arc::new(LogicalOperator::SubqueryAlias(Node::new(
        LogicalSubqueryAlias {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        },
        vec![child],
    )))
}

pub fn table_alias(name: impl Into<String>, child: PlanRef) -> PlanRef {
    Arc::new(LogicalOperator::TableAlias(Node::new(
        LogicalTableAlias { name: name.into() },
        vec![child],
    )))
}

pub fn cached_results(child: PlanRef) -> PlanRef {
    Arc::new(LogicalOperator::CachedResults(Node::new(
        LogicalCachedResults,
        vec![child],
    )))
}

pub fn strip_row(num_columns: usize, child: PlanRef) -> PlanRef {
    Arc::new(LogicalOperator::StripRow(Node::new(
        LogicalStripRow { num_columns },
        vec![child],
    )))
}

pub fn passthrough(kind: PassthroughKind, child: PlanRef) -> PlanRef {
    Arc::new(LogicalOperator::Passthrough(Node::new(
        LogicalPassthrough { kind },
        vec![child],
    )))
}

pub fn trigger_block(statements: Vec<PlanRef>) -> PlanRef {
    Arc::new(LogicalOperator::TriggerBlock(Node::new(
        LogicalTriggerBlock,
        statements,
    )))
}

/// `CREATE TRIGGER` on `table` with the given body.
///
/// The statement text is reconstructed from the parts.
pub fn create_trigger(
    name: impl Into<String>,
    timing: TriggerTiming,
    event: TriggerEvent,
    order: Option<TriggerOrder>,
    table: PlanRef,
    body: PlanRef,
    body_text: impl Into<String>,
) -> PlanRef {
    let mut node = Node::new(
        LogicalCreateTrigger {
            name: name.into(),
            timing,
            event,
            order,
            body,
            body_text: body_text.into(),
            create_statement: String::new(),
            created_at: Utc::now(),
            database: None,
        },
        vec![table],
    );
    node.node.create_statement = node.create_trigger_string();

    Arc::new(LogicalOperator::CreateTrigger(node))
}
