use std::fmt;
use std::sync::Arc;

use strata_error::{DbError, ErrorKind, OptionExt, Result};

use super::logical_alias::{LogicalSubqueryAlias, LogicalTableAlias};
use super::logical_cache::{LogicalCachedResults, LogicalStripRow};
use super::logical_filter::LogicalFilter;
use super::logical_join::LogicalJoin;
use super::logical_passthrough::LogicalPassthrough;
use super::logical_project::LogicalProject;
use super::logical_scan::{LogicalScan, LogicalUnresolvedTable};
use super::logical_single_row::LogicalSingleRow;
use super::logical_table_function::{LogicalTableFunction, LogicalUnresolvedTableFunction};
use super::logical_trigger::{LogicalCreateTrigger, LogicalTriggerBlock};
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::explain::formatter::write_text;
use crate::explain::node::ExplainNode;
use crate::expr::Expression;

/// Shared reference to a plan node.
///
/// Plans are never mutated once built. Rewrites produce new nodes that share
/// unchanged subtrees with the original.
pub type PlanRef = Arc<LogicalOperator>;

/// Requirements for a logical node payload.
pub trait LogicalNode {
    fn name(&self) -> &'static str;

    /// Output columns of the node given the concatenated output columns of
    /// its children.
    ///
    /// Only meaningful once the node and its children are resolved.
    fn output_schema(&self, input: Vec<Field>) -> Vec<Field>;

    /// Expressions attached to this node, not including expressions in
    /// children.
    fn expressions(&self) -> Vec<&Expression> {
        Vec::new()
    }

    fn for_each_expr_mut<F>(&mut self, _func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        Ok(())
    }

    /// If the node's own metadata is bound. Expressions and children are
    /// checked separately.
    fn is_bound(&self) -> bool {
        true
    }
}

/// Wrapper around a node payload and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<N> {
    pub node: N,
    pub children: Vec<PlanRef>,
}

impl<N> Node<N> {
    pub fn new(node: N, children: Vec<PlanRef>) -> Self {
        Node { node, children }
    }

    pub fn into_inner(self) -> N {
        self.node
    }

    pub fn get_one_child_exact(&self) -> Result<&PlanRef> {
        if self.children.len() != 1 {
            return Err(DbError::with_kind(
                ErrorKind::Internal,
                format!(
                    "Expected 1 child to operator, have {}",
                    self.children.len()
                ),
            ));
        }
        Ok(&self.children[0])
    }

    pub fn get_nth_child(&self, n: usize) -> Result<&PlanRef> {
        self.children.get(n).ok_or_else(|| {
            DbError::with_kind(
                ErrorKind::Internal,
                format!(
                    "Expected at least {} children, got {}",
                    n + 1,
                    self.children.len()
                ),
            )
        })
    }

    /// Output columns of all children, concatenated in child order.
    pub fn children_schema(&self) -> Vec<Field> {
        self.children.iter().fold(Vec::new(), |mut fields, child| {
            fields.extend(child.output_schema());
            fields
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    SingleRow(Node<LogicalSingleRow>),
    UnresolvedTable(Node<LogicalUnresolvedTable>),
    Scan(Node<LogicalScan>),
    UnresolvedTableFunction(Node<LogicalUnresolvedTableFunction>),
    TableFunction(Node<LogicalTableFunction>),
    Project(Node<LogicalProject>),
    Filter(Node<LogicalFilter>),
    Join(Node<LogicalJoin>),
    SubqueryAlias(Node<LogicalSubqueryAlias>),
    TableAlias(Node<LogicalTableAlias>),
    CachedResults(Node<LogicalCachedResults>),
    StripRow(Node<LogicalStripRow>),
    Passthrough(Node<LogicalPassthrough>),
    TriggerBlock(Node<LogicalTriggerBlock>),
    CreateTrigger(Node<LogicalCreateTrigger>),
}

impl LogicalOperator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleRow(n) => n.node.name(),
            Self::UnresolvedTable(n) => n.node.name(),
            Self::Scan(n) => n.node.name(),
            Self::UnresolvedTableFunction(n) => n.node.name(),
            Self::TableFunction(n) => n.node.name(),
            Self::Project(n) => n.node.name(),
            Self::Filter(n) => n.node.name(),
            Self::Join(n) => n.node.name(),
            Self::SubqueryAlias(n) => n.node.name(),
            Self::TableAlias(n) => n.node.name(),
            Self::CachedResults(n) => n.node.name(),
            Self::StripRow(n) => n.node.name(),
            Self::Passthrough(n) => n.node.name(),
            Self::TriggerBlock(n) => n.node.name(),
            Self::CreateTrigger(n) => n.node.name(),
        }
    }

    pub fn children(&self) -> &[PlanRef] {
        match self {
            Self::SingleRow(n) => &n.children,
            Self::UnresolvedTable(n) => &n.children,
            Self::Scan(n) => &n.children,
            Self::UnresolvedTableFunction(n) => &n.children,
            Self::TableFunction(n) => &n.children,
            Self::Project(n) => &n.children,
            Self::Filter(n) => &n.children,
            Self::Join(n) => &n.children,
            Self::SubqueryAlias(n) => &n.children,
            Self::TableAlias(n) => &n.children,
            Self::CachedResults(n) => &n.children,
            Self::StripRow(n) => &n.children,
            Self::Passthrough(n) => &n.children,
            Self::TriggerBlock(n) => &n.children,
            Self::CreateTrigger(n) => &n.children,
        }
    }

    fn children_mut(&mut self) -> &mut Vec<PlanRef> {
        match self {
            Self::SingleRow(n) => &mut n.children,
            Self::UnresolvedTable(n) => &mut n.children,
            Self::Scan(n) => &mut n.children,
            Self::UnresolvedTableFunction(n) => &mut n.children,
            Self::TableFunction(n) => &mut n.children,
            Self::Project(n) => &mut n.children,
            Self::Filter(n) => &mut n.children,
            Self::Join(n) => &mut n.children,
            Self::SubqueryAlias(n) => &mut n.children,
            Self::TableAlias(n) => &mut n.children,
            Self::CachedResults(n) => &mut n.children,
            Self::StripRow(n) => &mut n.children,
            Self::Passthrough(n) => &mut n.children,
            Self::TriggerBlock(n) => &mut n.children,
            Self::CreateTrigger(n) => &mut n.children,
        }
    }

    /// Produce a copy of this node with the given children.
    ///
    /// Errors if the number of children differs from the current number of
    /// children. The original node is left as is.
    pub fn with_children(&self, children: Vec<PlanRef>) -> Result<LogicalOperator> {
        let current = self.children().len();
        if current != children.len() {
            return Err(DbError::with_kind(
                ErrorKind::Arity,
                format!(
                    "Expected {current} children for {}, got {}",
                    self.name(),
                    children.len()
                ),
            ));
        }

        let mut node = self.clone();
        *node.children_mut() = children;
        Ok(node)
    }

    /// Expressions attached to this node.
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Self::SingleRow(n) => n.node.expressions(),
            Self::UnresolvedTable(n) => n.node.expressions(),
            Self::Scan(n) => n.node.expressions(),
            Self::UnresolvedTableFunction(n) => n.node.expressions(),
            Self::TableFunction(n) => n.node.expressions(),
            Self::Project(n) => n.node.expressions(),
            Self::Filter(n) => n.node.expressions(),
            Self::Join(n) => n.node.expressions(),
            Self::SubqueryAlias(n) => n.node.expressions(),
            Self::TableAlias(n) => n.node.expressions(),
            Self::CachedResults(n) => n.node.expressions(),
            Self::StripRow(n) => n.node.expressions(),
            Self::Passthrough(n) => n.node.expressions(),
            Self::TriggerBlock(n) => n.node.expressions(),
            Self::CreateTrigger(n) => n.node.expressions(),
        }
    }

    pub fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        match self {
            Self::SingleRow(n) => n.node.for_each_expr_mut(func),
            Self::UnresolvedTable(n) => n.node.for_each_expr_mut(func),
            Self::Scan(n) => n.node.for_each_expr_mut(func),
            Self::UnresolvedTableFunction(n) => n.node.for_each_expr_mut(func),
            Self::TableFunction(n) => n.node.for_each_expr_mut(func),
            Self::Project(n) => n.node.for_each_expr_mut(func),
            Self::Filter(n) => n.node.for_each_expr_mut(func),
            Self::Join(n) => n.node.for_each_expr_mut(func),
            Self::SubqueryAlias(n) => n.node.for_each_expr_mut(func),
            Self::TableAlias(n) => n.node.for_each_expr_mut(func),
            Self::CachedResults(n) => n.node.for_each_expr_mut(func),
            Self::StripRow(n) => n.node.for_each_expr_mut(func),
            Self::Passthrough(n) => n.node.for_each_expr_mut(func),
            Self::TriggerBlock(n) => n.node.for_each_expr_mut(func),
            Self::CreateTrigger(n) => n.node.for_each_expr_mut(func),
        }
    }

    /// Produce a copy of this node with its expressions replaced, in the
    /// order returned by `expressions`.
    pub fn with_expressions(&self, exprs: Vec<Expression>) -> Result<LogicalOperator> {
        let current = self.expressions().len();
        if current != exprs.len() {
            return Err(DbError::with_kind(
                ErrorKind::Arity,
                format!(
                    "Expected {current} expressions for {}, got {}",
                    self.name(),
                    exprs.len()
                ),
            ));
        }

        let mut node = self.clone();
        let mut exprs = exprs.into_iter();
        node.for_each_expr_mut(&mut |expr| {
            *expr = exprs.next().required("node expression")?;
            Ok(())
        })?;

        Ok(node)
    }

    fn is_bound(&self) -> bool {
        match self {
            Self::SingleRow(n) => n.node.is_bound(),
            Self::UnresolvedTable(n) => n.node.is_bound(),
            Self::Scan(n) => n.node.is_bound(),
            Self::UnresolvedTableFunction(n) => n.node.is_bound(),
            Self::TableFunction(n) => n.node.is_bound(),
            Self::Project(n) => n.node.is_bound(),
            Self::Filter(n) => n.node.is_bound(),
            Self::Join(n) => n.node.is_bound(),
            Self::SubqueryAlias(n) => n.node.is_bound(),
            Self::TableAlias(n) => n.node.is_bound(),
            Self::CachedResults(n) => n.node.is_bound(),
            Self::StripRow(n) => n.node.is_bound(),
            Self::Passthrough(n) => n.node.is_bound(),
            Self::TriggerBlock(n) => n.node.is_bound(),
            Self::CreateTrigger(n) => n.node.is_bound(),
        }
    }

    /// If this node's metadata, its expressions, and all of its children are
    /// fully bound.
    pub fn resolved(&self) -> bool {
        self.is_bound()
            && self.expressions().iter().all(|e| e.resolved())
            && self.children().iter().all(|c| c.resolved())
    }

    /// Concatenated output columns of this node's children.
    ///
    /// This is what expressions on this node may reference, after any outer
    /// scope columns.
    pub fn input_schema(&self) -> Vec<Field> {
        self.children().iter().fold(Vec::new(), |mut fields, child| {
            fields.extend(child.output_schema());
            fields
        })
    }

    pub fn output_schema(&self) -> Vec<Field> {
        match self {
            Self::SingleRow(n) => n.node.output_schema(n.children_schema()),
            Self::UnresolvedTable(n) => n.node.output_schema(n.children_schema()),
            Self::Scan(n) => n.node.output_schema(n.children_schema()),
            Self::UnresolvedTableFunction(n) => n.node.output_schema(n.children_schema()),
            Self::TableFunction(n) => n.node.output_schema(n.children_schema()),
            Self::Project(n) => n.node.output_schema(n.children_schema()),
            Self::Filter(n) => n.node.output_schema(n.children_schema()),
            Self::Join(n) => n.node.output_schema(n.children_schema()),
            Self::SubqueryAlias(n) => n.node.output_schema(n.children_schema()),
            Self::TableAlias(n) => n.node.output_schema(n.children_schema()),
            Self::CachedResults(n) => n.node.output_schema(n.children_schema()),
            Self::StripRow(n) => n.node.output_schema(n.children_schema()),
            Self::Passthrough(n) => n.node.output_schema(n.children_schema()),
            Self::TriggerBlock(n) => n.node.output_schema(n.children_schema()),
            Self::CreateTrigger(n) => n.node.output_schema(n.children_schema()),
        }
    }

    /// Verbose rendering of the plan tree.
    pub fn debug_string(&self) -> String {
        let node = ExplainNode::new_from_logical_plan(true, self);
        let mut buf = String::new();
        // Writing to a string doesn't fail.
        let _ = write_text(&node, 0, &mut buf);
        buf
    }
}

impl Explainable for LogicalOperator {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        match self {
            Self::SingleRow(n) => n.node.explain_entry(conf),
            Self::UnresolvedTable(n) => n.node.explain_entry(conf),
            Self::Scan(n) => n.node.explain_entry(conf),
            Self::UnresolvedTableFunction(n) => n.node.explain_entry(conf),
            Self::TableFunction(n) => n.node.explain_entry(conf),
            Self::Project(n) => n.node.explain_entry(conf),
            Self::Filter(n) => n.node.explain_entry(conf),
            Self::Join(n) => n.node.explain_entry(conf),
            Self::SubqueryAlias(n) => n.node.explain_entry(conf),
            Self::TableAlias(n) => n.node.explain_entry(conf),
            Self::CachedResults(n) => n.node.explain_entry(conf),
            Self::StripRow(n) => n.node.explain_entry(conf),
            Self::Passthrough(n) => n.node.explain_entry(conf),
            Self::TriggerBlock(n) => n.node.explain_entry(conf),
            Self::CreateTrigger(n) => n.node.explain_entry(conf),
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = ExplainNode::new_from_logical_plan(false, self);
        write_text(&node, 0, f)
    }
}
