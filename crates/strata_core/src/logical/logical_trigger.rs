use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use strata_error::{DbError, ErrorKind, Result};

use super::operator::{LogicalNode, LogicalOperator, Node, PlanRef};
use super::schema::Field;
use crate::catalog::{Database, TriggerDefinition};
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
}

impl fmt::Display for TriggerTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "BEFORE"),
            Self::After => write!(f, "AFTER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    /// If the body can reference the row as it was before the change.
    pub const fn has_old_row(&self) -> bool {
        matches!(self, Self::Update | Self::Delete)
    }

    /// If the body can reference the row as it is after the change.
    pub const fn has_new_row(&self) -> bool {
        matches!(self, Self::Insert | Self::Update)
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOrderKind {
    Precedes,
    Follows,
}

impl fmt::Display for TriggerOrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precedes => write!(f, "PRECEDES"),
            Self::Follows => write!(f, "FOLLOWS"),
        }
    }
}

/// Ordering of a trigger relative to another trigger on the same table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOrder {
    pub kind: TriggerOrderKind,
    pub other_trigger: String,
}

impl fmt::Display for TriggerOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.other_trigger)
    }
}

/// `BEGIN ... END` body of a trigger. Each child is a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalTriggerBlock;

impl Explainable for LogicalTriggerBlock {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("TriggerBlock")
    }
}

impl LogicalNode for LogicalTriggerBlock {
    fn name(&self) -> &'static str {
        "TriggerBlock"
    }

    fn output_schema(&self, _input: Vec<Field>) -> Vec<Field> {
        Vec::new()
    }
}

/// `CREATE TRIGGER`.
///
/// The only child is the table the trigger is defined on. The body is held
/// separately since it's analyzed with the affected row in scope, and not as
/// part of the statement's own tree.
#[derive(Debug, Clone)]
pub struct LogicalCreateTrigger {
    pub name: String,
    pub timing: TriggerTiming,
    pub event: TriggerEvent,
    pub order: Option<TriggerOrder>,
    pub body: PlanRef,
    /// Original text of the body.
    pub body_text: String,
    /// Original text of the full statement.
    pub create_statement: String,
    pub created_at: DateTime<Utc>,
    /// Database the trigger will be created in. Bound during analysis.
    pub database: Option<Arc<dyn Database>>,
}

impl LogicalCreateTrigger {
    pub fn with_body(&self, body: PlanRef) -> Self {
        LogicalCreateTrigger {
            body,
            ..self.clone()
        }
    }

    pub fn with_database(&self, database: Arc<dyn Database>) -> Self {
        LogicalCreateTrigger {
            database: Some(database),
            ..self.clone()
        }
    }

    /// Definition persisted by the database.
    pub fn definition(&self) -> TriggerDefinition {
        TriggerDefinition {
            name: self.name.clone(),
            create_statement: self.create_statement.clone(),
            created_at: self.created_at,
        }
    }

    /// Create the trigger in the bound database.
    pub fn create_trigger(&self) -> Result<()> {
        let database = self.database.as_ref().ok_or_else(|| {
            DbError::with_kind(ErrorKind::Unresolved, "Trigger database not bound")
                .with_field("trigger", &self.name)
        })?;

        match database.as_trigger_database() {
            Some(triggers) => triggers.create_trigger(self.definition()),
            None => Err(triggers_not_supported(database.as_ref())),
        }
    }
}

pub(crate) fn triggers_not_supported(database: &dyn Database) -> DbError {
    DbError::with_kind(
        ErrorKind::TriggersNotSupported,
        format!("Database '{}' does not support triggers", database.name()),
    )
}

impl PartialEq for LogicalCreateTrigger {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.timing == other.timing
            && self.event == other.event
            && self.order == other.order
            && self.body == other.body
            && self.body_text == other.body_text
            && self.create_statement == other.create_statement
            && self.created_at == other.created_at
            && self.database.as_ref().map(|db| db.name())
                == other.database.as_ref().map(|db| db.name())
    }
}

impl Explainable for LogicalCreateTrigger {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("CreateTrigger")
            .with_value("name", &self.name)
            .with_value("timing", self.timing)
            .with_value("event", self.event);
        if let Some(order) = &self.order {
            ent = ent.with_value("order", order);
        }
        if let Some(database) = &self.database {
            ent = ent.with_verbose_value("database", conf, database.name());
        }
        ent
    }
}

impl LogicalNode for LogicalCreateTrigger {
    fn name(&self) -> &'static str {
        "CreateTrigger"
    }

    fn output_schema(&self, _input: Vec<Field>) -> Vec<Field> {
        Vec::new()
    }

    fn is_bound(&self) -> bool {
        self.database.is_some() && self.body.resolved()
    }
}

impl Node<LogicalCreateTrigger> {
    /// Name of the table the trigger is defined on.
    pub fn table_name(&self) -> Option<&str> {
        self.children.first().and_then(|table| table_name(table))
    }

    /// Statement text in the canonical form:
    /// `CREATE TRIGGER name timing event ON table FOR EACH ROW [order ]body`.
    pub fn create_trigger_string(&self) -> String {
        let trigger = &self.node;
        let order = match &trigger.order {
            Some(order) => format!("{order} "),
            None => String::new(),
        };
        format!(
            "CREATE TRIGGER {} {} {} ON {} FOR EACH ROW {order}{}",
            trigger.name,
            trigger.timing,
            trigger.event,
            self.table_name().unwrap_or("?"),
            trigger.body_text,
        )
    }
}

/// Get the name of the table a trigger's table child refers to.
pub(crate) fn table_name(plan: &LogicalOperator) -> Option<&str> {
    match plan {
        LogicalOperator::UnresolvedTable(n) => Some(&n.node.name),
        LogicalOperator::Scan(n) => Some(&n.node.table),
        LogicalOperator::TableAlias(n) => Some(&n.node.name),
        _ => None,
    }
}
