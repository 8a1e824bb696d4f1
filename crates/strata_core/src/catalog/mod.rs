pub mod memory;
pub mod privileged;

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_error::Result;

use crate::arrays::datatype::DataType;
use crate::functions::FunctionImpl;
use crate::functions::table::TableFunctionImpl;
use crate::logical::schema::Field;

/// Resolves names to functions and databases.
///
/// Implementations must allow concurrent lookups, independent statements may
/// be analyzed at the same time against the same catalog.
pub trait Catalog: Debug + Sync + Send {
    /// Errors with `UnknownFunction` if missing.
    fn function(&self, name: &str) -> Result<Arc<dyn FunctionImpl>>;

    /// Errors with `UnknownTableFunction` if missing.
    fn table_function(&self, name: &str) -> Result<Arc<dyn TableFunctionImpl>>;

    /// Errors with `UnknownDatabase` if missing.
    fn database(&self, name: &str) -> Result<Arc<dyn Database>>;
}

pub trait Database: Debug + Sync + Send {
    fn name(&self) -> &str;

    fn get_table(&self, name: &str) -> Result<Option<Arc<TableEntry>>>;

    fn table_names(&self) -> Vec<String>;

    /// Get the trigger capability of this database, if it has one.
    fn as_trigger_database(&self) -> Option<&dyn TriggerDatabase> {
        None
    }

    /// Get the database this one wraps if this is a privilege checking
    /// decorator.
    fn unwrap_privileged(&self) -> Option<Arc<dyn Database>> {
        None
    }
}

/// A database that can store trigger definitions.
pub trait TriggerDatabase: Debug + Sync + Send {
    fn create_trigger(&self, definition: TriggerDefinition) -> Result<()>;

    fn triggers(&self) -> Vec<TriggerDefinition>;
}

/// Unwrap any number of privilege decorators.
pub fn unwrap_privileged(database: Arc<dyn Database>) -> Arc<dyn Database> {
    let mut database = database;
    while let Some(inner) = database.unwrap_privileged() {
        database = inner;
    }
    database
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub name: String,
    pub create_statement: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: String,
    pub columns: Vec<ColumnEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
}

impl TableEntry {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = (S, DataType)>,
    ) -> Self {
        TableEntry {
            name: name.into(),
            columns: columns
                .into_iter()
                .map(|(name, datatype)| ColumnEntry {
                    name: name.into(),
                    datatype,
                    nullable: true,
                })
                .collect(),
        }
    }

    /// Output fields of a scan of this table, qualified by `qualifier`.
    pub fn fields(&self, qualifier: &str) -> Vec<Field> {
        self.columns
            .iter()
            .map(|c| Field::new(&c.name, c.datatype, c.nullable).with_table(qualifier))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_definition_json() {
        let def = TriggerDefinition {
            name: "audit".to_string(),
            create_statement: "CREATE TRIGGER audit AFTER INSERT ON t1 FOR EACH ROW SELECT 1"
                .to_string(),
            created_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        };

        let json = serde_json::to_string(&def).unwrap();
        assert!(json.contains("\"created_at\":\"1970-01-01T00:00:00Z\""));

        let got: TriggerDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(def, got);
    }
}
