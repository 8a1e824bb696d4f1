use std::sync::Arc;

use parking_lot::Mutex;
use scc::HashIndex;
use scc::ebr::Guard;
use strata_error::{DbError, ErrorKind, Result};

use super::{Catalog, Database, TableEntry, TriggerDatabase, TriggerDefinition};
use crate::functions::FunctionImpl;
use crate::functions::builtin::{builtin_functions, builtin_table_functions};
use crate::functions::table::TableFunctionImpl;

/// Catalog holding everything in memory.
///
/// Names are case insensitive.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    functions: HashIndex<String, Arc<dyn FunctionImpl>>,
    table_functions: HashIndex<String, Arc<dyn TableFunctionImpl>>,
    databases: HashIndex<String, Arc<dyn Database>>,
}

impl MemoryCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog with all builtin functions registered.
    pub fn with_builtins() -> Result<Self> {
        let catalog = Self::empty();
        for function in builtin_functions() {
            catalog.register_function(function)?;
        }
        for function in builtin_table_functions() {
            catalog.register_table_function(function)?;
        }
        Ok(catalog)
    }

    pub fn register_function(&self, function: Arc<dyn FunctionImpl>) -> Result<()> {
        insert_unique(&self.functions, "function", function.name(), function)
    }

    pub fn register_table_function(&self, function: Arc<dyn TableFunctionImpl>) -> Result<()> {
        insert_unique(&self.table_functions, "table function", function.name(), function)
    }

    pub fn register_database(&self, database: Arc<dyn Database>) -> Result<()> {
        let name = database.name().to_string();
        insert_unique(&self.databases, "database", &name, database)
    }

    pub fn database_names(&self) -> Vec<String> {
        let guard = Guard::new();
        self.databases.iter(&guard).map(|(name, _)| name.clone()).collect()
    }
}

fn insert_unique<V: Clone + 'static>(
    index: &HashIndex<String, V>,
    what: &str,
    name: &str,
    value: V,
) -> Result<()> {
    match index.entry(name.to_lowercase()) {
        scc::hash_index::Entry::Occupied(ent) => Err(DbError::new(format!(
            "Duplicate {what} name '{}'",
            ent.key()
        ))),
        scc::hash_index::Entry::Vacant(ent) => {
            ent.insert_entry(value);
            Ok(())
        }
    }
}

fn lookup<V: Clone + 'static>(index: &HashIndex<String, V>, name: &str) -> Option<V> {
    index.peek_with(&name.to_lowercase(), |_, v| v.clone())
}

impl Catalog for MemoryCatalog {
    fn function(&self, name: &str) -> Result<Arc<dyn FunctionImpl>> {
        lookup(&self.functions, name).ok_or_else(|| {
            DbError::with_kind(
                ErrorKind::UnknownFunction,
                format!("Missing function '{name}'"),
            )
        })
    }

    fn table_function(&self, name: &str) -> Result<Arc<dyn TableFunctionImpl>> {
        lookup(&self.table_functions, name).ok_or_else(|| {
            DbError::with_kind(
                ErrorKind::UnknownTableFunction,
                format!("Missing table function '{name}'"),
            )
        })
    }

    fn database(&self, name: &str) -> Result<Arc<dyn Database>> {
        lookup(&self.databases, name).ok_or_else(|| {
            DbError::with_kind(
                ErrorKind::UnknownDatabase,
                format!("Missing database '{name}'"),
            )
        })
    }
}

#[derive(Debug)]
pub struct MemoryDatabase {
    name: String,
    tables: HashIndex<String, Arc<TableEntry>>,
    /// Trigger store, `None` if this database doesn't support triggers.
    triggers: Option<MemoryTriggerStore>,
}

impl MemoryDatabase {
    /// New database with trigger support.
    pub fn new(name: impl Into<String>) -> Self {
        MemoryDatabase {
            name: name.into(),
            tables: HashIndex::new(),
            triggers: Some(MemoryTriggerStore::default()),
        }
    }

    pub fn without_triggers(name: impl Into<String>) -> Self {
        MemoryDatabase {
            triggers: None,
            ..Self::new(name)
        }
    }

    pub fn create_table(&self, table: TableEntry) -> Result<()> {
        let name = table.name.clone();
        insert_unique(&self.tables, "table", &name, Arc::new(table))
    }
}

impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_table(&self, name: &str) -> Result<Option<Arc<TableEntry>>> {
        Ok(lookup(&self.tables, name))
    }

    fn table_names(&self) -> Vec<String> {
        let guard = Guard::new();
        let mut names: Vec<_> = self
            .tables
            .iter(&guard)
            .map(|(_, table)| table.name.clone())
            .collect();
        names.sort();
        names
    }

    fn as_trigger_database(&self) -> Option<&dyn TriggerDatabase> {
        self.triggers.as_ref().map(|t| t as &dyn TriggerDatabase)
    }
}

#[derive(Debug, Default)]
struct MemoryTriggerStore {
    triggers: Mutex<Vec<TriggerDefinition>>,
}

impl TriggerDatabase for MemoryTriggerStore {
    fn create_trigger(&self, definition: TriggerDefinition) -> Result<()> {
        let mut triggers = self.triggers.lock();
        if triggers
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(&definition.name))
        {
            return Err(DbError::new(format!(
                "Duplicate trigger name '{}'",
                definition.name
            )));
        }
        triggers.push(definition);
        Ok(())
    }

    fn triggers(&self) -> Vec<TriggerDefinition> {
        self.triggers.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::arrays::datatype::DataType;

    #[test]
    fn lookup_case_insensitive() {
        let catalog = MemoryCatalog::with_builtins().unwrap();
        assert_eq!("abs", catalog.function("ABS").unwrap().name());
        assert_eq!(
            "generate_series",
            catalog.table_function("Generate_Series").unwrap().name()
        );
    }

    #[test]
    fn missing_entries() {
        let catalog = MemoryCatalog::with_builtins().unwrap();
        assert_eq!(
            ErrorKind::UnknownFunction,
            catalog.function("nope").unwrap_err().kind()
        );
        assert_eq!(
            ErrorKind::UnknownTableFunction,
            catalog.table_function("nope").unwrap_err().kind()
        );
        assert_eq!(
            ErrorKind::UnknownDatabase,
            catalog.database("nope").unwrap_err().kind()
        );
    }

    #[test]
    fn duplicate_names() {
        let catalog = MemoryCatalog::empty();
        catalog
            .register_database(Arc::new(MemoryDatabase::new("mydb")))
            .unwrap();
        catalog
            .register_database(Arc::new(MemoryDatabase::new("MYDB")))
            .unwrap_err();
        assert_eq!(vec!["mydb".to_string()], catalog.database_names());

        let db = MemoryDatabase::new("mydb");
        db.create_table(TableEntry::new("t1", [("a", DataType::Int64)]))
            .unwrap();
        db.create_table(TableEntry::new("T1", [("a", DataType::Int64)]))
            .unwrap_err();
        assert_eq!(vec!["t1".to_string()], db.table_names());
    }

    #[test]
    fn trigger_store() {
        let db = MemoryDatabase::new("mydb");
        let triggers = db.as_trigger_database().unwrap();
        let def = TriggerDefinition {
            name: "trig".to_string(),
            create_statement: "CREATE TRIGGER trig".to_string(),
            created_at: Utc::now(),
        };
        triggers.create_trigger(def.clone()).unwrap();
        triggers.create_trigger(def.clone()).unwrap_err();
        assert_eq!(vec![def], triggers.triggers());

        let db = MemoryDatabase::without_triggers("nodb");
        assert!(db.as_trigger_database().is_none());
    }
}
