use std::sync::Arc;

use strata_error::Result;

use super::{Database, TableEntry, TriggerDatabase};

/// Restricts the tables visible through a database.
///
/// Table functions are planned against the wrapped database.
#[derive(Debug)]
pub struct PrivilegedDatabase {
    inner: Arc<dyn Database>,
    /// Visible tables, everything if `None`.
    allowed_tables: Option<Vec<String>>,
}

impl PrivilegedDatabase {
    pub fn new(inner: Arc<dyn Database>) -> Self {
        PrivilegedDatabase {
            inner,
            allowed_tables: None,
        }
    }

    pub fn with_allowed_tables<S: Into<String>>(
        mut self,
        tables: impl IntoIterator<Item = S>,
    ) -> Self {
        self.allowed_tables = Some(
            tables
                .into_iter()
                .map(|t| t.into().to_lowercase())
                .collect(),
        );
        self
    }

    fn is_allowed(&self, table: &str) -> bool {
        match &self.allowed_tables {
            Some(allowed) => allowed.iter().any(|t| t.eq_ignore_ascii_case(table)),
            None => true,
        }
    }
}

impl Database for PrivilegedDatabase {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get_table(&self, name: &str) -> Result<Option<Arc<TableEntry>>> {
        if !self.is_allowed(name) {
            return Ok(None);
        }
        self.inner.get_table(name)
    }

    fn table_names(&self) -> Vec<String> {
        self.inner
            .table_names()
            .into_iter()
            .filter(|name| self.is_allowed(name))
            .collect()
    }

    fn as_trigger_database(&self) -> Option<&dyn TriggerDatabase> {
        self.inner.as_trigger_database()
    }

    fn unwrap_privileged(&self) -> Option<Arc<dyn Database>> {
        Some(self.inner.clone())
    }
}
