use super::operator::LogicalNode;
use super::schema::Field;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Aliased derived table, `(SELECT ...) AS name (columns...)`.
///
/// The child plan is analyzed on its own and cannot see columns from the
/// enclosing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalSubqueryAlias {
    pub name: String,
    /// Optional column aliases, must match the child's output width when
    /// provided.
    pub columns: Vec<String>,
}

impl Explainable for LogicalSubqueryAlias {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let ent = ExplainEntry::new("SubqueryAlias").with_value("name", &self.name);
        if self.columns.is_empty() {
            ent
        } else {
            ent.with_values("columns", &self.columns)
        }
    }
}

impl LogicalNode for LogicalSubqueryAlias {
    fn name(&self) -> &'static str {
        "SubqueryAlias"
    }

    fn output_schema(&self, input: Vec<Field>) -> Vec<Field> {
        input
            .into_iter()
            .enumerate()
            .map(|(idx, mut field)| {
                if let Some(name) = self.columns.get(idx) {
                    field.name = name.clone();
                }
                field.with_table(&self.name)
            })
            .collect()
    }
}

/// Alias for a table, `FROM t AS name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalTableAlias {
    pub name: String,
}

impl Explainable for LogicalTableAlias {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("TableAlias").with_value("name", &self.name)
    }
}

impl LogicalNode for LogicalTableAlias {
    fn name(&self) -> &'static str {
        "TableAlias"
    }

    fn output_schema(&self, input: Vec<Field>) -> Vec<Field> {
        input
            .into_iter()
            .map(|field| field.with_table(&self.name))
            .collect()
    }
}
