use std::sync::Arc;

use crate::logical::logical_trigger::TriggerEvent;
use crate::logical::operator::PlanRef;
use crate::logical::schema::Field;

/// Columns visible from enclosing queries.
///
/// Each level is pushed when analysis recurses into a nested query, and
/// exposes the input columns of the node the nested query hangs off of. A
/// scope is only held for the duration of the analysis call that built it.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    level: Option<Arc<ScopeLevel>>,
}

#[derive(Debug)]
struct ScopeLevel {
    node: PlanRef,
    schema: Vec<Field>,
    parent: Option<Arc<ScopeLevel>>,
}

impl Scope {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Derive a scope with `node`'s input columns visible.
    pub fn push(&self, node: &PlanRef) -> Scope {
        self.push_with_schema(node, node.input_schema())
    }

    /// Derive a scope for a trigger body defined on `table`.
    ///
    /// The affected row is visible through `old` and `new` depending on the
    /// event. Update exposes `old` columns before `new` columns.
    pub fn push_trigger(&self, table: &PlanRef, event: TriggerEvent) -> Scope {
        let table_schema = table.output_schema();
        let mut schema = Vec::with_capacity(table_schema.len() * 2);
        if event.has_old_row() {
            schema.extend(table_schema.iter().map(|f| f.clone().with_table("old")));
        }
        if event.has_new_row() {
            schema.extend(table_schema.iter().map(|f| f.clone().with_table("new")));
        }
        self.push_with_schema(table, schema)
    }

    fn push_with_schema(&self, node: &PlanRef, schema: Vec<Field>) -> Scope {
        Scope {
            level: Some(Arc::new(ScopeLevel {
                node: node.clone(),
                schema,
                parent: self.level.clone(),
            })),
        }
    }

    /// All visible columns, outermost level first.
    pub fn schema(&self) -> Vec<Field> {
        let mut levels = Vec::with_capacity(self.depth());
        let mut curr = self.level.as_deref();
        while let Some(level) = curr {
            levels.push(level);
            curr = level.parent.as_deref();
        }

        levels
            .into_iter()
            .rev()
            .flat_map(|level| level.schema.iter().cloned())
            .collect()
    }

    /// Number of visible columns.
    pub fn len(&self) -> usize {
        let mut len = 0;
        let mut curr = self.level.as_deref();
        while let Some(level) = curr {
            len += level.schema.len();
            curr = level.parent.as_deref();
        }
        len
    }

    /// If there are no enclosing levels.
    pub fn is_empty(&self) -> bool {
        self.level.is_none()
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut curr = self.level.as_deref();
        while let Some(level) = curr {
            depth += 1;
            curr = level.parent.as_deref();
        }
        depth
    }

    /// Node of the innermost level.
    pub fn innermost_node(&self) -> Option<&PlanRef> {
        self.level.as_ref().map(|level| &level.node)
    }

    /// If any visible column is qualified by `table`.
    pub fn has_table(&self, table: &str) -> bool {
        let mut curr = self.level.as_deref();
        while let Some(level) = curr {
            if level.schema.iter().any(|f| f.has_table(table)) {
                return true;
            }
            curr = level.parent.as_deref();
        }
        false
    }
}
