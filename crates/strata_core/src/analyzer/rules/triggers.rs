use std::sync::Arc;

use strata_error::{DbError, ErrorKind, Result};
use tracing::debug;

use super::AnalyzerRule;
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::analyzer::{Analyzer, strip_passthrough_nodes};
use crate::catalog::{Database, unwrap_privileged};
use crate::logical::logical_trigger::{LogicalCreateTrigger, triggers_not_supported};
use crate::logical::operator::{LogicalNode, LogicalOperator, Node, PlanRef};
use crate::transform::Transformed;
use crate::transform::plan::transform_up;

/// Binds `CREATE TRIGGER` to the current database and analyzes the body.
///
/// The body sees the affected row through `old` and `new`, and is analyzed
/// once the table the trigger is defined on has been resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolveCreateTrigger;

impl AnalyzerRule for ResolveCreateTrigger {
    fn name(&self) -> &'static str {
        "resolve_create_trigger"
    }

    fn apply(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        transform_up(plan, &mut |node| {
            let create = match node.as_ref() {
                LogicalOperator::CreateTrigger(create) => create,
                _ => return Ok(Transformed::same(node.clone())),
            };
            if create.node.is_bound() {
                return Ok(Transformed::same(node.clone()));
            }

            let database = match &create.node.database {
                Some(database) => database.clone(),
                None => unwrap_privileged(analyzer.catalog().database(ctx.current_database())?),
            };
            check_trigger_order(&create.node, database.as_ref())?;

            let mut trigger = create.node.with_database(database);

            let table = create.get_one_child_exact()?;
            if table.resolved() && !trigger.body.resolved() {
                let body_scope = scope.push_trigger(table, trigger.event);
                let body = analyzer
                    .analyze_with_scope(&ctx.new_trigger_context(), &trigger.body, &body_scope)?
                    .into_result()?;
                trigger = trigger.with_body(strip_passthrough_nodes(&body.data));
            }

            debug!(trigger = %trigger.name, "resolved create trigger");
            Ok(Transformed::changed(Arc::new(LogicalOperator::CreateTrigger(
                Node::new(trigger, create.children.clone()),
            ))))
        })
    }
}

/// Ensure the database supports triggers, and that a trigger this one is
/// ordered relative to exists.
fn check_trigger_order(trigger: &LogicalCreateTrigger, database: &dyn Database) -> Result<()> {
    let triggers = match database.as_trigger_database() {
        Some(triggers) => triggers,
        None => return Err(triggers_not_supported(database)),
    };

    if let Some(order) = &trigger.order {
        let exists = triggers
            .triggers()
            .iter()
            .any(|def| def.name.eq_ignore_ascii_case(&order.other_trigger));
        if !exists {
            return Err(DbError::with_kind(
                ErrorKind::UnknownTrigger,
                format!(
                    "Trigger '{}' referenced in {} does not exist",
                    order.other_trigger, order.kind
                ),
            )
            .with_field("trigger", &trigger.name));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::analyzer::rules::resolve_tables::ResolveTables;
    use crate::arrays::datatype::DataType;
    use crate::catalog::{Catalog, TriggerDefinition};
    use crate::expr::column_expr::ColumnExpr;
    use crate::expr::{Expression, qualified_col};
    use crate::logical::builder::{create_trigger, project, scan, single_row, table};
    use crate::logical::logical_trigger::{
        TriggerEvent,
        TriggerOrder,
        TriggerOrderKind,
        TriggerTiming,
    };
    use crate::testutil::{test_analyzer, test_analyzer_with_catalog, test_catalog, test_context};

    fn t1() -> PlanRef {
        scan("mydb", "t1", &[("a", DataType::Int64), ("b", DataType::Utf8)])
    }

    fn trigger_on(
        table: PlanRef,
        event: TriggerEvent,
        body: PlanRef,
        order: Option<TriggerOrder>,
    ) -> PlanRef {
        create_trigger(
            "trig",
            TriggerTiming::Before,
            event,
            order,
            table,
            body,
            "SELECT new.a",
        )
    }

    fn unwrap_trigger(plan: &PlanRef) -> &LogicalCreateTrigger {
        match plan.as_ref() {
            LogicalOperator::CreateTrigger(create) => &create.node,
            other => panic!("unexpected node: {other}"),
        }
    }

    #[test]
    fn binds_database_and_body() {
        let analyzer = test_analyzer();
        let body = project(single_row(), vec![qualified_col("new", "a")]);
        let plan = trigger_on(t1(), TriggerEvent::Insert, body, None);

        let got = ResolveCreateTrigger
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert!(got.is_changed());
        assert!(got.data.resolved());

        let trigger = unwrap_trigger(&got.data);
        assert_eq!(Some("mydb"), trigger.database.as_ref().map(|db| db.name()));
        assert_eq!(
            vec![&Expression::Column(ColumnExpr {
                index: 0,
                table: Some("new".to_string()),
                name: "a".to_string(),
                datatype: DataType::Int64,
            })],
            trigger.body.expressions()
        );

        let again = ResolveCreateTrigger
            .apply(&test_context(), &analyzer, &got.data, &Scope::empty())
            .unwrap();
        assert!(!again.is_changed());
    }

    #[test]
    fn update_sees_old_before_new() {
        let analyzer = test_analyzer();
        let body = project(single_row(), vec![qualified_col("new", "b")]);
        let plan = trigger_on(t1(), TriggerEvent::Update, body, None);

        let got = ResolveCreateTrigger
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        let trigger = unwrap_trigger(&got.data);
        match trigger.body.expressions()[0] {
            Expression::Column(col) => assert_eq!(3, col.index),
            other => panic!("unexpected expression: {other}"),
        }
    }

    #[test]
    fn insert_has_no_old_row() {
        let analyzer = test_analyzer();
        let body = project(single_row(), vec![qualified_col("old", "a")]);
        let plan = trigger_on(t1(), TriggerEvent::Insert, body, None);

        let err = ResolveCreateTrigger
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap_err();
        assert!(err.is_deferrable());
    }

    #[test]
    fn body_waits_for_table() {
        let analyzer = test_analyzer();
        let body = project(single_row(), vec![qualified_col("new", "a")]);
        let plan = trigger_on(table("t1"), TriggerEvent::Insert, body, None);

        let got = ResolveCreateTrigger
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        // Database bound, body untouched.
        let trigger = unwrap_trigger(&got.data);
        assert!(trigger.database.is_some());
        assert!(!trigger.body.resolved());

        let got = ResolveTables
            .apply(&test_context(), &analyzer, &got.data, &Scope::empty())
            .unwrap();
        let got = ResolveCreateTrigger
            .apply(&test_context(), &analyzer, &got.data, &Scope::empty())
            .unwrap();
        assert!(got.data.resolved());
    }

    #[test]
    fn database_without_triggers() {
        let analyzer = test_analyzer();
        let body = project(single_row(), vec![qualified_col("new", "a")]);
        let plan = trigger_on(t1(), TriggerEvent::Insert, body, None);

        let err = ResolveCreateTrigger
            .apply(&AnalysisContext::new("nodb"), &analyzer, &plan, &Scope::empty())
            .unwrap_err();
        assert_eq!(ErrorKind::TriggersNotSupported, err.kind());
    }

    #[test]
    fn order_requires_existing_trigger() {
        let catalog = Arc::new(test_catalog());
        let order = TriggerOrder {
            kind: TriggerOrderKind::Follows,
            other_trigger: "First".to_string(),
        };
        let body = project(single_row(), vec![qualified_col("new", "a")]);
        let plan = trigger_on(t1(), TriggerEvent::Insert, body, Some(order));

        let analyzer = test_analyzer_with_catalog(catalog.clone());
        let err = ResolveCreateTrigger
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap_err();
        assert_eq!(ErrorKind::UnknownTrigger, err.kind());
        assert_eq!(Some("trig"), err.get_field("trigger"));

        catalog
            .database("mydb")
            .unwrap()
            .as_trigger_database()
            .unwrap()
            .create_trigger(TriggerDefinition {
                name: "first".to_string(),
                create_statement: "CREATE TRIGGER first ...".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();

        let got = ResolveCreateTrigger
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert!(got.data.resolved());
    }
}
