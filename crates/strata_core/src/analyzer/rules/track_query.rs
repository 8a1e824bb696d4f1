use std::sync::Arc;

use strata_error::Result;

use super::AnalyzerRule;
use crate::analyzer::Analyzer;
use crate::analyzer::context::AnalysisContext;
use crate::analyzer::scope::Scope;
use crate::logical::logical_passthrough::{LogicalPassthrough, PassthroughKind};
use crate::logical::operator::{LogicalOperator, Node, PlanRef};
use crate::transform::Transformed;

/// Wraps a top-level statement so it shows up in the process list.
///
/// Never applied to nested queries or trigger bodies.
#[derive(Debug, Clone, Copy)]
pub struct TrackQuery;

impl AnalyzerRule for TrackQuery {
    fn name(&self) -> &'static str {
        "track_query"
    }

    fn apply(
        &self,
        ctx: &AnalysisContext,
        _analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<Transformed<PlanRef>> {
        if !ctx.is_root() || !scope.is_empty() {
            return Ok(Transformed::same(plan.clone()));
        }
        if let LogicalOperator::Passthrough(_) = plan.as_ref() {
            return Ok(Transformed::same(plan.clone()));
        }

        Ok(Transformed::changed(Arc::new(LogicalOperator::Passthrough(
            Node::new(
                LogicalPassthrough {
                    kind: PassthroughKind::QueryProcess,
                },
                vec![plan.clone()],
            ),
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::builder::{passthrough, single_row};
    use crate::testutil::{test_analyzer, test_context};

    #[test]
    fn wrap_top_level() {
        let analyzer = test_analyzer();
        let plan = single_row();
        let got = TrackQuery
            .apply(&test_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert_eq!(passthrough(PassthroughKind::QueryProcess, single_row()), got.data);

        let again = TrackQuery
            .apply(&test_context(), &analyzer, &got.data, &Scope::empty())
            .unwrap();
        assert!(!again.is_changed());
    }

    #[test]
    fn skip_nested() {
        let analyzer = test_analyzer();
        let plan = single_row();
        let got = TrackQuery
            .apply(&test_context().new_sub_context(), &analyzer, &plan, &Scope::empty())
            .unwrap();
        assert!(!got.is_changed());

        let scope = Scope::empty().push(&plan);
        let got = TrackQuery
            .apply(&test_context(), &analyzer, &plan, &scope)
            .unwrap();
        assert!(!got.is_changed());
    }
}
