//! Rule driven analysis of logical plans.
//!
//! The analyzer takes the unresolved plan produced by the parser and runs
//! ordered batches of rules over it until everything is bound. Subqueries and
//! trigger bodies are analyzed by recursively running the same batches with a
//! derived scope, then splicing the result back into the enclosing plan.

pub mod batch;
pub mod cacheability;
pub mod context;
pub mod rules;
pub mod scope;
pub mod validate;


use std::sync::Arc;

use batch::{Batch, BatchMode};
use context::AnalysisContext;
use rules::AnalyzerRule;
use scope::Scope;
use strata_error::{DbError, ErrorKind, Result};
use tracing::trace;

use crate::catalog::Catalog;
use crate::config::AnalyzerConfig;
use crate::logical::operator::{LogicalOperator, PlanRef};
use crate::transform::Transformed;

pub const DEFAULT_RULES_BATCH: &str = "default-rules";
pub const ONCE_AFTER_BATCH: &str = "once-after";
pub const AFTER_ALL_BATCH: &str = "after-all";

/// Result of analyzing a plan with some scope.
#[derive(Debug)]
pub enum AnalyzeOutcome {
    /// Plan is fully resolved.
    Resolved(Transformed<PlanRef>),
    /// Plan could not be fully resolved yet.
    ///
    /// Analysis of an enclosing plan may make further progress possible,
    /// `partial` holds the work done so far.
    Deferred {
        partial: Transformed<PlanRef>,
        error: DbError,
    },
}

impl AnalyzeOutcome {
    /// Convert to a result, erroring if analysis was deferred.
    pub fn into_result(self) -> Result<Transformed<PlanRef>> {
        match self {
            Self::Resolved(plan) => Ok(plan),
            Self::Deferred { error, .. } => Err(error),
        }
    }

    /// The analyzed plan, resolved or not.
    pub fn into_plan(self) -> Transformed<PlanRef> {
        match self {
            Self::Resolved(plan) => plan,
            Self::Deferred { partial, .. } => partial,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Which batches to run.
#[derive(Debug, Clone, Copy)]
enum BatchSelector<'a> {
    All,
    /// Up to and including the named batch.
    Through(&'a str),
    /// The named batch and everything after it.
    StartingAt(&'a str),
}

#[derive(Debug)]
pub struct Analyzer {
    catalog: Arc<dyn Catalog>,
    config: AnalyzerConfig,
    batches: Vec<Batch>,
}

impl Analyzer {
    pub fn new(catalog: Arc<dyn Catalog>, config: AnalyzerConfig) -> Self {
        Self::with_batches(catalog, config, default_batches())
    }

    /// Create an analyzer running custom batches.
    ///
    /// Rules that recursively analyze subqueries expect a batch named
    /// `default-rules` to exist.
    pub fn with_batches(
        catalog: Arc<dyn Catalog>,
        config: AnalyzerConfig,
        batches: Vec<Batch>,
    ) -> Self {
        Analyzer {
            catalog,
            config,
            batches,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn batch_names(&self) -> Vec<&'static str> {
        self.batches.iter().map(|b| b.name).collect()
    }

    /// Analyze a top-level statement.
    ///
    /// Errors if the plan could not be fully resolved.
    pub fn analyze(&self, ctx: &AnalysisContext, plan: &PlanRef) -> Result<PlanRef> {
        trace!(plan = %plan.name(), "analyzing statement");
        match self.analyze_with_scope(ctx, plan, &Scope::empty())? {
            AnalyzeOutcome::Resolved(plan) => Ok(plan.into_data()),
            AnalyzeOutcome::Deferred { error, .. } => Err(error),
        }
    }

    /// Run all batches on a plan with some outer scope.
    pub fn analyze_with_scope(
        &self,
        ctx: &AnalysisContext,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<AnalyzeOutcome> {
        self.analyze_with_selector(ctx, plan, scope, BatchSelector::All)
    }

    /// Run batches up to and including the batch named `batch`.
    pub fn analyze_through_batch(
        &self,
        ctx: &AnalysisContext,
        plan: &PlanRef,
        scope: &Scope,
        batch: &str,
    ) -> Result<AnalyzeOutcome> {
        self.analyze_with_selector(ctx, plan, scope, BatchSelector::Through(batch))
    }

    /// Run the batch named `batch` and every batch after it.
    pub fn analyze_starting_at_batch(
        &self,
        ctx: &AnalysisContext,
        plan: &PlanRef,
        scope: &Scope,
        batch: &str,
    ) -> Result<AnalyzeOutcome> {
        self.analyze_with_selector(ctx, plan, scope, BatchSelector::StartingAt(batch))
    }

    fn select_batches(&self, selector: BatchSelector) -> Result<&[Batch]> {
        let position = |name: &str| {
            self.batches
                .iter()
                .position(|b| b.name == name)
                .ok_or_else(|| {
                    DbError::with_kind(ErrorKind::Internal, format!("Missing batch '{name}'"))
                })
        };

        match selector {
            BatchSelector::All => Ok(&self.batches),
            BatchSelector::Through(name) => Ok(&self.batches[..=position(name)?]),
            BatchSelector::StartingAt(name) => Ok(&self.batches[position(name)?..]),
        }
    }

    fn analyze_with_selector(
        &self,
        ctx: &AnalysisContext,
        plan: &PlanRef,
        scope: &Scope,
        selector: BatchSelector,
    ) -> Result<AnalyzeOutcome> {
        let batches = self.select_batches(selector)?;

        let mut deferred = None;
        let mut current = Transformed::same(plan.clone());
        for batch in batches {
            current = current.and_then(|plan| batch.eval(ctx, self, &plan, scope, &mut deferred))?;
        }

        if current.data.resolved() {
            return Ok(AnalyzeOutcome::Resolved(current));
        }

        let error = match deferred {
            Some(error) => error,
            None => match validate::validate_resolved(&current.data) {
                Err(error) => error,
                Ok(()) => DbError::with_kind(ErrorKind::Unresolved, "Plan is not resolved"),
            },
        };

        Ok(AnalyzeOutcome::Deferred {
            partial: current,
            error,
        })
    }
}

/// The batches run for every statement.
pub fn default_batches() -> Vec<Batch> {
    use rules::cache::{CacheSubqueryAliasesInJoins, CacheSubqueryResults};
    use rules::expand_stars::ExpandStars;
    use rules::join_scope::SetJoinScopeLen;
    use rules::resolve_columns::ResolveColumns;
    use rules::resolve_functions::ResolveFunctions;
    use rules::resolve_table_functions::ResolveTableFunctions;
    use rules::resolve_tables::ResolveTables;
    use rules::subqueries::{
        FinalizeSubqueries,
        FlattenTableAliases,
        ResolveSubqueries,
        ResolveSubqueryExprs,
    };
    use rules::track_query::TrackQuery;
    use rules::triggers::ResolveCreateTrigger;

    let default_rules: Vec<Box<dyn AnalyzerRule>> = vec![
        Box::new(ResolveTables),
        Box::new(ResolveTableFunctions),
        Box::new(FlattenTableAliases),
        Box::new(ResolveSubqueries),
        Box::new(ExpandStars),
        Box::new(ResolveColumns),
        Box::new(ResolveFunctions),
        Box::new(ResolveCreateTrigger),
        Box::new(ResolveSubqueryExprs),
    ];

    let once_after: Vec<Box<dyn AnalyzerRule>> = vec![
        Box::new(FinalizeSubqueries),
        Box::new(CacheSubqueryAliasesInJoins),
        Box::new(SetJoinScopeLen),
        Box::new(CacheSubqueryResults),
    ];

    let after_all: Vec<Box<dyn AnalyzerRule>> = vec![Box::new(TrackQuery)];

    vec![
        Batch::new(DEFAULT_RULES_BATCH, BatchMode::FixedPoint, default_rules),
        Batch::new(ONCE_AFTER_BATCH, BatchMode::Once, once_after),
        Batch::new(AFTER_ALL_BATCH, BatchMode::Once, after_all),
    ]
}

/// Remove passthrough nodes wrapping the root of a plan.
///
/// Passthrough nodes only apply to top-level statements, and are removed
/// before splicing a recursively analyzed plan into its parent.
pub fn strip_passthrough_nodes(plan: &PlanRef) -> PlanRef {
    let mut plan = plan;
    while let LogicalOperator::Passthrough(node) = plan.as_ref() {
        match node.children.first() {
            Some(child) => plan = child,
            None => break,
        }
    }
    plan.clone()
}
