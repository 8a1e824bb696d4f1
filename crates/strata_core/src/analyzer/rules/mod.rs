pub mod cache;
pub mod expand_stars;
pub mod join_scope;
pub mod resolve_columns;
pub mod resolve_functions;
pub mod resolve_table_functions;
pub mod resolve_tables;
pub mod subqueries;
pub mod track_query;
pub mod triggers;

use std::fmt::Debug;

use strata_error::Result;

use super::Analyzer;
use super::context::AnalysisContext;
use super::scope::Scope;
use crate::logical::operator::PlanRef;
use crate::transform::Transformed;

/// A single rewrite pass over a plan.
///
/// Rules may be applied many times to the same plan, and must report
/// `Same` once they have nothing left to do. Rules must also be safe to
/// invoke recursively through the analyzer.
pub trait AnalyzerRule: Debug + Sync + Send {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
    ) -> Result<Transformed<PlanRef>>;
}
