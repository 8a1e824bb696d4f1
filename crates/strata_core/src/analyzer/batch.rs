use std::fmt;

use strata_error::{DbError, ErrorKind, Result};
use tracing::{debug, trace, trace_span};

use super::context::AnalysisContext;
use super::rules::AnalyzerRule;
use super::scope::Scope;
use super::Analyzer;
use crate::logical::operator::PlanRef;
use crate::transform::{Transformed, TreeIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Run each rule exactly once.
    Once,
    /// Repeat until a full pass changes nothing, bounded by the configured
    /// max iterations.
    FixedPoint,
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => write!(f, "once"),
            Self::FixedPoint => write!(f, "fixed point"),
        }
    }
}

/// Named, ordered group of rules.
#[derive(Debug)]
pub struct Batch {
    pub name: &'static str,
    pub mode: BatchMode,
    pub rules: Vec<Box<dyn AnalyzerRule>>,
}

impl Batch {
    pub fn new(name: &'static str, mode: BatchMode, rules: Vec<Box<dyn AnalyzerRule>>) -> Self {
        Batch { name, mode, rules }
    }

    /// Run this batch on a plan.
    ///
    /// Deferrable errors from rules don't abort the batch. The rule is
    /// treated as having made no change, and the last such error seen during
    /// the final pass is written to `deferred`.
    pub fn eval(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
        deferred: &mut Option<DbError>,
    ) -> Result<Transformed<PlanRef>> {
        let max_iterations = match self.mode {
            BatchMode::Once => 1,
            BatchMode::FixedPoint => analyzer.config().max_iterations,
        };

        let mut current = plan.clone();
        let mut identity = TreeIdentity::Same;

        for iteration in 0..max_iterations {
            let mut pass_deferred = None;
            let pass = self.eval_once(ctx, analyzer, &current, scope, &mut pass_deferred)?;
            current = pass.data;

            if !pass.identity.is_changed() || self.mode == BatchMode::Once {
                if pass_deferred.is_some() {
                    *deferred = pass_deferred;
                }
                return Ok(Transformed::new(current, identity.merge(pass.identity)));
            }

            identity = TreeIdentity::Changed;
            trace!(batch = self.name, iteration, "batch pass changed plan");
        }

        Err(DbError::with_kind(
            ErrorKind::NonConvergence,
            format!(
                "Batch '{}' did not converge after {max_iterations} iterations",
                self.name
            ),
        )
        .with_field("batch", self.name)
        .with_field("iterations", max_iterations))
    }

    fn eval_once(
        &self,
        ctx: &AnalysisContext,
        analyzer: &Analyzer,
        plan: &PlanRef,
        scope: &Scope,
        deferred: &mut Option<DbError>,
    ) -> Result<Transformed<PlanRef>> {
        let mut current = plan.clone();
        let mut identity = TreeIdentity::Same;

        for rule in &self.rules {
            ctx.check_cancelled()?;

            let span = trace_span!("analyzer_rule", rule = rule.name(), batch = self.name);
            let result = span.in_scope(|| rule.apply(ctx, analyzer, &current, scope));

            match result {
                Ok(transformed) => {
                    if transformed.is_changed() {
                        debug!(
                            rule = rule.name(),
                            batch = self.name,
                            depth = ctx.depth(),
                            "rule changed plan"
                        );
                        identity = TreeIdentity::Changed;
                    }
                    current = transformed.data;
                }
                Err(e) if e.is_deferrable() => {
                    trace!(rule = rule.name(), batch = self.name, %e, "deferring error");
                    *deferred = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Transformed::new(current, identity))
    }
}
