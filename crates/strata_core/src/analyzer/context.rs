use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use strata_error::{DbError, ErrorKind, Result};

/// Per-statement state threaded through analysis.
///
/// Sub-contexts are created for every recursive analysis (subqueries, trigger
/// bodies). Cancelling a context cancels all contexts derived from it.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    current_database: String,
    /// Cancel flags from the root context down to this one.
    cancel_flags: Vec<Arc<AtomicBool>>,
    deadline: Option<Instant>,
    depth: usize,
    in_trigger: bool,
}

/// Handle for cancelling a context from elsewhere.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

impl AnalysisContext {
    pub fn new(current_database: impl Into<String>) -> Self {
        AnalysisContext {
            current_database: current_database.into(),
            cancel_flags: vec![Arc::new(AtomicBool::new(false))],
            deadline: None,
            depth: 0,
            in_trigger: false,
        }
    }

    /// Fail analysis with `Cancelled` once `timeout` has elapsed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn current_database(&self) -> &str {
        &self.current_database
    }

    /// Context for analyzing a nested query.
    pub fn new_sub_context(&self) -> Self {
        let mut cancel_flags = self.cancel_flags.clone();
        cancel_flags.push(Arc::new(AtomicBool::new(false)));

        AnalysisContext {
            current_database: self.current_database.clone(),
            cancel_flags,
            deadline: self.deadline,
            depth: self.depth + 1,
            in_trigger: self.in_trigger,
        }
    }

    /// Context for analyzing a trigger body.
    pub fn new_trigger_context(&self) -> Self {
        AnalysisContext {
            in_trigger: true,
            ..self.new_sub_context()
        }
    }

    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        // Always at least one flag.
        let flag = match self.cancel_flags.last() {
            Some(flag) => flag.clone(),
            None => Arc::new(AtomicBool::new(false)),
        };
        CancelHandle { flag }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flags.iter().any(|f| f.load(Ordering::Acquire))
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(DbError::with_kind(
                ErrorKind::Cancelled,
                "Analysis cancelled",
            ));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(DbError::with_kind(
                    ErrorKind::Cancelled,
                    "Analysis timed out",
                ));
            }
        }
        Ok(())
    }

    /// If this is the context of a top-level statement.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn in_trigger(&self) -> bool {
        self.in_trigger
    }
}
