use std::fmt;
use std::sync::Arc;

use fmtutil::IntoDisplayableSlice;
use strata_error::{DbError, ErrorKind, Result};

use super::Expression;
use super::window::WindowSpec;
use crate::arrays::datatype::DataType;
use crate::functions::{FunctionImpl, FunctionKind};

/// Function call as parsed, before catalog lookup.
///
/// The OVER clause is held separately from the arguments since only some
/// kinds of functions accept one.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedFunctionExpr {
    pub name: String,
    pub args: Vec<Expression>,
    pub window: Option<WindowSpec>,
}

impl fmt::Display for UnresolvedFunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args.display_as_list())?;
        if let Some(window) = &self.window {
            write!(f, " {window}")?;
        }
        Ok(())
    }
}

/// Function call bound to an implementation.
#[derive(Debug, Clone)]
pub struct FunctionExpr {
    pub function: Arc<dyn FunctionImpl>,
    pub inputs: Vec<Expression>,
    pub window: Option<WindowSpec>,
}

impl FunctionExpr {
    /// Instantiate a function with the call's arguments, checking the
    /// argument count against the function's signature.
    pub fn try_new(function: Arc<dyn FunctionImpl>, inputs: Vec<Expression>) -> Result<Self> {
        function.signature().validate(function.name(), inputs.len())?;

        Ok(FunctionExpr {
            function,
            inputs,
            window: None,
        })
    }

    /// Attach a window spec to the function.
    ///
    /// Only aggregates and window functions take an OVER clause, scalar
    /// functions ignore it. Window functions require one.
    pub fn with_window(mut self, window: Option<WindowSpec>) -> Result<Self> {
        match (self.function.kind(), window) {
            (FunctionKind::Scalar, _) => Ok(self),
            (FunctionKind::Window, None) => Err(DbError::with_kind(
                ErrorKind::InvalidArgument,
                format!(
                    "Window function '{}' requires an OVER clause",
                    self.function.name()
                ),
            )),
            (_, window) => {
                if let Some(frame) = window.as_ref().and_then(|w| w.frame.as_ref()) {
                    frame.validate()?;
                }
                self.window = window;
                Ok(self)
            }
        }
    }

    pub fn return_type(&self) -> DataType {
        let types: Vec<_> = self.inputs.iter().map(|e| e.datatype()).collect();
        self.function.return_type(&types)
    }
}

impl PartialEq for FunctionExpr {
    fn eq(&self, other: &Self) -> bool {
        self.function.name() == other.function.name()
            && self.function.kind() == other.function.kind()
            && self.inputs == other.inputs
            && self.window == other.window
    }
}

impl fmt::Display for FunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function.name(), self.inputs.display_as_list())?;
        if let Some(window) = &self.window {
            write!(f, " {window}")?;
        }
        Ok(())
    }
}
