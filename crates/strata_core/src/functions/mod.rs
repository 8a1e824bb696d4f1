pub mod builtin;
pub mod table;

use std::fmt::Debug;

use strata_error::{DbError, ErrorKind, Result};

use crate::arrays::datatype::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Scalar,
    Aggregate,
    /// Only valid with an OVER clause.
    Window,
}

/// Accepted number of arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub min_args: usize,
    /// Unbounded if `None`.
    pub max_args: Option<usize>,
}

impl Signature {
    pub const fn exact(n: usize) -> Self {
        Signature {
            min_args: n,
            max_args: Some(n),
        }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Signature {
            min_args: min,
            max_args: Some(max),
        }
    }

    pub fn validate(&self, function: &str, num_args: usize) -> Result<()> {
        let too_many = self.max_args.is_some_and(|max| num_args > max);
        if num_args < self.min_args || too_many {
            let expected = match self.max_args {
                Some(max) if max == self.min_args => max.to_string(),
                Some(max) => format!("{} to {max}", self.min_args),
                None => format!("at least {}", self.min_args),
            };
            return Err(DbError::with_kind(
                ErrorKind::InvalidArgument,
                format!("Function '{function}' expects {expected} arguments, got {num_args}"),
            ));
        }
        Ok(())
    }
}

/// Implementation of a scalar, aggregate, or window function available in
/// the catalog.
pub trait FunctionImpl: Debug + Sync + Send {
    fn name(&self) -> &'static str;

    fn kind(&self) -> FunctionKind;

    fn signature(&self) -> Signature;

    fn return_type(&self, inputs: &[DataType]) -> DataType;

    /// If the function returns the same output for the same inputs.
    ///
    /// Calls to non-deterministic functions prevent result caching.
    fn is_deterministic(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_bounds() {
        Signature::exact(1).validate("abs", 1).unwrap();
        Signature::range(1, 3).validate("lag", 3).unwrap();

        let err = Signature::exact(1).validate("abs", 2).unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
        assert_eq!("Function 'abs' expects 1 arguments, got 2", err.get_msg());

        let err = Signature::range(1, 3).validate("lag", 0).unwrap_err();
        assert_eq!("Function 'lag' expects 1 to 3 arguments, got 0", err.get_msg());
    }
}
