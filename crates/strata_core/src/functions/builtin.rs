use std::sync::Arc;

use super::table::{GenerateSeries, ListTables, TableFunctionImpl};
use super::{FunctionImpl, FunctionKind, Signature};
use crate::arrays::datatype::DataType;

/// All builtin functions.
pub fn builtin_functions() -> Vec<Arc<dyn FunctionImpl>> {
    vec![
        Arc::new(Abs),
        Arc::new(Upper),
        Arc::new(Rand),
        Arc::new(Count),
        Arc::new(Sum),
        Arc::new(RowNumber),
        Arc::new(Lag),
    ]
}

pub fn builtin_table_functions() -> Vec<Arc<dyn TableFunctionImpl>> {
    vec![Arc::new(GenerateSeries), Arc::new(ListTables)]
}

fn first_or_null(inputs: &[DataType]) -> DataType {
    inputs.first().copied().unwrap_or(DataType::Null)
}

#[derive(Debug, Clone, Copy)]
pub struct Abs;

impl FunctionImpl for Abs {
    fn name(&self) -> &'static str {
        "abs"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Scalar
    }

    fn signature(&self) -> Signature {
        Signature::exact(1)
    }

    fn return_type(&self, inputs: &[DataType]) -> DataType {
        first_or_null(inputs)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Upper;

impl FunctionImpl for Upper {
    fn name(&self) -> &'static str {
        "upper"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Scalar
    }

    fn signature(&self) -> Signature {
        Signature::exact(1)
    }

    fn return_type(&self, _inputs: &[DataType]) -> DataType {
        DataType::Utf8
    }
}

/// Random float in [0, 1).
#[derive(Debug, Clone, Copy)]
pub struct Rand;

impl FunctionImpl for Rand {
    fn name(&self) -> &'static str {
        "rand"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Scalar
    }

    fn signature(&self) -> Signature {
        Signature::range(0, 1)
    }

    fn return_type(&self, _inputs: &[DataType]) -> DataType {
        DataType::Float64
    }

    fn is_deterministic(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Count;

impl FunctionImpl for Count {
    fn name(&self) -> &'static str {
        "count"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Aggregate
    }

    fn signature(&self) -> Signature {
        Signature::range(0, 1)
    }

    fn return_type(&self, _inputs: &[DataType]) -> DataType {
        DataType::Int64
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sum;

impl FunctionImpl for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Aggregate
    }

    fn signature(&self) -> Signature {
        Signature::exact(1)
    }

    fn return_type(&self, inputs: &[DataType]) -> DataType {
        match first_or_null(inputs) {
            DataType::Int64 => DataType::Int64,
            _ => DataType::Float64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RowNumber;

impl FunctionImpl for RowNumber {
    fn name(&self) -> &'static str {
        "row_number"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Window
    }

    fn signature(&self) -> Signature {
        Signature::exact(0)
    }

    fn return_type(&self, _inputs: &[DataType]) -> DataType {
        DataType::Int64
    }
}

/// `lag(expr [, offset [, default]])`
#[derive(Debug, Clone, Copy)]
pub struct Lag;

impl FunctionImpl for Lag {
    fn name(&self) -> &'static str {
        "lag"
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Window
    }

    fn signature(&self) -> Signature {
        Signature::range(1, 3)
    }

    fn return_type(&self, inputs: &[DataType]) -> DataType {
        first_or_null(inputs)
    }
}
