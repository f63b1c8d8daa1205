//! Column folds backing [`crate::processing::group_by_aggregate`].

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataType, Value};

/// Reduction applied to the rows of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Count all rows (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
}

impl ReduceOp {
    /// Data type produced when reducing a column of `input` type.
    pub fn output_type(self, input: DataType) -> DataType {
        match self {
            Self::Count => DataType::Int64,
            Self::Sum => input,
        }
    }
}

pub(crate) fn check_reducible(column: &str, data_type: DataType, op: ReduceOp) -> ProcessingResult<()> {
    match (op, data_type) {
        (ReduceOp::Count, _) | (ReduceOp::Sum, DataType::Int64 | DataType::Float64) => Ok(()),
        _ => Err(ProcessingError::TypeMismatch {
            message: format!("cannot apply {op:?} to column '{column}' of type {data_type:?}"),
        }),
    }
}

/// Fold column `idx` of `rows` with `op`. Callers must have run [`check_reducible`].
///
/// A sum over no non-null values is `Value::Null`.
pub(crate) fn fold_column<'a, I>(rows: I, idx: usize, data_type: DataType, op: ReduceOp) -> Value
where
    I: IntoIterator<Item = &'a [Value]>,
{
    let rows = rows.into_iter();
    match (op, data_type) {
        (ReduceOp::Count, _) => Value::Int64(rows.count() as i64),
        (ReduceOp::Sum, DataType::Int64) => rows
            .filter_map(|row| match row.get(idx) {
                Some(Value::Int64(v)) => Some(*v),
                _ => None,
            })
            .reduce(|a, b| a + b)
            .map_or(Value::Null, Value::Int64),
        (ReduceOp::Sum, DataType::Float64) => rows
            .filter_map(|row| match row.get(idx) {
                Some(Value::Float64(v)) => Some(*v),
                _ => None,
            })
            .reduce(|a, b| a + b)
            .map_or(Value::Null, Value::Float64),
        (ReduceOp::Sum, _) => Value::Null,
    }
}
