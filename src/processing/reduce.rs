//! Column reductions used by the aggregator.

use crate::error::{ReportError, ReportResult};
use crate::types::{DataSet, DataType, Value};

/// Built-in reduction operations over a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Sum numeric values; missing values count as zero.
    Sum,
    /// First non-missing value in row order.
    First,
}

/// Reduce a whole column using a built-in [`ReduceOp`].
///
/// - Returns [`ReportError::UnknownColumn`] if `column` does not exist in the schema.
/// - `Sum` keeps the column kind: integer columns sum to `Int64`, float columns to `Float64`.
///   An empty or all-missing column sums to zero. Non-numeric columns reduce to `Null`.
/// - `First` returns `Null` if every value is missing.
pub fn reduce(dataset: &DataSet, column: &str, op: ReduceOp) -> ReportResult<Value> {
    let idx = dataset
        .schema
        .index_of(column)
        .ok_or_else(|| ReportError::UnknownColumn {
            column: column.to_owned(),
        })?;
    let data_type = dataset.schema.fields[idx].data_type;
    reduce_values(column, data_type, dataset.column(idx), op)
}

/// Reduce an arbitrary sequence of values that all belong to a column of kind `data_type`.
pub(crate) fn reduce_values<'a>(
    column: &str,
    data_type: DataType,
    values: impl IntoIterator<Item = &'a Value>,
    op: ReduceOp,
) -> ReportResult<Value> {
    match op {
        ReduceOp::First => Ok(values
            .into_iter()
            .find(|v| !v.is_null())
            .cloned()
            .unwrap_or(Value::Null)),
        ReduceOp::Sum => sum_typed(column, data_type, values),
    }
}

fn sum_typed<'a>(
    column: &str,
    data_type: DataType,
    values: impl IntoIterator<Item = &'a Value>,
) -> ReportResult<Value> {
    match data_type {
        DataType::Int64 => {
            let mut acc: i64 = 0;
            for v in values {
                if let Value::Int64(i) = v {
                    acc = acc.checked_add(*i).ok_or_else(|| ReportError::SumOverflow {
                        column: column.to_owned(),
                    })?;
                }
            }
            Ok(Value::Int64(acc))
        }
        DataType::Float64 => {
            let mut acc: f64 = 0.0;
            for v in values {
                match v {
                    Value::Float64(f) => acc += f,
                    Value::Int64(i) => acc += *i as f64,
                    _ => {}
                }
            }
            Ok(Value::Float64(acc))
        }
        _ => Ok(Value::Null),
    }
}
