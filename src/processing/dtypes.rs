//! Integer-kind preservation across reductions.
//!
//! Summing or concatenating tables can widen an integer column to floating point (for example
//! when one file stores the same column with a decimal point). [`capture_types`] records which
//! columns were integers before a reduction and [`restore_types`] casts them back to the
//! nullable-integer kind afterwards, so the drift never compounds across the per-file and the
//! merge pass.

use std::collections::BTreeSet;

use crate::error::{ReportError, ReportResult};
use crate::types::{DataSet, DataType, Value};

/// Names of the columns that were integer-typed when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeSnapshot {
    integer_columns: BTreeSet<String>,
}

impl TypeSnapshot {
    pub fn was_integer(&self, column: &str) -> bool {
        self.integer_columns.contains(column)
    }

    pub fn integer_columns(&self) -> impl Iterator<Item = &str> {
        self.integer_columns.iter().map(String::as_str)
    }
}

/// Record, per column, whether it is an integer kind.
pub fn capture_types(dataset: &DataSet) -> TypeSnapshot {
    TypeSnapshot {
        integer_columns: dataset
            .schema
            .fields
            .iter()
            .filter(|f| f.data_type.is_integer())
            .map(|f| f.name.clone())
            .collect(),
    }
}

/// Cast every column of `dataset` that `snapshot` marks as integer back to [`DataType::Int64`].
///
/// Missing values stay missing. Columns absent from the snapshot or not integer in it are left
/// as they are.
///
/// # Errors
///
/// [`ReportError::IntegerCast`] when a value cannot be represented as an integer without loss
/// (a fractional float, or text that is not an integer).
pub fn restore_types(dataset: &DataSet, snapshot: &TypeSnapshot) -> ReportResult<DataSet> {
    let mut out = dataset.clone();
    for (idx, field) in dataset.schema.fields.iter().enumerate() {
        if field.data_type == DataType::Int64 || !snapshot.was_integer(&field.name) {
            continue;
        }
        let values = dataset
            .column(idx)
            .map(|v| cast_to_integer(&field.name, v))
            .collect::<ReportResult<Vec<_>>>()?;
        tracing::debug!(column = %field.name, from = ?field.data_type, "restored integer kind");
        out = out.with_column(idx, DataType::Int64, values);
    }
    Ok(out)
}

fn cast_to_integer(column: &str, value: &Value) -> ReportResult<Value> {
    let cast_err = |message: String| ReportError::IntegerCast {
        column: column.to_owned(),
        message,
    };

    match value {
        Value::Null => Ok(Value::Null),
        Value::Int64(i) => Ok(Value::Int64(*i)),
        Value::Bool(b) => Ok(Value::Int64(i64::from(*b))),
        Value::Float64(f) => {
            if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Ok(Value::Int64(*f as i64))
            } else {
                Err(cast_err(format!("non-integral value {f:?}")))
            }
        }
        Value::Utf8(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| cast_err(format!("'{s}': {e}"))),
    }
}
