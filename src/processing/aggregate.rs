//! Group-by aggregation of a single table.

use std::collections::HashMap;

use crate::error::{ReportError, ReportResult};
use crate::types::{DataSet, Schema, Value};

use super::classify::classify;
use super::dtypes::{capture_types, restore_types};
use super::reduce::{reduce_values, ReduceOp};

/// Hashable image of a key cell. Grouping uses exact value equality; missing keys form one group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Null,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(String),
}

impl From<&Value> for GroupKey {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Int64(i) => Self::Int(*i),
            // -0.0 and 0.0 are the same key.
            Value::Float64(f) => Self::Float(if *f == 0.0 { 0 } else { f.to_bits() }),
            Value::Bool(b) => Self::Bool(*b),
            Value::Utf8(s) => Self::Text(s.clone()),
        }
    }
}

/// Reduce `dataset` to one row per distinct key tuple.
///
/// 1. The working columns are the names in `columns` that exist in `dataset`, in the table's own
///    column order (the order of `columns` does not matter).
/// 2. With keys, rows are grouped by the tuple of key values; groups appear in the order their
///    key tuple first appears. Numeric non-key columns are summed (missing counts as zero), every
///    other column keeps its first non-missing value. Integer columns of the input stay integer.
/// 3. Without keys, the result is a single total row holding only the numeric columns.
///
/// # Errors
///
/// - [`ReportError::UnknownColumn`] if a key is not among the working columns
/// - [`ReportError::SumOverflow`] / [`ReportError::IntegerCast`] from the reduction step
///
/// # Examples
///
/// ```rust
/// use sheet_summary::processing::aggregate;
/// use sheet_summary::types::{DataSet, DataType, Field, Schema, Value};
///
/// let ds = DataSet::new(
///     Schema::new(vec![
///         Field::new("id", DataType::Int64),
///         Field::new("name", DataType::Utf8),
///         Field::new("amount", DataType::Int64),
///     ]),
///     vec![
///         vec![Value::Int64(1), Value::Utf8("A".into()), Value::Int64(10)],
///         vec![Value::Int64(1), Value::Utf8("B".into()), Value::Int64(5)],
///         vec![Value::Int64(2), Value::Utf8("C".into()), Value::Int64(7)],
///     ],
/// );
///
/// let out = aggregate(&ds, &["id"], &["id", "name", "amount"]).unwrap();
/// assert_eq!(out.row_count(), 2);
/// assert_eq!(out.rows[0], vec![Value::Int64(1), Value::Utf8("A".into()), Value::Int64(15)]);
/// ```
pub fn aggregate<K, C>(dataset: &DataSet, keys: &[K], columns: &[C]) -> ReportResult<DataSet>
where
    K: AsRef<str>,
    C: AsRef<str>,
{
    let snapshot = capture_types(dataset);

    let working: Vec<String> = dataset
        .schema
        .field_names()
        .filter(|name| columns.iter().any(|c| c.as_ref() == *name))
        .map(str::to_owned)
        .collect();
    let projected = dataset.select(working.as_slice());

    let mut key_idxs = Vec::with_capacity(keys.len());
    for key in keys {
        let idx = projected
            .schema
            .index_of(key.as_ref())
            .ok_or_else(|| ReportError::UnknownColumn {
                column: key.as_ref().to_owned(),
            })?;
        key_idxs.push(idx);
    }

    let classes = classify(&projected, working.as_slice(), keys);

    if keys.is_empty() {
        return total_row(&projected, &classes.numeric);
    }

    let mut index: HashMap<Vec<GroupKey>, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (row_idx, row) in projected.rows.iter().enumerate() {
        let key: Vec<GroupKey> = key_idxs
            .iter()
            .map(|&i| GroupKey::from(row.get(i).unwrap_or(&Value::Null)))
            .collect();
        let group = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(row_idx);
    }

    let ops: Vec<ReduceOp> = projected
        .schema
        .fields
        .iter()
        .map(|f| {
            if classes.numeric.contains(&f.name) {
                ReduceOp::Sum
            } else {
                ReduceOp::First
            }
        })
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(groups.len());
    for members in &groups {
        let mut out = Vec::with_capacity(ops.len());
        for (col, (field, op)) in projected.schema.fields.iter().zip(&ops).enumerate() {
            let values = members.iter().map(|&r| &projected.rows[r][col]);
            out.push(reduce_values(&field.name, field.data_type, values, *op)?);
        }
        rows.push(out);
    }

    tracing::debug!(
        rows_in = projected.row_count(),
        groups = rows.len(),
        keys = key_idxs.len(),
        "aggregated table"
    );

    let reduced = DataSet::new(projected.schema.clone(), rows);
    let restored = restore_types(&reduced, &snapshot)?;
    Ok(restored.select(working.as_slice()))
}

/// Single-row total over the numeric columns only.
fn total_row(dataset: &DataSet, numeric: &[String]) -> ReportResult<DataSet> {
    let mut fields = Vec::with_capacity(numeric.len());
    let mut row = Vec::with_capacity(numeric.len());
    for name in numeric {
        let Some(idx) = dataset.schema.index_of(name) else {
            continue;
        };
        let field = &dataset.schema.fields[idx];
        row.push(reduce_values(name, field.data_type, dataset.column(idx), ReduceOp::Sum)?);
        fields.push(field.clone());
    }

    tracing::debug!(rows_in = dataset.row_count(), columns = fields.len(), "computed total row");
    Ok(DataSet::new(Schema::new(fields), vec![row]))
}
