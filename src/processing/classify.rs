//! Partition columns into summed (numeric) and first-value (other) sets.

use crate::types::DataSet;

/// Result of [`classify`]: both lists follow the table's column order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnClasses {
    /// Columns reduced by summation.
    pub numeric: Vec<String>,
    /// Columns reduced by taking the first value.
    pub other: Vec<String>,
}

/// Split the columns of `dataset` named in `subset` into numeric and other columns.
///
/// - Names in `subset` that are not columns of `dataset` are ignored.
/// - Output order is the table's own column order, not the order of `subset`.
/// - A column is numeric when its [`crate::types::DataType`] is numeric and it is not listed in
///   `exclude_from_numeric` (grouping keys holding numbers, such as account numbers, stay out of
///   the sum).
pub fn classify<S, E>(dataset: &DataSet, subset: &[S], exclude_from_numeric: &[E]) -> ColumnClasses
where
    S: AsRef<str>,
    E: AsRef<str>,
{
    let mut out = ColumnClasses::default();
    for field in &dataset.schema.fields {
        if !subset.iter().any(|s| s.as_ref() == field.name) {
            continue;
        }
        let excluded = exclude_from_numeric.iter().any(|e| e.as_ref() == field.name);
        if field.data_type.is_numeric() && !excluded {
            out.numeric.push(field.name.clone());
        } else {
            out.other.push(field.name.clone());
        }
    }
    out
}
