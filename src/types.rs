//! Core data model types.
//!
//! Every loaded file becomes an in-memory [`DataSet`]: an ordered [`Schema`] of typed [`Field`]s
//! plus row-major [`Value`] storage. The field's [`DataType`] is inferred once at load time and
//! carried alongside the rows, so later stages never re-inspect cell values to decide whether a
//! column is numeric.

use std::fmt;

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit signed integer (nullable).
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Every cell is missing; no element kind could be inferred.
    Null,
}

impl DataType {
    /// Numeric kinds are summed by the aggregator; everything else takes the first value.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int64)
    }

    /// Common kind for a column that appears with `self` in one table and `other` in another.
    pub fn unify(self, other: DataType) -> DataType {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Null, k) | (k, Self::Null) => k,
            (Self::Int64, Self::Float64) | (Self::Float64, Self::Int64) => Self::Float64,
            _ => Self::Utf8,
        }
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields describing a table's columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the field with the given name, if present.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert this value so it fits a column of kind `target` produced by [`DataType::unify`].
    ///
    /// Only widening conversions happen here (integer to float, anything to text).
    pub fn conform(self, target: DataType) -> Value {
        match (target, self) {
            (_, Value::Null) => Value::Null,
            (DataType::Float64, Value::Int64(i)) => Value::Float64(i as f64),
            (DataType::Utf8, Value::Utf8(s)) => Value::Utf8(s),
            (DataType::Utf8, other) => Value::Utf8(other.to_string()),
            (_, other) => other,
        }
    }
}

/// Renders values the way they appear in exported CSV: integers plain, floats always with a
/// fractional part or exponent (`15.0`), booleans as `True`/`False`, missing as empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v:?}"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields. Row order is
/// the insertion order from the source; nothing sorts implicitly. Transformations return new
/// datasets and leave their inputs untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema.field_names().map(str::to_owned).collect()
    }

    /// Iterate the values of the column at `idx`, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| row.get(idx).unwrap_or(&Value::Null))
    }

    /// Looks up a single cell by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.schema.index_of(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Create a new dataset with only the named columns, in the order given.
    ///
    /// Names that are not columns of this dataset are skipped.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> DataSet {
        let idxs: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.schema.index_of(c.as_ref()))
            .collect();
        let fields = idxs
            .iter()
            .map(|&i| self.schema.fields[i].clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                idxs.iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        DataSet::new(Schema::new(fields), rows)
    }

    /// Create a new dataset where the column at `idx` has been replaced.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have exactly one entry per row.
    pub fn with_column(&self, idx: usize, data_type: DataType, values: Vec<Value>) -> DataSet {
        assert!(
            values.len() == self.row_count(),
            "column length {} does not match row count {}",
            values.len(),
            self.row_count()
        );
        let mut out = self.clone();
        out.schema.fields[idx].data_type = data_type;
        for (row, value) in out.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        out
    }

    /// Stack `tables` vertically, aligning columns by name.
    ///
    /// The output column order is the order of first appearance across the inputs. A table that
    /// lacks a column contributes missing values for it. Column kinds are merged with
    /// [`DataType::unify`] and values widened to match.
    pub fn concat(tables: &[DataSet]) -> DataSet {
        let mut fields: Vec<Field> = Vec::new();
        for table in tables {
            for field in &table.schema.fields {
                match fields.iter_mut().find(|f| f.name == field.name) {
                    Some(existing) => {
                        existing.data_type = existing.data_type.unify(field.data_type);
                    }
                    None => fields.push(field.clone()),
                }
            }
        }

        let total: usize = tables.iter().map(DataSet::row_count).sum();
        let mut rows: Vec<Vec<Value>> = Vec::with_capacity(total);
        for table in tables {
            let mapping: Vec<Option<usize>> = fields
                .iter()
                .map(|f| table.schema.index_of(&f.name))
                .collect();
            for row in &table.rows {
                let out = fields
                    .iter()
                    .zip(&mapping)
                    .map(|(field, src)| match src {
                        Some(i) => row
                            .get(*i)
                            .cloned()
                            .unwrap_or(Value::Null)
                            .conform(field.data_type),
                        None => Value::Null,
                    })
                    .collect();
                rows.push(out);
            }
        }

        DataSet::new(Schema::new(fields), rows)
    }
}
