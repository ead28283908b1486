//! Load-time column kind inference shared by the CSV and spreadsheet loaders.
//!
//! Loaders turn each cell into a [`RawCell`] and hand whole columns to [`build_dataset`], which
//! decides one [`DataType`] per column and converts the cells into typed [`Value`]s.

use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Cell tokens treated as missing values.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A decoded cell before its column kind is known.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawCell {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl RawCell {
    /// Classify a delimited-text cell.
    ///
    /// Surrounding whitespace is ignored when matching missing-value tokens, numbers and
    /// booleans; text cells keep it.
    pub(crate) fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_na_token(trimmed) {
            return Self::Empty;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Self::Float(f);
        }
        match trimmed {
            "True" | "TRUE" | "true" => Self::Bool(true),
            "False" | "FALSE" | "false" => Self::Bool(false),
            _ => Self::Text(raw.to_owned()),
        }
    }

    /// Classify a spreadsheet string cell. Spreadsheet strings stay strings even when they look
    /// numeric; only missing-value tokens are recognised.
    pub(crate) fn from_sheet_text(raw: &str) -> Self {
        if is_na_token(raw.trim()) {
            Self::Empty
        } else {
            Self::Text(raw.to_owned())
        }
    }

    /// Spreadsheets store every number as a float; integral ones load as integers.
    pub(crate) fn from_number(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            Self::Int(f as i64)
        } else {
            Self::Float(f)
        }
    }

    fn into_value(self, data_type: DataType) -> Value {
        match (data_type, self) {
            (_, RawCell::Empty) => Value::Null,
            (DataType::Int64, RawCell::Int(i)) => Value::Int64(i),
            (DataType::Float64, RawCell::Int(i)) => Value::Float64(i as f64),
            (DataType::Float64, RawCell::Float(f)) => Value::Float64(f),
            (DataType::Bool, RawCell::Bool(b)) => Value::Bool(b),
            (_, RawCell::Text(s)) => Value::Utf8(s),
            (_, RawCell::Int(i)) => Value::Utf8(Value::Int64(i).to_string()),
            (_, RawCell::Float(f)) => Value::Utf8(Value::Float64(f).to_string()),
            (_, RawCell::Bool(b)) => Value::Utf8(Value::Bool(b).to_string()),
        }
    }
}

pub(crate) fn is_na_token(s: &str) -> bool {
    NA_TOKENS.contains(&s)
}

/// Decide the kind of a column from its non-missing cells.
pub(crate) fn infer_kind(cells: &[RawCell]) -> DataType {
    let (mut ints, mut floats, mut bools, mut texts) = (false, false, false, false);
    for cell in cells {
        match cell {
            RawCell::Empty => {}
            RawCell::Int(_) => ints = true,
            RawCell::Float(_) => floats = true,
            RawCell::Bool(_) => bools = true,
            RawCell::Text(_) => texts = true,
        }
    }

    match (ints, floats, bools, texts) {
        (false, false, false, false) => DataType::Null,
        (_, _, _, true) => DataType::Utf8,
        (true, false, false, false) => DataType::Int64,
        (_, true, false, false) => DataType::Float64,
        (false, false, true, false) => DataType::Bool,
        _ => DataType::Utf8,
    }
}

/// Make header names usable as column identifiers: blank names become `Unnamed: <i>` and
/// repeated names get `.1`, `.2`, ... suffixes.
pub(crate) fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while out.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

/// Assemble a typed [`DataSet`] from header names and column-major raw cells.
///
/// Every column in `columns` must have the same length.
pub(crate) fn build_dataset(names: Vec<String>, columns: Vec<Vec<RawCell>>) -> DataSet {
    let row_count = columns.first().map(Vec::len).unwrap_or(0);
    let mut fields = Vec::with_capacity(names.len());
    let mut typed: Vec<Vec<Value>> = Vec::with_capacity(columns.len());

    for (name, cells) in normalize_headers(names).into_iter().zip(columns) {
        let kind = infer_kind(&cells);
        fields.push(Field::new(name, kind));
        typed.push(cells.into_iter().map(|c| c.into_value(kind)).collect());
    }

    let mut rows: Vec<Vec<Value>> = (0..row_count)
        .map(|_| Vec::with_capacity(typed.len()))
        .collect();
    for column in typed {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value);
        }
    }

    DataSet::new(Schema::new(fields), rows)
}
