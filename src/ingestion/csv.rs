//! CSV loading.

use std::path::Path;

use crate::error::SourceError;
use crate::types::DataSet;

use super::infer::{build_dataset, RawCell};

const UTF8_BOM: char = '\u{feff}';

/// Load a CSV file into an in-memory [`DataSet`], inferring one kind per column.
///
/// Rules:
///
/// - The first record is the header row; a leading UTF-8 byte-order mark is ignored.
/// - Records shorter than the header are padded with missing values.
/// - Records longer than the header are rejected.
pub fn load_csv_from_path(path: impl AsRef<Path>) -> Result<DataSet, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    load_csv_from_reader(&mut rdr)
}

/// Load CSV data from an existing CSV reader.
///
/// The reader should be configured with `has_headers(true)` and `flexible(true)`.
pub fn load_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
) -> Result<DataSet, SourceError> {
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(SourceError::malformed("no columns to parse from file"));
    }

    let names: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches(UTF8_BOM).to_owned()
            } else {
                h.to_owned()
            }
        })
        .collect();

    let width = names.len();
    let mut columns: Vec<Vec<RawCell>> = vec![Vec::new(); width];
    for (row_idx0, result) in rdr.records().enumerate() {
        // 1-based line number for users; +1 again because header is line 1.
        let user_row = row_idx0 + 2;
        let record = result?;
        if record.len() > width {
            return Err(SourceError::malformed(format!(
                "expected {width} fields in line {user_row}, saw {}",
                record.len()
            )));
        }

        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(RawCell::from_text(record.get(idx).unwrap_or("")));
        }
    }

    Ok(build_dataset(names, columns))
}
