#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};

use crate::error::SourceError;
use crate::types::DataSet;

use super::infer::{build_dataset, RawCell};
use super::unified::SheetSelector;

/// Load one sheet of a spreadsheet (`.xlsx`, `.xls`) into an in-memory `DataSet`.
///
/// Behavior:
/// - Picks the sheet by zero-based index or by name
/// - Skips `header_row` rows (counted from the sheet's first used row) and reads the next one as
///   the header
/// - Reads every remaining row and infers one kind per column
pub fn load_excel_from_path(
    path: impl AsRef<Path>,
    sheet: &SheetSelector,
    header_row: usize,
) -> Result<DataSet, SourceError> {
    let mut workbook = open_workbook_auto(path)?;

    let range = match sheet {
        SheetSelector::Index(idx) => {
            let sheet_count = workbook.sheet_names().len();
            workbook.worksheet_range_at(*idx).ok_or_else(|| {
                SourceError::malformed(format!(
                    "worksheet index {idx} is out of range (workbook has {sheet_count} sheets)"
                ))
            })??
        }
        SheetSelector::Name(name) => workbook.worksheet_range(name)?,
    };

    load_sheet_range(&range, header_row)
}

fn load_sheet_range(range: &calamine::Range<Data>, header_row: usize) -> Result<DataSet, SourceError> {
    let rows: Vec<&[Data]> = range.rows().collect();
    let header = rows.get(header_row).ok_or_else(|| {
        SourceError::malformed(format!(
            "header row {header_row} is beyond the last row of the sheet ({} rows)",
            rows.len()
        ))
    })?;

    let names: Vec<String> = header.iter().map(cell_to_header_string).collect();
    let width = names.len();

    let mut columns: Vec<Vec<RawCell>> = vec![Vec::new(); width];
    for row in &rows[header_row + 1..] {
        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(convert_cell(row.get(idx).unwrap_or(&Data::Empty)));
        }
    }

    Ok(build_dataset(names, columns))
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Empty => String::new(),
        Data::DateTime(dt) => render_datetime(dt),
        other => other.to_string(),
    }
}

/// Dates render as `YYYY-MM-DD HH:MM:SS`, durations as `H:MM:SS`.
///
/// Serials chrono cannot represent keep their numeric form.
fn render_datetime(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        return match dt.as_duration() {
            Some(d) => {
                let secs = d.num_seconds();
                format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
            }
            None => dt.as_f64().to_string(),
        };
    }
    match dt.as_datetime() {
        Some(naive) => naive.to_string(),
        None => dt.as_f64().to_string(),
    }
}

fn convert_cell(c: &Data) -> RawCell {
    match c {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::Int(i) => RawCell::Int(*i),
        Data::Float(f) => RawCell::from_number(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::String(s) => RawCell::from_sheet_text(s),
        Data::DateTime(dt) => RawCell::Text(render_datetime(dt)),
        // ISO date and duration strings are kept as written.
        other => RawCell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use calamine::{Data, ExcelDateTime, ExcelDateTimeType, Range};

    use super::{load_sheet_range, render_datetime};
    use crate::types::{DataType, Value};

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    #[test]
    fn header_offset_skips_leading_rows() {
        let range = sheet(&[
            &[Data::String("Monthly ledger".to_string()), Data::Empty],
            &[Data::String("id".to_string()), Data::String("amount".to_string())],
            &[Data::Float(1.0), Data::Float(10.0)],
            &[Data::Float(2.0), Data::Float(2.5)],
        ]);

        let ds = load_sheet_range(&range, 1).unwrap();
        assert_eq!(ds.column_names(), vec!["id", "amount"]);
        assert_eq!(ds.schema.fields[0].data_type, DataType::Int64);
        assert_eq!(ds.schema.fields[1].data_type, DataType::Float64);
        assert_eq!(ds.rows[0], vec![Value::Int64(1), Value::Float64(10.0)]);
    }

    #[test]
    fn header_past_end_is_malformed() {
        let range = sheet(&[&[Data::String("id".to_string())]]);
        let err = load_sheet_range(&range, 3).unwrap_err();
        assert!(err.to_string().contains("header row 3 is beyond the last row"));
    }

    #[test]
    fn error_cells_load_as_missing() {
        let range = sheet(&[
            &[Data::String("amount".to_string())],
            &[Data::Error(calamine::CellErrorType::NA)],
            &[Data::Float(4.0)],
        ]);
        let ds = load_sheet_range(&range, 0).unwrap();
        assert_eq!(ds.rows, vec![vec![Value::Null], vec![Value::Int64(4)]]);
    }

    #[test]
    fn date_cells_render_as_calendar_text() {
        let date = ExcelDateTime::new(45322.0, ExcelDateTimeType::DateTime, false);
        assert_eq!(render_datetime(&date), "2024-01-31 00:00:00");

        let noon = ExcelDateTime::new(45322.5, ExcelDateTimeType::DateTime, false);
        assert_eq!(render_datetime(&noon), "2024-01-31 12:00:00");

        let span = ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false);
        assert_eq!(render_datetime(&span), "36:00:00");
    }
}
