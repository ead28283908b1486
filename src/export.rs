//! Writing results: CSV export and the error report.
//!
//! Exported CSV is UTF-8 with a leading byte-order mark so spreadsheet editors pick the right
//! encoding, has a header row and no index column. Files written here load back through
//! [`crate::ingestion::load`] unchanged.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::ReportResult;
use crate::types::DataSet;

/// UTF-8 byte-order mark written at the start of every export.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// File name of the persisted error report.
pub const ERROR_LOG_FILE_NAME: &str = "error.log";

/// Default character budget of [`summarize_errors`].
pub const DEFAULT_SUMMARY_CHARS: usize = 256;

/// Write `table` as CSV (BOM, header row, one line per row) to `writer`.
pub fn write_csv<W: Write>(table: &DataSet, mut writer: W) -> ReportResult<()> {
    writer.write_all(UTF8_BOM)?;
    write_records(table, writer)
}

/// Same as [`write_csv`] without the byte-order mark, for terminals and pipes.
pub fn write_records<W: Write>(table: &DataSet, writer: W) -> ReportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // A table without columns still gets its (empty) header line.
    if table.column_count() == 0 {
        let mut inner = csv_writer.into_inner().map_err(|e| e.into_error())?;
        inner.write_all(b"\n")?;
        inner.flush()?;
        return Ok(());
    }

    csv_writer.write_record(table.schema.field_names())?;
    for row in &table.rows {
        csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write `table` to `path`, replacing any existing file.
pub fn export_csv(table: &DataSet, path: impl AsRef<Path>) -> ReportResult<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    write_csv(table, file)?;
    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "exported result"
    );
    Ok(())
}

/// Export destination for a report named `format_name` inside `dir`: `dir/<name>.csv`.
///
/// Any extension already present in the name is replaced. Returns `None` for an empty name.
pub fn output_path(dir: impl AsRef<Path>, format_name: &str) -> Option<PathBuf> {
    if format_name.trim().is_empty() {
        return None;
    }
    Some(dir.as_ref().join(format_name).with_extension("csv"))
}

/// Join `lines` with newlines and cut the result to `max_chars` characters ending in `...`.
pub fn summarize_errors<S: AsRef<str>>(lines: &[S], max_chars: usize) -> String {
    let joined = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    if joined.chars().count() <= max_chars {
        return joined;
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = joined.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Write `lines` joined with newlines to `path`.
pub fn write_error_log<S: AsRef<str>>(lines: &[S], path: impl AsRef<Path>) -> ReportResult<()> {
    let path = path.as_ref();
    let body = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(path, body)?;
    tracing::debug!(path = %path.display(), lines = lines.len(), "wrote error log");
    Ok(())
}
