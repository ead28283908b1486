//! Unified loading entrypoint.
//!
//! Most callers should use [`load`], which reads a file into an in-memory
//! [`crate::types::DataSet`] using the format implied by its extension.
//!
//! - If [`LoadOptions::format`] is `None`, the format is inferred from the file extension.
//! - Spreadsheets read the sheet chosen by [`LoadOptions::sheet`] and take the header from
//!   [`LoadOptions::header_row`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult, SourceError};
use crate::types::DataSet;

use super::csv;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// Spreadsheet workbooks (`.xlsx`, `.xls`), feature-gated behind `excel`.
    Excel,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Format implied by the extension of `path`, if it is a supported one.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
    }
}

/// Which worksheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetSelector {
    /// Zero-based sheet position.
    Index(usize),
    /// Sheet name.
    Name(String),
}

impl SheetSelector {
    /// Interpret user text: numeric-looking input selects by index, anything else by name.
    /// Blank input selects the first sheet.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        match trimmed.parse::<usize>() {
            Ok(idx) => Self::Index(idx),
            Err(_) => Self::Name(s.to_owned()),
        }
    }
}

impl Default for SheetSelector {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(idx) => write!(f, "{idx}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Options controlling how a file is loaded.
///
/// One value is shared by every file of an aggregation run. Use [`Default`] for the first sheet
/// with the header on the first row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<SourceFormat>,
    /// Spreadsheet worksheet to read. Ignored for CSV.
    pub sheet: SheetSelector,
    /// Number of rows to skip before the header row. Ignored for CSV.
    pub header_row: usize,
}

/// Load one file into a [`DataSet`].
///
/// # Errors
///
/// - [`ReportError::UnsupportedFormat`] when the extension is not `csv`, `xlsx` or `xls`
/// - [`ReportError::SourceRead`] wrapping any I/O, decode or shape failure
///
/// # Examples
///
/// ```no_run
/// use sheet_summary::ingestion::{load, LoadOptions, SheetSelector};
///
/// # fn main() -> Result<(), sheet_summary::ReportError> {
/// let ds = load("ledger.csv", &LoadOptions::default())?;
/// println!("rows={}", ds.row_count());
///
/// let opts = LoadOptions {
///     sheet: SheetSelector::Name("Summary".to_string()),
///     header_row: 2,
///     ..Default::default()
/// };
/// let ds = load("ledger.xlsx", &opts)?;
/// println!("columns={:?}", ds.column_names());
/// # Ok(())
/// # }
/// ```
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> ReportResult<DataSet> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let result = match fmt {
        SourceFormat::Csv => csv::load_csv_from_path(path),
        SourceFormat::Excel => load_excel_dispatch(path, options),
    };

    result.map_err(|source| ReportError::source_read(path, source))
}

fn infer_format_from_path(path: &Path) -> ReportResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    SourceFormat::from_extension(ext).ok_or_else(|| ReportError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: ext.to_owned(),
    })
}

fn load_excel_dispatch(path: &Path, options: &LoadOptions) -> Result<DataSet, SourceError> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, options);

    #[cfg(feature = "excel")]
    {
        super::excel::load_excel_from_path(path, &options.sheet, options.header_row)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(SourceError::malformed(
            "spreadsheet loading not enabled (enable cargo feature 'excel')",
        ))
    }
}
