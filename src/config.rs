//! Project configuration stored next to the data files.
//!
//! Each report directory may contain a `project.json`:
//!
//! ```json
//! {
//!   "sheet_name": 0,
//!   "header": 2,
//!   "formats": [
//!     { "name": "by-account", "keys": ["account"], "columns": ["account", "name", "balance"] }
//!   ]
//! }
//! ```
//!
//! Decoding is lenient: absent or falsy `sheet_name`/`header` fall back to the first sheet and
//! header row 0, and absent `keys`/`columns` are empty.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ReportResult;
use crate::ingestion::{LoadOptions, SheetSelector};

/// File name of the per-directory project configuration.
pub const PROJECT_FILE_NAME: &str = "project.json";

/// A named report: grouping keys plus the columns to keep.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportFormat {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Grouping keys, in grouping order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub keys: Vec<String>,
    /// Columns to keep in the output.
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<String>,
}

impl ReportFormat {
    pub fn new(
        name: impl Into<String>,
        keys: impl IntoIterator<Item = impl Into<String>>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Keys followed by the remaining columns, without duplicates.
    ///
    /// This is the column set every aggregation pass of a run works on.
    pub fn working_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.keys.len() + self.columns.len());
        for name in self.keys.iter().chain(&self.columns) {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        out
    }
}

/// Contents of `project.json`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Worksheet read from every spreadsheet in the directory.
    #[serde(default, deserialize_with = "lenient_sheet")]
    pub sheet_name: SheetSelector,
    /// Rows skipped before the header row of every spreadsheet in the directory.
    #[serde(default, deserialize_with = "lenient_header")]
    pub header: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub formats: Vec<ReportFormat>,
}

impl ProjectConfig {
    /// Path of the project file inside `dir`.
    pub fn path_in(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(PROJECT_FILE_NAME)
    }

    /// Read `dir/project.json`, or return the defaults if the file does not exist.
    pub fn load(dir: impl AsRef<Path>) -> ReportResult<Self> {
        let path = Self::path_in(dir);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no project file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        Self::from_json(&text)
    }

    /// Decode a project document.
    pub fn from_json(text: &str) -> ReportResult<Self> {
        Ok(serde_json::from_str(text.trim_start_matches('\u{feff}'))?)
    }

    /// Write `dir/project.json` as indented JSON.
    pub fn save(&self, dir: impl AsRef<Path>) -> ReportResult<()> {
        let path = Self::path_in(dir);
        fs::write(&path, self.to_json()?)?;
        tracing::info!(path = %path.display(), formats = self.formats.len(), "saved project file");
        Ok(())
    }

    pub fn to_json(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load options shared by every file of a run in this directory.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            format: None,
            sheet: self.sheet_name.clone(),
            header_row: self.header,
        }
    }

    /// Find a report format by name.
    pub fn format(&self, name: &str) -> Option<&ReportFormat> {
        self.formats.iter().find(|f| f.name == name)
    }

    /// Append a format and return its index.
    pub fn add_format(&mut self, format: ReportFormat) -> usize {
        self.formats.push(format);
        self.formats.len() - 1
    }

    /// Replace the format at `index`; returns `false` if there is no such format.
    pub fn replace_format(&mut self, index: usize, format: ReportFormat) -> bool {
        match self.formats.get_mut(index) {
            Some(slot) => {
                *slot = format;
                true
            }
            None => false,
        }
    }

    /// Remove every format called `name`; returns how many were removed.
    pub fn remove_format(&mut self, name: &str) -> usize {
        let before = self.formats.len();
        self.formats.retain(|f| f.name != name);
        before - self.formats.len()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_sheet<'de, D>(deserializer: D) -> Result<SheetSelector, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Number(n) => SheetSelector::Index(n.as_u64().unwrap_or(0) as usize),
        serde_json::Value::String(s) => SheetSelector::parse(&s),
        _ => SheetSelector::default(),
    })
}

fn lenient_header<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0) as usize,
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
