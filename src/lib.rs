//! `sheet-summary` turns a folder of report files (CSV and Excel) into one aggregated table.
//!
//! Every file is loaded into an in-memory [`types::DataSet`], grouped by the keys of a
//! [`config::ReportFormat`] (numeric columns summed, other columns keeping their first value),
//! and the per-file results are merged by one more aggregation pass. Files that fail are
//! reported as data, never aborting the run.
//!
//! The primary entrypoint is [`execution::reduce_directory`]; single files load through
//! [`ingestion::load`], which picks the format from the file extension.
//!
//! ## What you can load
//!
//! - **CSV**: `.csv` (UTF-8, an optional byte-order mark is skipped)
//! - **Excel workbooks** (requires the Cargo feature `excel`, on by default): `.xlsx`, `.xls`
//!
//! Column kinds are inferred once at load time:
//!
//! - [`types::DataType::Int64`], [`types::DataType::Float64`] (the numeric kinds)
//! - [`types::DataType::Bool`], [`types::DataType::Utf8`]
//! - [`types::DataType::Null`] for columns with no values at all
//!
//! Empty cells and the usual missing-value tokens (`NA`, `N/A`, `null`, `NaN`, ...) map to
//! [`types::Value::Null`]. Integer columns stay integer through every aggregation step, even
//! when they contain missing values.
//!
//! ## Quick example: aggregate a directory
//!
//! ```no_run
//! use sheet_summary::config::{ProjectConfig, ReportFormat};
//! use sheet_summary::execution::AggregationRequest;
//!
//! # fn main() -> Result<(), sheet_summary::ReportError> {
//! let project = ProjectConfig::load("reports/2024")?;
//! let format = ReportFormat::new("by-account", ["account"], ["account", "name", "balance"]);
//!
//! let result = AggregationRequest::new("reports/2024", format, project.load_options()).run()?;
//! if let Some(table) = &result.table {
//!     println!("rows={}", table.row_count());
//! }
//! for line in result.error_lines() {
//!     eprintln!("{line}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: unified loading entrypoint and format-specific loaders
//! - [`types`]: schema + in-memory dataset types
//! - [`processing`]: classification, integer preservation, reductions and group-by
//! - [`execution`]: multi-file runs, error collection and run observers
//! - [`listing`]: discovering input files in natural order
//! - [`config`]: `project.json` and report formats
//! - [`export`]: CSV export and the error report
//! - [`error`]: error types used across the crate

pub mod config;
pub mod error;
pub mod execution;
pub mod export;
pub mod ingestion;
pub mod listing;
pub mod processing;
pub mod types;

pub use error::{ReportError, ReportResult, SourceError};
