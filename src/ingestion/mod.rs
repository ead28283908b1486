//! Loading entrypoints and implementations.
//!
//! Most callers should use [`load`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`LoadOptions`])
//! - reads the file into an in-memory [`crate::types::DataSet`]
//! - infers one [`crate::types::DataType`] per column while loading
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
mod infer;
pub mod unified;

pub use unified::{load, LoadOptions, SheetSelector, SourceFormat};
