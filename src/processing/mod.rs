//! In-memory table reductions.
//!
//! The processing layer operates on [`crate::types::DataSet`] values produced by ingestion and
//! never mutates its inputs.
//!
//! - [`classify()`]: split columns into summed (numeric) and first-value (other) sets
//! - [`capture_types()`] / [`restore_types()`]: keep integer columns integer across reductions
//! - [`reduce()`]: single-column reductions (sum/first)
//! - [`aggregate()`]: group-by over a key list, or a total row when there are no keys
//!
//! ## Example: per-file subtotals merged into one total
//!
//! ```rust
//! use sheet_summary::processing::aggregate;
//! use sheet_summary::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("id", DataType::Int64),
//!     Field::new("amount", DataType::Int64),
//! ]);
//! let january = DataSet::new(
//!     schema.clone(),
//!     vec![
//!         vec![Value::Int64(1), Value::Int64(10)],
//!         vec![Value::Int64(1), Value::Int64(5)],
//!     ],
//! );
//! let february = DataSet::new(schema, vec![vec![Value::Int64(1), Value::Int64(7)]]);
//!
//! let per_file = vec![
//!     aggregate(&january, &["id"], &["id", "amount"]).unwrap(),
//!     aggregate(&february, &["id"], &["id", "amount"]).unwrap(),
//! ];
//! let merged = aggregate(&DataSet::concat(&per_file), &["id"], &["id", "amount"]).unwrap();
//! assert_eq!(merged.rows, vec![vec![Value::Int64(1), Value::Int64(22)]]);
//! ```

pub mod aggregate;
pub mod classify;
pub mod dtypes;
pub mod reduce;

pub use aggregate::aggregate;
pub use classify::{classify, ColumnClasses};
pub use dtypes::{capture_types, restore_types, TypeSnapshot};
pub use reduce::{reduce, ReduceOp};
