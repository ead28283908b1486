//! Multi-file runs: load and aggregate every file of a directory, then merge the results.
//!
//! This module sits "above" [`crate::ingestion`] and [`crate::processing`] and provides:
//!
//! - per-file load + aggregate with errors collected as data, never aborting the batch
//! - the merge pass (concatenate per-file results, aggregate once more)
//! - observer hooks for logging and alerting (see [`RunObserver`])
//!
//! A run is a plain synchronous call; nothing is remembered between runs.

mod observer;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ReportFormat;
use crate::error::{ReportError, ReportResult};
use crate::export;
use crate::ingestion::{load, LoadOptions};
use crate::listing::{list_tabular_files, ListingOptions};
use crate::processing::{aggregate, capture_types, restore_types};
use crate::types::DataSet;

pub use observer::{
    CompositeObserver, FileObserver, RunContext, RunObserver, RunStage, RunStats, Severity,
    TracingObserver,
};

/// File identifier used for failures of the merge step.
pub const MERGE_ERROR_FILE: &str = "result";

/// Everything a run needs: where the files are, which report to build and how to read them.
#[derive(Clone)]
pub struct AggregationRequest {
    pub directory: PathBuf,
    pub format: ReportFormat,
    /// Sheet and header settings shared by every file of the run.
    pub load: LoadOptions,
    pub listing: ListingOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn RunObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for AggregationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationRequest")
            .field("directory", &self.directory)
            .field("format", &self.format)
            .field("load", &self.load)
            .field("listing", &self.listing)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl AggregationRequest {
    pub fn new(directory: impl Into<PathBuf>, format: ReportFormat, load: LoadOptions) -> Self {
        Self {
            directory: directory.into(),
            format,
            load,
            listing: ListingOptions::default(),
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }

    /// Attach an observer for run events.
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_listing(mut self, listing: ListingOptions) -> Self {
        self.listing = listing;
        self
    }

    pub fn with_alert_threshold(mut self, severity: Severity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    /// Shorthand for [`reduce_directory`].
    pub fn run(&self) -> ReportResult<AggregationResult> {
        reduce_directory(self)
    }

    fn notify_success(&self, ctx: &RunContext, stats: RunStats) {
        if let Some(obs) = &self.observer {
            obs.on_success(ctx, stats);
        }
    }

    fn notify_failure(&self, ctx: &RunContext, error: &ReportError) {
        if let Some(obs) = &self.observer {
            let sev = Severity::classify(ctx.stage, error);
            obs.on_failure(ctx, sev, error);
            if sev >= self.alert_at_or_above {
                obs.on_alert(ctx, sev, error);
            }
        }
    }
}

/// One failed file (or the failed merge step, reported as file `"result"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileError {
    pub file: String,
    pub message: String,
}

impl FileError {
    pub fn new(file: impl Into<String>, error: &ReportError) -> Self {
        Self {
            file: file.into(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResult {
    /// The merged table; `None` when no file succeeded or the merge step failed.
    pub table: Option<DataSet>,
    /// Failures in processing order, merge failure last.
    pub errors: Vec<FileError>,
}

impl AggregationResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `"<file>: <message>"` for every failure.
    pub fn error_lines(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Error lines joined with newlines, cut to `max_chars` characters.
    pub fn summary(&self, max_chars: usize) -> String {
        export::summarize_errors(&self.error_lines(), max_chars)
    }

    /// Persist the full error list (see [`export::ERROR_LOG_FILE_NAME`]).
    pub fn write_error_log(&self, path: impl AsRef<Path>) -> ReportResult<()> {
        export::write_error_log(&self.error_lines(), path)
    }
}

/// List the request's directory and reduce every supported file in it.
///
/// Only listing the directory itself can fail; everything after that is reported through
/// [`AggregationResult::errors`].
pub fn reduce_directory(request: &AggregationRequest) -> ReportResult<AggregationResult> {
    let files = list_tabular_files(&request.directory, &request.listing)?;
    Ok(reduce_files(request, &files))
}

/// Reduce `files` (relative to the request's directory) in the given order.
///
/// Each file is loaded and aggregated on its own; a failing file is recorded and skipped. The
/// successful per-file results are then concatenated and aggregated once more with the same keys
/// and columns.
pub fn reduce_files(request: &AggregationRequest, files: &[PathBuf]) -> AggregationResult {
    let start = Instant::now();
    let keys = request.format.keys.as_slice();
    let working = request.format.working_columns();

    tracing::info!(
        dir = %request.directory.display(),
        format = %request.format.name,
        files = files.len(),
        "aggregation run started"
    );

    let mut per_file: Vec<DataSet> = Vec::with_capacity(files.len());
    let mut errors: Vec<FileError> = Vec::new();

    for file in files {
        let path = request.directory.join(file);
        let ctx = RunContext {
            path: path.clone(),
            source: file.to_string_lossy().into_owned(),
            stage: RunStage::File,
        };
        let outcome = load(&path, &request.load).and_then(|table| {
            let reduced = aggregate(&table, keys, working.as_slice())?;
            Ok((table.row_count(), reduced))
        });
        match outcome {
            Ok((input_rows, reduced)) => {
                tracing::debug!(
                    file = %file.display(),
                    input_rows,
                    output_rows = reduced.row_count(),
                    "file aggregated"
                );
                request.notify_success(
                    &ctx,
                    RunStats {
                        input_rows,
                        output_rows: reduced.row_count(),
                    },
                );
                per_file.push(reduced);
            }
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "file skipped");
                request.notify_failure(&ctx, &e);
                errors.push(FileError::new(ctx.source.as_str(), &e));
            }
        }
    }

    if per_file.is_empty() {
        tracing::warn!(errors = errors.len(), "no file could be aggregated");
        return AggregationResult {
            table: None,
            errors,
        };
    }

    let ctx = RunContext {
        path: request.directory.clone(),
        source: MERGE_ERROR_FILE.to_string(),
        stage: RunStage::Merge,
    };
    let table = match merge(&per_file, keys, &working) {
        Ok(merged) => {
            let input_rows = per_file.iter().map(DataSet::row_count).sum();
            request.notify_success(
                &ctx,
                RunStats {
                    input_rows,
                    output_rows: merged.row_count(),
                },
            );
            Some(merged)
        }
        Err(e) => {
            tracing::warn!(error = %e, "merge failed");
            request.notify_failure(&ctx, &e);
            errors.push(FileError::new(ctx.source.as_str(), &e));
            None
        }
    };

    tracing::info!(
        succeeded = per_file.len(),
        failed = errors.len(),
        rows = table.as_ref().map_or(0, DataSet::row_count),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "aggregation run finished"
    );

    AggregationResult { table, errors }
}

/// Concatenate per-file results, restore integer columns from the first result and aggregate.
fn merge(per_file: &[DataSet], keys: &[String], working: &[String]) -> ReportResult<DataSet> {
    let empty = DataSet::default();
    let snapshot = capture_types(per_file.first().unwrap_or(&empty));
    let step = || -> ReportResult<DataSet> {
        let combined = restore_types(&DataSet::concat(per_file), &snapshot)?;
        aggregate(&combined, keys, working)
    };
    step().map_err(|e| ReportError::Merge(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use super::{merge, AggregationResult, FileError, RunContext, RunObserver, RunStats, Severity};
    use crate::error::ReportError;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn subtotal(rows: Vec<(i64, &str, Value)>, amount_type: DataType) -> DataSet {
        DataSet::new(
            Schema::new(vec![
                Field::new("id", DataType::Int64),
                Field::new("name", DataType::Utf8),
                Field::new("amount", amount_type),
            ]),
            rows.into_iter()
                .map(|(id, name, amount)| vec![Value::Int64(id), Value::Utf8(name.to_string()), amount])
                .collect(),
        )
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn merge_sums_subtotals_and_keeps_integers() {
        let a = subtotal(
            vec![(1, "A", Value::Int64(15)), (2, "C", Value::Int64(7))],
            DataType::Int64,
        );
        let b = subtotal(vec![(1, "Z", Value::Int64(4))], DataType::Int64);
        let merged = merge(&[a, b], &strings(&["id"]), &strings(&["id", "name", "amount"])).unwrap();

        assert_eq!(merged.schema.fields[2].data_type, DataType::Int64);
        assert_eq!(
            merged.rows,
            vec![
                vec![Value::Int64(1), Value::Utf8("A".to_string()), Value::Int64(19)],
                vec![Value::Int64(2), Value::Utf8("C".to_string()), Value::Int64(7)],
            ]
        );
    }

    #[test]
    fn merge_fails_when_first_result_was_integer_and_later_one_is_fractional() {
        let a = subtotal(vec![(1, "A", Value::Int64(15))], DataType::Int64);
        let b = subtotal(vec![(1, "B", Value::Float64(0.5))], DataType::Float64);
        let err = merge(&[a, b], &strings(&["id"]), &strings(&["id", "name", "amount"])).unwrap_err();
        assert!(matches!(err, ReportError::Merge(_)));
        assert!(err.to_string().starts_with("merge failed: cannot cast column 'amount'"));
    }

    #[test]
    fn result_renders_error_lines_and_bounded_summary() {
        let result = AggregationResult {
            table: None,
            errors: vec![
                FileError {
                    file: "a.csv".to_string(),
                    message: "read error: boom".to_string(),
                },
                FileError::new(
                    "result",
                    &ReportError::Merge(Box::new(ReportError::UnknownColumn {
                        column: "id".to_string(),
                    })),
                ),
            ],
        };
        assert!(result.has_errors());
        assert_eq!(
            result.error_lines(),
            vec![
                "a.csv: read error: boom".to_string(),
                "result: merge failed: unknown column 'id'".to_string(),
            ]
        );
        assert_eq!(result.summary(10), "a.csv: ...");
    }

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl RunObserver for Recording {
        fn on_success(&self, ctx: &RunContext, stats: RunStats) {
            self.events
                .lock()
                .unwrap()
                .push(format!("ok {:?} {}", ctx.stage, stats.output_rows));
        }

        fn on_failure(&self, ctx: &RunContext, severity: Severity, _error: &ReportError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("fail {:?} {severity:?}", ctx.stage));
        }

        fn on_alert(&self, ctx: &RunContext, severity: Severity, _error: &ReportError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("alert {:?} {severity:?}", ctx.stage));
        }
    }

    #[test]
    fn failures_reach_observer_with_alert_at_threshold() {
        let dir = std::env::temp_dir();
        let obs = Arc::new(Recording::default());
        let request = super::AggregationRequest::new(
            &dir,
            crate::config::ReportFormat::new("r", ["id"], ["id"]),
            crate::ingestion::LoadOptions::default(),
        )
        .with_observer(obs.clone())
        .with_alert_threshold(Severity::Error);

        let result = super::reduce_files(
            &request,
            &[PathBuf::from("sheet-summary-definitely-missing-file.csv")],
        );
        assert!(result.table.is_none());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            *obs.events.lock().unwrap(),
            vec!["fail File Critical".to_string(), "alert File Critical".to_string()]
        );
    }
}
