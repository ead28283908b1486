use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ReportError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (one file or step failed).
    Error,
    /// Critical error (I/O failures, or the merge step losing the whole result).
    Critical,
}

impl Severity {
    /// Classify a failure observed during `stage`.
    pub fn classify(stage: RunStage, error: &ReportError) -> Self {
        if error.is_io() {
            return Self::Critical;
        }
        match (stage, error) {
            (RunStage::Merge, _) => Self::Critical,
            (_, ReportError::UnsupportedFormat { .. }) => Self::Warning,
            _ => Self::Error,
        }
    }
}

/// Step of a run an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// Loading and aggregating one input file.
    File,
    /// Concatenating the per-file results and aggregating them again.
    Merge,
}

/// Where an event happened.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Input file, or the run directory for [`RunStage::Merge`].
    pub path: PathBuf,
    /// Name the error report uses: the file relative to the run directory, or `result`.
    pub source: String,
    pub stage: RunStage,
}

/// Shape of a successful step's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Rows loaded from the file (for the merge step: rows of the concatenation).
    pub input_rows: usize,
    /// Rows after aggregation.
    pub output_rows: usize,
}

/// Observer interface for run outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait RunObserver: Send + Sync {
    /// Called when a file or the merge step succeeds.
    fn on_success(&self, _ctx: &RunContext, _stats: RunStats) {}

    /// Called when a file or the merge step fails.
    fn on_failure(&self, _ctx: &RunContext, _severity: Severity, _error: &ReportError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &ReportError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every event to each inner observer, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn RunObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: impl IntoIterator<Item = Arc<dyn RunObserver>>) -> Self {
        Self {
            observers: observers.into_iter().collect(),
        }
    }

    fn each(&self, f: impl Fn(&dyn RunObserver)) {
        self.observers.iter().for_each(|o| f(o.as_ref()));
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompositeObserver({} observers)", self.observers.len())
    }
}

impl RunObserver for CompositeObserver {
    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        self.each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, error: &ReportError) {
        self.each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &ReportError) {
        self.each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Forwards run events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        tracing::info!(
            stage = ?ctx.stage,
            source = %ctx.source,
            input_rows = stats.input_rows,
            output_rows = stats.output_rows,
            "step finished"
        );
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, error: &ReportError) {
        tracing::warn!(
            stage = ?ctx.stage,
            ?severity,
            source = %ctx.source,
            path = %ctx.path.display(),
            %error,
            "step failed"
        );
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &ReportError) {
        tracing::error!(
            stage = ?ctx.stage,
            ?severity,
            source = %ctx.source,
            path = %ctx.path.display(),
            %error,
            "step failed (alert)"
        );
    }
}

/// Keeps a running log of a run next to its results.
///
/// Each event becomes one tab-separated line: Unix seconds, the source name used by the error
/// report, an outcome, and a detail.
///
/// ```text
/// 1718000000	2024-01.csv	ok	3 rows -> 2 rows
/// 1718000000	b.csv	Error	read error: expected 3 fields in line 2, saw 4
/// 1718000000	result	ALERT Critical	merge failed: ...
/// ```
///
/// Writes are best-effort; a log that cannot be opened does not fail the run.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn record(&self, ctx: &RunContext, outcome: fmt::Arguments<'_>, detail: fmt::Arguments<'_>) {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let _guard = self.lock.lock().ok();
        let file = OpenOptions::new().create(true).append(true).open(&self.path);
        if let Ok(mut file) = file {
            let _ = writeln!(file, "{secs}\t{}\t{outcome}\t{detail}", ctx.source);
        }
    }
}

impl RunObserver for FileObserver {
    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        self.record(
            ctx,
            format_args!("ok"),
            format_args!("{} rows -> {} rows", stats.input_rows, stats.output_rows),
        );
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, error: &ReportError) {
        self.record(ctx, format_args!("{severity:?}"), format_args!("{error}"));
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, error: &ReportError) {
        self.record(ctx, format_args!("ALERT {severity:?}"), format_args!("{error}"));
    }
}
