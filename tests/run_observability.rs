use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use sheet_summary::config::ReportFormat;
use sheet_summary::execution::{
    AggregationRequest, CompositeObserver, FileObserver, RunContext, RunObserver, RunStage,
    RunStats, Severity,
};
use sheet_summary::ingestion::LoadOptions;
use sheet_summary::ReportError;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(RunStage, RunStats)>>,
    failures: Mutex<Vec<(RunStage, Severity)>>,
    alerts: Mutex<Vec<(RunStage, Severity)>>,
}

impl RunObserver for RecordingObserver {
    fn on_success(&self, ctx: &RunContext, stats: RunStats) {
        self.successes.lock().unwrap().push((ctx.stage, stats));
    }

    fn on_failure(&self, ctx: &RunContext, severity: Severity, _error: &ReportError) {
        self.failures.lock().unwrap().push((ctx.stage, severity));
    }

    fn on_alert(&self, ctx: &RunContext, severity: Severity, _error: &ReportError) {
        self.alerts.lock().unwrap().push((ctx.stage, severity));
    }
}

fn by_id() -> ReportFormat {
    ReportFormat::new("by-id", ["id"], ["id", "name", "amount"])
}

#[test]
fn per_file_failures_are_errors_and_do_not_alert_at_critical() {
    let obs = Arc::new(RecordingObserver::default());
    let request = AggregationRequest::new(fixture("partial"), by_id(), LoadOptions::default())
        .with_observer(obs.clone());
    let result = request.run().unwrap();
    assert_eq!(result.errors.len(), 2);

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(
        failures,
        vec![(RunStage::File, Severity::Error), (RunStage::File, Severity::Error)]
    );
    assert!(obs.alerts.lock().unwrap().is_empty());

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(successes.len(), 3);
    assert_eq!(
        successes[0],
        (
            RunStage::File,
            RunStats {
                input_rows: 3,
                output_rows: 2
            }
        )
    );
    assert_eq!(
        successes[2],
        (
            RunStage::Merge,
            RunStats {
                input_rows: 4,
                output_rows: 3
            }
        )
    );
}

#[test]
fn merge_failure_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let format = ReportFormat::new("by-id", ["id"], ["id", "amount"]);
    let request = AggregationRequest::new(fixture("mixed_kinds"), format, LoadOptions::default())
        .with_observer(obs.clone());
    let _ = request.run().unwrap();

    assert_eq!(
        *obs.failures.lock().unwrap(),
        vec![(RunStage::Merge, Severity::Critical)]
    );
    assert_eq!(
        *obs.alerts.lock().unwrap(),
        vec![(RunStage::Merge, Severity::Critical)]
    );
}

#[test]
fn lower_threshold_alerts_on_per_file_errors() {
    let obs = Arc::new(RecordingObserver::default());
    let request = AggregationRequest::new(fixture("partial"), by_id(), LoadOptions::default())
        .with_observer(obs.clone())
        .with_alert_threshold(Severity::Error);
    let _ = request.run().unwrap();
    assert_eq!(obs.alerts.lock().unwrap().len(), 2);
}

#[test]
fn file_observer_appends_lines_through_composite() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let log_path = std::env::temp_dir().join(format!("sheet-summary-run-{nanos}.log"));

    let recording = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn RunObserver>> = vec![
        Arc::new(FileObserver::new(&log_path)) as Arc<dyn RunObserver>,
        recording.clone() as Arc<dyn RunObserver>,
    ];
    let composite = CompositeObserver::new(observers);
    let request = AggregationRequest::new(fixture("partial"), by_id(), LoadOptions::default())
        .with_observer(Arc::new(composite));
    let _ = request.run().unwrap();

    let log = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 5);
    let fields: Vec<Vec<&str>> = lines.iter().map(|l| l.split('\t').collect()).collect();
    assert!(fields.iter().all(|f| f.len() == 4));
    assert_eq!(fields[0][1..], ["a_good.csv", "ok", "3 rows -> 2 rows"]);
    assert_eq!(
        fields[1][1..],
        [
            "b_ragged.csv",
            "Error",
            "read error: expected 3 fields in line 2, saw 4"
        ]
    );
    assert_eq!(fields[2][1..], ["c_no_key.csv", "Error", "unknown column 'id'"]);
    assert_eq!(fields[4][1..], ["result", "ok", "4 rows -> 3 rows"]);
    assert_eq!(recording.successes.lock().unwrap().len(), 3);

    let _ = std::fs::remove_file(&log_path);
}
