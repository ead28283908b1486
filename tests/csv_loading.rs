use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use sheet_summary::ingestion::csv::load_csv_from_path;
use sheet_summary::ingestion::{load, LoadOptions, SourceFormat};
use sheet_summary::types::{DataType, Value};
use sheet_summary::ReportError;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn tmp_file(name: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("sheet-summary-{name}-{nanos}.{ext}"))
}

#[test]
fn csv_with_bom_blank_lines_and_short_rows_loads() {
    let ds = load(fixture("bom_ledger.csv"), &LoadOptions::default()).unwrap();

    assert_eq!(ds.column_names(), vec!["id", "name", "amount"]);
    assert_eq!(ds.row_count(), 3);
    assert_eq!(ds.schema.fields[0].data_type, DataType::Int64);
    assert_eq!(ds.schema.fields[1].data_type, DataType::Utf8);
    // "NA" and a missing trailing cell are both missing; the column stays integer.
    assert_eq!(ds.schema.fields[2].data_type, DataType::Int64);
    assert_eq!(
        ds.rows,
        vec![
            vec![Value::Int64(1), Value::Utf8("A".to_string()), Value::Int64(10)],
            vec![Value::Int64(2), Value::Utf8("B".to_string()), Value::Null],
            vec![Value::Int64(3), Value::Utf8("C".to_string()), Value::Null],
        ]
    );
}

#[test]
fn csv_loader_matches_unified_loader() {
    let direct = load_csv_from_path(fixture("ledger/2024-01.csv")).unwrap();
    let unified = load(fixture("ledger/2024-01.csv"), &LoadOptions::default()).unwrap();
    assert_eq!(direct, unified);
    assert_eq!(direct.value(2, "amount"), Some(&Value::Int64(-20)));
    assert_eq!(direct.value(1, "note"), Some(&Value::Null));
}

#[test]
fn mixed_integer_and_float_column_is_float() {
    let path = tmp_file("mixed", "csv");
    std::fs::write(&path, "id,score,flag\n1,10,true\n2,2.5,False\n").unwrap();

    let ds = load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(ds.schema.fields[1].data_type, DataType::Float64);
    assert_eq!(ds.schema.fields[2].data_type, DataType::Bool);
    assert_eq!(ds.rows[0][1], Value::Float64(10.0));
    assert_eq!(ds.rows[1][2], Value::Bool(false));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn upper_case_extension_is_recognised() {
    let path = tmp_file("upper", "CSV");
    std::fs::write(&path, "id\n1\n").unwrap();
    assert_eq!(SourceFormat::from_path(&path), Some(SourceFormat::Csv));
    assert_eq!(load(&path, &LoadOptions::default()).unwrap().row_count(), 1);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn unsupported_extension_is_rejected_before_reading() {
    let err = load(fixture("ledger/readme.txt"), &LoadOptions::default()).unwrap_err();
    match err {
        ReportError::UnsupportedFormat { extension, .. } => assert_eq!(extension, "txt"),
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
}

#[test]
fn missing_file_is_a_read_error() {
    let err = load(fixture("does_not_exist.csv"), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, ReportError::SourceRead { .. }));
    assert!(err.is_io());
}

#[test]
fn empty_file_has_no_columns() {
    let path = tmp_file("empty", "csv");
    std::fs::write(&path, "").unwrap();
    let err = load(&path, &LoadOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "read error: no columns to parse from file");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn rows_longer_than_header_are_rejected() {
    let err = load(fixture("partial/b_ragged.csv"), &LoadOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "read error: expected 3 fields in line 2, saw 4"
    );
}
