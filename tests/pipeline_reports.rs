use std::fs;
use std::path::{Path, PathBuf};

use taxi_trip_reports::config::ReportConfig;
use taxi_trip_reports::pipeline::run_from_config;
use taxi_trip_reports::PipelineError;

const TABLES: [&str; 3] = ["top_vendors", "top_week", "vendor_trips_in_top_week"];

fn config(output_dir: &Path) -> ReportConfig {
    ReportConfig {
        input_dir: PathBuf::from("tests/fixtures"),
        output_dir: output_dir.to_path_buf(),
        ..ReportConfig::default()
    }
}

fn read_report(dir: &Path, table: &str) -> String {
    fs::read_to_string(dir.join(format!("{table}.csv"))).unwrap()
}

#[test]
fn reports_match_expected_csv() {
    let out = tempfile::tempdir().unwrap();
    let reports = run_from_config(&config(out.path())).unwrap();

    assert_eq!(reports.top_vendors.row_count(), 2);
    for table in TABLES {
        let expected = fs::read_to_string(format!("tests/fixtures/expected_{table}.csv")).unwrap();
        assert_eq!(read_report(out.path(), table), expected, "{table}");
    }
}

#[test]
fn rerunning_produces_byte_identical_output() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    run_from_config(&config(first.path())).unwrap();
    run_from_config(&config(second.path())).unwrap();
    run_from_config(&config(second.path())).unwrap();

    for table in TABLES {
        assert_eq!(read_report(first.path(), table), read_report(second.path(), table));
    }
    assert_eq!(fs::read_dir(second.path()).unwrap().count(), TABLES.len());
}

#[test]
fn single_threaded_and_tiny_chunks_agree() {
    let wide = tempfile::tempdir().unwrap();
    let narrow = tempfile::tempdir().unwrap();

    run_from_config(&config(wide.path())).unwrap();
    let mut cfg = config(narrow.path());
    cfg.execution.num_threads = Some(1);
    cfg.execution.chunk_size = 1;
    cfg.execution.max_in_flight_chunks = Some(1);
    run_from_config(&cfg).unwrap();

    for table in TABLES {
        assert_eq!(read_report(wide.path(), table), read_report(narrow.path(), table));
    }
}

#[test]
fn failed_run_leaves_previous_reports_untouched() {
    let out = tempfile::tempdir().unwrap();
    run_from_config(&config(out.path())).unwrap();
    let before: Vec<String> = TABLES.iter().map(|t| read_report(out.path(), t)).collect();

    let broken = tempfile::tempdir().unwrap();
    fs::copy(
        "tests/fixtures/data_vendor_lookup.csv",
        broken.path().join("data_vendor_lookup.csv"),
    )
    .unwrap();
    fs::write(
        broken.path().join("data_nyctaxi_trips_2011.json"),
        "{\"vendor_id\":\"CMT\",\"pickup_datetime\":\"not a time\",\"trip_distance\":1.0}\n",
    )
    .unwrap();
    let cfg = ReportConfig {
        input_dir: broken.path().to_path_buf(),
        ..config(out.path())
    };

    let err = run_from_config(&cfg).unwrap_err();
    assert!(matches!(err, PipelineError::Ingestion(_)));

    let after: Vec<String> = TABLES.iter().map(|t| read_report(out.path(), t)).collect();
    assert_eq!(before, after);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), TABLES.len());
}

#[test]
fn missing_trip_extracts_fail_before_publishing() {
    let input = tempfile::tempdir().unwrap();
    fs::copy(
        "tests/fixtures/data_vendor_lookup.csv",
        input.path().join("data_vendor_lookup.csv"),
    )
    .unwrap();
    let out = tempfile::tempdir().unwrap();
    let cfg = ReportConfig {
        input_dir: input.path().to_path_buf(),
        output_dir: out.path().join("reports"),
        ..ReportConfig::default()
    };

    let err = run_from_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("no input files match"));
    assert!(!out.path().join("reports").exists());
}

#[test]
fn empty_extract_publishes_header_only_reports() {
    let input = tempfile::tempdir().unwrap();
    fs::copy(
        "tests/fixtures/data_vendor_lookup.csv",
        input.path().join("data_vendor_lookup.csv"),
    )
    .unwrap();
    fs::write(input.path().join("data_nyctaxi_trips_2014.json"), "").unwrap();
    let out = tempfile::tempdir().unwrap();
    let cfg = ReportConfig {
        input_dir: input.path().to_path_buf(),
        ..config(out.path())
    };

    let reports = run_from_config(&cfg).unwrap();
    assert!(reports.top_week.is_empty());
    assert_eq!(read_report(out.path(), "top_week"), "year,week,tot_trips\n");
}
