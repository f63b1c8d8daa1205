use std::fs;

use taxi_trip_reports::ingestion::{ingest_from_path, ingest_glob, ingest_many, IngestionFormat, IngestionOptions};
use taxi_trip_reports::pipeline::{trips_schema, vendor_lookup_schema};
use taxi_trip_reports::types::Value;
use taxi_trip_reports::IngestionError;

const TRIPS_2009: &str = "tests/fixtures/data_nyctaxi_trips_2009.json";
const TRIPS_2010: &str = "tests/fixtures/data_nyctaxi_trips_2010.json";

#[test]
fn ingest_from_path_infers_format_from_extension() {
    let opts = IngestionOptions::default();
    let lookup = ingest_from_path("tests/fixtures/data_vendor_lookup.csv", &vendor_lookup_schema(), &opts).unwrap();
    let trips = ingest_from_path(TRIPS_2009, &trips_schema(), &opts).unwrap();
    assert_eq!(lookup.row_count(), 3);
    assert_eq!(trips.row_count(), 8);
}

#[test]
fn forced_format_reads_files_without_a_known_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trips_2009.txt");
    fs::copy(TRIPS_2009, &path).unwrap();

    let err = ingest_from_path(&path, &trips_schema(), &IngestionOptions::default()).unwrap_err();
    assert!(err.to_string().contains("cannot infer format from extension 'txt'"));

    let opts = IngestionOptions {
        format: Some(IngestionFormat::Json),
        ..Default::default()
    };
    assert_eq!(ingest_from_path(&path, &trips_schema(), &opts).unwrap().row_count(), 8);
}

#[test]
fn ingest_many_concatenates_in_path_order() {
    let ds = ingest_many(&[TRIPS_2010, TRIPS_2009], &trips_schema(), &IngestionOptions::default()).unwrap();
    assert_eq!(ds.row_count(), 15);
    assert!(ds.rows[0][1].to_string().starts_with("2010-01-01"));
    assert!(ds.rows[7][1].to_string().starts_with("2009-01-13"));

    let none: [&str; 0] = [];
    let empty = ingest_many(&none, &trips_schema(), &IngestionOptions::default()).unwrap();
    assert!(empty.is_empty());
}

#[test]
fn ingest_glob_unions_yearly_extracts_sorted_by_path() {
    let ds = ingest_glob(
        "tests/fixtures/data_nyctaxi_trips_*.json",
        &trips_schema(),
        &IngestionOptions::default(),
    )
    .unwrap();

    assert_eq!(ds.row_count(), 15);
    assert!(ds.rows[0][1].to_string().starts_with("2009-"));
    assert!(ds.rows[14][1].to_string().starts_with("2010-"));
    assert_eq!(ds.rows[14][0], Value::Utf8("XYZ".to_string()));
}

#[test]
fn ingest_glob_without_matches_fails() {
    let err = ingest_glob(
        "tests/fixtures/data_nyctaxi_trips_*.parquet",
        &trips_schema(),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IngestionError::NoInputFiles { .. }));
}

#[test]
fn ingest_glob_rejects_mismatched_extracts() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(TRIPS_2009, dir.path().join("data_nyctaxi_trips_2009.json")).unwrap();
    fs::write(
        dir.path().join("data_nyctaxi_trips_2010.json"),
        r#"{"vendor_id":"CMT","pickup_datetime":"2010-02-02T10:00:00+00:00"}"#,
    )
    .unwrap();

    let pattern = dir.path().join("data_nyctaxi_trips_*.json");
    let err = ingest_glob(&pattern.to_string_lossy(), &trips_schema(), &IngestionOptions::default()).unwrap_err();
    assert!(err.to_string().contains("missing required field 'trip_distance'"));
}
