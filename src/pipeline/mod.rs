//! The trip report pipeline.
//!
//! ```text
//! trips + vendor lookup ──enrich──▶ enriched ──┬──▶ top_vendors ──────────────┐
//!                                              └──▶ trips_by_week ─▶ top_week ─┴─▶ vendor_trips_in_top_week
//! ```
//!
//! [`run_pipeline`] computes the enriched trips once and shares them by reference. The top-vendor
//! branch and the busiest-week branch run concurrently on the [`ExecutionEngine`]; the final join
//! waits for both.

pub mod enrich;
pub mod top_vendors;
pub mod top_weeks;
pub mod vendor_week;

use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};

use crate::config::ReportConfig;
use crate::error::{PipelineResult, ProcessingError, ProcessingResult};
use crate::execution::{ExecutionEngine, ExecutionOptions, TracingExecutionObserver};
use crate::ingestion::{ingest_from_path, ingest_glob, IngestionOptions, TracingObserver};
use crate::processing::{drop_columns, rank_within_partition, SortKey};
use crate::sink::{CsvReportSink, ReportSink};
use crate::types::{DataSet, DataType, Field, Schema, Value};

pub use enrich::enrich;
pub use top_vendors::top_vendors;
pub use top_weeks::{top_weeks, with_week};
pub use vendor_week::vendor_trips_in_top_week;

/// Column names read or produced by the pipeline.
pub mod columns {
    pub const VENDOR_ID: &str = "vendor_id";
    pub const NAME: &str = "name";
    pub const VENDOR_NAME: &str = "vendor_name";
    pub const PICKUP_DATETIME: &str = "pickup_datetime";
    pub const TRIP_DISTANCE: &str = "trip_distance";
    pub const YEAR: &str = "year";
    pub const WEEK: &str = "week";
    pub const TOT_TRIP_DISTANCE: &str = "tot_trip_distance";
    pub const TOT_TRIPS: &str = "tot_trips";
    pub const VENDOR_TOT_TRIPS_IN_WEEK: &str = "vendor_tot_trips_in_week";
    pub(crate) const RANK: &str = "rank";
}

/// Report table names, also the sink's file stems.
pub const TOP_VENDORS: &str = "top_vendors";
pub const TOP_WEEK: &str = "top_week";
pub const VENDOR_TRIPS_IN_TOP_WEEK: &str = "vendor_trips_in_top_week";

/// Schema of one yearly trip extract: the columns the reports read.
///
/// Other fields in the extracts (fares, passenger counts, drop-off times) are skipped at
/// ingestion, so their values never fail a run.
pub fn trips_schema() -> Schema {
    Schema::new(vec![
        Field::new(columns::VENDOR_ID, DataType::Utf8),
        Field::new(columns::PICKUP_DATETIME, DataType::Timestamp),
        Field::new(columns::TRIP_DISTANCE, DataType::Float64),
    ])
}

/// Schema of the vendor lookup table (extra CSV columns are ignored at ingestion).
pub fn vendor_lookup_schema() -> Schema {
    Schema::new(vec![
        Field::new(columns::VENDOR_ID, DataType::Utf8),
        Field::new(columns::NAME, DataType::Utf8),
    ])
}

/// Pipeline inputs: the unified trips (all yearly extracts) and the vendor lookup.
#[derive(Debug, Clone)]
pub struct TripInputs {
    pub trips: DataSet,
    pub vendor_lookup: DataSet,
}

/// The three reports of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct TripReports {
    /// `vendor_id, vendor_name, year, tot_trip_distance, tot_trips`, one row per year.
    pub top_vendors: DataSet,
    /// `year, week, tot_trips`, one row per year.
    pub top_week: DataSet,
    /// `vendor_id, vendor_name, year, week, vendor_tot_trips_in_week`, at most one row per year.
    pub vendor_trips_in_top_week: DataSet,
}

impl TripReports {
    /// Reports paired with their table names, in publishing order.
    pub fn tables(&self) -> [(&'static str, &DataSet); 3] {
        [
            (TOP_VENDORS, &self.top_vendors),
            (TOP_WEEK, &self.top_week),
            (VENDOR_TRIPS_IN_TOP_WEEK, &self.vendor_trips_in_top_week),
        ]
    }
}

/// Compute all three reports from the full input set.
///
/// Both inputs must carry the columns the reports read. Empty inputs are not an error: they are
/// logged and produce empty reports.
pub fn run_pipeline(engine: &ExecutionEngine, inputs: &TripInputs) -> PipelineResult<TripReports> {
    inputs.trips.schema.require_all(&[
        columns::VENDOR_ID,
        columns::PICKUP_DATETIME,
        columns::TRIP_DISTANCE,
    ])?;
    inputs
        .vendor_lookup
        .schema
        .require_all(&[columns::VENDOR_ID, columns::NAME])?;
    if inputs.trips.is_empty() {
        tracing::warn!("trip input has zero rows; reports will be empty");
    }
    if inputs.vendor_lookup.is_empty() {
        tracing::warn!("vendor lookup has zero rows; every vendor_name will be null");
    }

    let enriched = engine.run_stage("enrich", || {
        enrich(engine, &inputs.trips, &inputs.vendor_lookup)
    })?;

    let (top_vendors, weekly) = engine.join(
        || engine.run_stage(TOP_VENDORS, || top_vendors(engine, &enriched)),
        || -> ProcessingResult<(DataSet, DataSet)> {
            let by_week = engine.run_stage("trips_by_week", || with_week(engine, &enriched))?;
            let top_week = engine.run_stage(TOP_WEEK, || top_weeks(engine, &by_week))?;
            Ok((by_week, top_week))
        },
    );
    let top_vendors = top_vendors?;
    let (trips_by_week, top_week) = weekly?;

    let vendor_trips_in_top_week = engine.run_stage(VENDOR_TRIPS_IN_TOP_WEEK, || {
        vendor_trips_in_top_week(&trips_by_week, &top_week, &top_vendors)
    })?;

    Ok(TripReports {
        top_vendors,
        top_week,
        vendor_trips_in_top_week,
    })
}

/// Ingest the configured inputs, compute the reports and publish them as CSV.
///
/// Nothing is written unless every step before publishing succeeds.
pub fn run_from_config(config: &ReportConfig) -> PipelineResult<TripReports> {
    let engine = ExecutionEngine::new(ExecutionOptions::from(&config.execution))?
        .with_observer(Arc::new(TracingExecutionObserver));
    let ingestion = IngestionOptions {
        observer: Some(Arc::new(TracingObserver)),
        ..Default::default()
    };

    let vendor_lookup = ingest_from_path(config.vendor_lookup_path(), &vendor_lookup_schema(), &ingestion)?;
    let trips = ingest_glob(&config.trips_glob(), &trips_schema(), &ingestion)?;
    tracing::info!(
        trips = trips.row_count(),
        vendors = vendor_lookup.row_count(),
        "inputs loaded"
    );

    let reports = run_pipeline(&engine, &TripInputs { trips, vendor_lookup })?;
    CsvReportSink::new(&config.output_dir).publish(&reports)?;
    tracing::info!(metrics = %engine.metrics().snapshot(), "report run finished");
    Ok(reports)
}

/// Derive an `Int64` column from `pickup_datetime`; null pickups give null.
pub(crate) fn derive_from_pickup(
    engine: &ExecutionEngine,
    dataset: &DataSet,
    column: &str,
    part: fn(&NaiveDateTime) -> i64,
) -> ProcessingResult<DataSet> {
    let pickup = dataset.schema.require(columns::PICKUP_DATETIME)?;
    let pickup_type = dataset.schema.data_type_at(pickup);
    if pickup_type != DataType::Timestamp {
        return Err(ProcessingError::TypeMismatch {
            message: format!(
                "'{}' must be a timestamp to derive '{column}', found {pickup_type:?}",
                columns::PICKUP_DATETIME
            ),
        });
    }
    engine.with_column_parallel(dataset, Field::new(column, DataType::Int64), move |row| {
        Ok(match &row[pickup] {
            Value::Timestamp(ts) => Value::Int64(part(ts)),
            _ => Value::Null,
        })
    })
}

pub(crate) fn calendar_year(ts: &NaiveDateTime) -> i64 {
    i64::from(ts.year())
}

/// ISO-8601 week number (1–53), independent of the calendar year.
pub(crate) fn iso_week(ts: &NaiveDateTime) -> i64 {
    i64::from(ts.iso_week().week())
}

/// Rank within `partition_keys` by `order_by` and keep only rank 1, without the rank column.
pub(crate) fn first_per_partition(
    engine: &ExecutionEngine,
    dataset: &DataSet,
    partition_keys: &[&str],
    order_by: &[SortKey],
) -> ProcessingResult<DataSet> {
    let ranked = rank_within_partition(dataset, partition_keys, order_by, columns::RANK)?;
    let rank_idx = ranked.schema.require(columns::RANK)?;
    let winners = engine.filter_parallel(&ranked, |row| row[rank_idx] == Value::Int64(1));
    drop_columns(&winners, &[columns::RANK])
}


#[cfg(test)]
mod tests {
    use super::test_support::{at, engine, lookup, text, trip, trips};
    use super::{run_pipeline, TripInputs};
    use crate::types::Value;

    #[test]
    fn end_to_end_single_week() {
        // 2009-01-15 is in ISO week 3.
        let mut rows = Vec::new();
        rows.extend((0..5).map(|_| trip(Some("X"), at(2009, 1, 15), 4.0)));
        rows.extend((0..8).map(|_| trip(Some("Y"), at(2009, 1, 14), 3.75)));
        let inputs = TripInputs {
            trips: trips(rows),
            vendor_lookup: lookup(&[("X", "Xavier Cabs"), ("Y", "Yellow Co")]),
        };

        let reports = run_pipeline(&engine(), &inputs).unwrap();

        assert_eq!(
            reports.top_vendors.rows,
            vec![vec![
                text("Y"),
                text("Yellow Co"),
                Value::Int64(2009),
                Value::Float64(30.0),
                Value::Int64(8),
            ]]
        );
        assert_eq!(
            reports.top_week.rows,
            vec![vec![Value::Int64(2009), Value::Int64(3), Value::Int64(13)]]
        );
        assert_eq!(
            reports.vendor_trips_in_top_week.rows,
            vec![vec![
                text("Y"),
                text("Yellow Co"),
                Value::Int64(2009),
                Value::Int64(3),
                Value::Int64(8),
            ]]
        );
    }

    #[test]
    fn empty_trips_give_empty_reports_with_headers() {
        let inputs = TripInputs {
            trips: trips(Vec::new()),
            vendor_lookup: lookup(&[("X", "Xavier Cabs")]),
        };
        let reports = run_pipeline(&engine(), &inputs).unwrap();
        for (_, table) in reports.tables() {
            assert!(table.is_empty());
        }
        assert_eq!(
            reports.top_vendors.schema.field_names().collect::<Vec<_>>(),
            vec!["vendor_id", "vendor_name", "year", "tot_trip_distance", "tot_trips"]
        );
        assert_eq!(
            reports.vendor_trips_in_top_week.schema.field_names().collect::<Vec<_>>(),
            vec!["vendor_id", "vendor_name", "year", "week", "vendor_tot_trips_in_week"]
        );
    }

    #[test]
    fn running_twice_gives_identical_reports() {
        let rows = vec![
            trip(Some("A"), at(2010, 3, 1), 1.0),
            trip(Some("B"), at(2010, 3, 2), 2.0),
            trip(Some("A"), at(2011, 6, 1), 3.0),
            trip(None, at(2011, 6, 2), 4.0),
        ];
        let inputs = TripInputs {
            trips: trips(rows),
            vendor_lookup: lookup(&[("A", "Alpha"), ("B", "Beta")]),
        };
        let engine = engine();
        assert_eq!(
            run_pipeline(&engine, &inputs).unwrap(),
            run_pipeline(&engine, &inputs).unwrap()
        );
    }

    #[test]
    fn missing_trip_column_aborts_the_run() {
        let inputs = TripInputs {
            trips: crate::processing::drop_columns(&trips(Vec::new()), &["pickup_datetime"]).unwrap(),
            vendor_lookup: lookup(&[]),
        };
        let err = run_pipeline(&engine(), &inputs).unwrap_err();
        assert!(err.to_string().contains("pickup_datetime"));
    }
}
