//! `taxi-trip-reports` turns yearly NYC taxi trip extracts and a vendor lookup table into three
//! per-year reports:
//!
//! - **top vendors**: the vendor with the most trips each year (ties: longest total distance, then
//!   alphabetically first name)
//! - **top week**: the ISO week with the most trips each year (ties: earliest week)
//! - **vendor trips in top week**: how many trips that year's top vendor made in that week
//!
//! Inputs are ingested into a schema-first, in-memory [`types::DataSet`]; reports are computed
//! with the relational operations in [`processing`], driven by [`pipeline::run_pipeline`] on an
//! explicit [`execution::ExecutionEngine`], and published by [`sink::CsvReportSink`].
//!
//! ## What you can ingest
//!
//! - **CSV**: `.csv`, with a header row (columns matched by name, extras ignored)
//! - **JSON**: `.json` (array-of-objects or single object), `.ndjson` / `.jsonl`
//!
//! Supported logical types are [`types::DataType::Int64`], [`types::DataType::Float64`],
//! [`types::DataType::Bool`], [`types::DataType::Utf8`] and [`types::DataType::Timestamp`].
//! Across formats, empty cells / empty strings / explicit JSON `null` map to [`types::Value::Null`].
//!
//! ## Quick example: run the reports
//!
//! ```no_run
//! use taxi_trip_reports::config::ReportConfig;
//! use taxi_trip_reports::pipeline::run_from_config;
//!
//! # fn main() -> Result<(), taxi_trip_reports::PipelineError> {
//! let config = ReportConfig::load(None)?;
//! let reports = run_from_config(&config)?;
//! println!("years={}", reports.top_vendors.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Processing example
//!
//! ```rust
//! use taxi_trip_reports::processing::{group_by_aggregate, order_by, Aggregation, SortKey};
//! use taxi_trip_reports::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("vendor_id", DataType::Utf8),
//!     Field::new("trip_distance", DataType::Float64),
//! ]);
//! let ds = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Utf8("VTS".into()), Value::Float64(1.04)],
//!         vec![Value::Utf8("CMT".into()), Value::Float64(2.0)],
//!         vec![Value::Utf8("VTS".into()), Value::Float64(1.01)],
//!         vec![Value::Utf8("CMT".into()), Value::Null],
//!     ],
//! );
//!
//! let totals = group_by_aggregate(
//!     &ds,
//!     &["vendor_id"],
//!     &[Aggregation::sum("trip_distance", "tot_trip_distance").rounded(1)],
//! )
//! .unwrap();
//! let totals = order_by(&totals, &[SortKey::desc("tot_trip_distance")]).unwrap();
//!
//! assert_eq!(
//!     totals.column("vendor_id").unwrap(),
//!     vec![&Value::Utf8("VTS".into()), &Value::Utf8("CMT".into())]
//! );
//! assert_eq!(totals.rows[0][1], Value::Float64(2.1));
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: CSV/JSON ingestion, glob union of yearly extracts, observers
//! - [`types`]: schema + in-memory dataset types
//! - [`processing`]: projection, joins, group-by, sorting, ranking, union
//! - [`execution`]: worker pool, chunked parallel operators, throttling, metrics
//! - [`pipeline`]: the report stages and their driver
//! - [`sink`]: CSV output with all-or-nothing publishing
//! - [`config`]: file + environment configuration
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod sink;
pub mod types;

pub use error::{
    ExecutionError, IngestionError, IngestionResult, PipelineError, PipelineResult, ProcessingError,
    ProcessingResult, SinkError, SinkResult,
};
