//! In-memory dataset transformations.
//!
//! The processing layer operates on [`crate::types::DataSet`] values produced by ingestion. Every
//! operation is a pure function: it reads its inputs and returns a new dataset. Operations that
//! reference columns fail with [`crate::error::ProcessingError::Schema`] when a column is missing
//! and with [`crate::error::ProcessingError::TypeMismatch`] when column types are incompatible.
//!
//! Implemented:
//!
//! - [`select()`], [`drop_columns()`], [`rename()`], [`with_column()`]: column-level changes
//! - [`join()`]: inner/left hash equi-join
//! - [`group_by_aggregate()`]: count and (optionally rounded) sum per distinct key
//! - [`rank_within_partition()`]: row numbers within partitions by a multi-key ordering
//! - [`order_by()`]: stable multi-key sort
//! - [`concat()`], [`distinct_on()`]: union and de-duplication
//!
//! ## Example: ranking vendors within a year
//!
//! ```rust
//! use taxi_trip_reports::processing::{group_by_aggregate, rank_within_partition, Aggregation, SortKey};
//! use taxi_trip_reports::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("vendor_id", DataType::Utf8),
//!     Field::new("year", DataType::Int64),
//!     Field::new("trip_distance", DataType::Float64),
//! ]);
//! let trips = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Utf8("CMT".into()), Value::Int64(2009), Value::Float64(2.5)],
//!         vec![Value::Utf8("VTS".into()), Value::Int64(2009), Value::Float64(1.0)],
//!         vec![Value::Utf8("VTS".into()), Value::Int64(2009), Value::Float64(0.5)],
//!     ],
//! );
//!
//! let per_vendor = group_by_aggregate(
//!     &trips,
//!     &["vendor_id", "year"],
//!     &[Aggregation::count("tot_trips")],
//! )
//! .unwrap();
//! let ranked =
//!     rank_within_partition(&per_vendor, &["year"], &[SortKey::desc("tot_trips")], "rank").unwrap();
//!
//! assert_eq!(
//!     ranked.column("rank").unwrap(),
//!     vec![&Value::Int64(2), &Value::Int64(1)]
//! );
//! ```

pub mod concat;
pub mod group;
pub mod join;
mod key;
pub mod project;
pub mod rank;
pub mod reduce;
pub mod sort;

pub use concat::{concat, distinct_on};
pub use group::{group_by_aggregate, round_half_away, Aggregation};
pub use join::{join, JoinType};
pub use project::{drop_columns, rename, select, with_column};
pub use rank::rank_within_partition;
pub use reduce::ReduceOp;
pub use sort::{order_by, SortDirection, SortKey};

pub(crate) use project::ColumnDerivation;
