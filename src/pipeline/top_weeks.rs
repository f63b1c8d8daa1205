//! Busiest ISO week per year.

use crate::error::ProcessingResult;
use crate::execution::ExecutionEngine;
use crate::processing::{group_by_aggregate, order_by, Aggregation, SortKey};
use crate::types::DataSet;

use super::columns::{TOT_TRIPS, WEEK, YEAR};
use super::{derive_from_pickup, first_per_partition, iso_week};

/// Append the ISO `week` of `pickup_datetime` to the enriched trips.
///
/// `week` is computed independently of `year`: a trip on 2010-01-01 is in year 2010, week 53.
pub fn with_week(engine: &ExecutionEngine, enriched: &DataSet) -> ProcessingResult<DataSet> {
    derive_from_pickup(engine, enriched, WEEK, iso_week)
}

/// One row per year in `trips_by_week`: `year, week, tot_trips`, ordered by year.
///
/// When several weeks share the highest count, the earliest week wins.
pub fn top_weeks(engine: &ExecutionEngine, trips_by_week: &DataSet) -> ProcessingResult<DataSet> {
    let per_week = group_by_aggregate(trips_by_week, &[YEAR, WEEK], &[Aggregation::count(TOT_TRIPS)])?;
    let ordered = order_by(&per_week, &[SortKey::asc(YEAR), SortKey::asc(WEEK)])?;
    first_per_partition(engine, &ordered, &[YEAR], &[SortKey::desc(TOT_TRIPS), SortKey::asc(WEEK)])
}
