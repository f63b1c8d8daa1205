//! Top vendor per year: the vendor with the most trips, then the longest total distance, then the
//! alphabetically first name.

use crate::error::ProcessingResult;
use crate::execution::ExecutionEngine;
use crate::processing::{group_by_aggregate, order_by, Aggregation, SortKey};
use crate::types::DataSet;

use super::columns::{TOT_TRIPS, TOT_TRIP_DISTANCE, TRIP_DISTANCE, VENDOR_ID, VENDOR_NAME, YEAR};
use super::first_per_partition;

/// One row per year present in `enriched`:
/// `vendor_id, vendor_name, year, tot_trip_distance, tot_trips`.
///
/// Rows are ordered by vendor name, then year.
pub fn top_vendors(engine: &ExecutionEngine, enriched: &DataSet) -> ProcessingResult<DataSet> {
    let per_vendor = group_by_aggregate(
        enriched,
        &[VENDOR_ID, VENDOR_NAME, YEAR],
        &[
            Aggregation::sum(TRIP_DISTANCE, TOT_TRIP_DISTANCE).rounded(1),
            Aggregation::count(TOT_TRIPS),
        ],
    )?;
    let ordered = order_by(
        &per_vendor,
        &[
            SortKey::asc(VENDOR_NAME),
            SortKey::asc(YEAR),
            SortKey::desc(TOT_TRIP_DISTANCE),
        ],
    )?;
    first_per_partition(
        engine,
        &ordered,
        &[YEAR],
        &[
            SortKey::desc(TOT_TRIPS),
            SortKey::desc(TOT_TRIP_DISTANCE),
            SortKey::asc(VENDOR_NAME),
        ],
    )
}
