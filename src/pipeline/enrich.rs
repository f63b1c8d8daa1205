//! Vendor enrichment: attach `vendor_name` and the pickup `year` to every trip.

use crate::error::ProcessingResult;
use crate::execution::ExecutionEngine;
use crate::processing::{distinct_on, join, rename, select, JoinType};
use crate::types::DataSet;

use super::columns::{NAME, VENDOR_ID, VENDOR_NAME, YEAR};
use super::{calendar_year, derive_from_pickup};

/// Left-join trips with the vendor lookup and derive `year` from `pickup_datetime`.
///
/// The output has one row per input trip, in input order: the trip columns, then `vendor_name`
/// (null when the vendor is unknown), then `year`. A lookup that lists a `vendor_id` more than
/// once keeps the first entry.
pub fn enrich(engine: &ExecutionEngine, trips: &DataSet, vendor_lookup: &DataSet) -> ProcessingResult<DataSet> {
    let names = rename(&select(vendor_lookup, &[VENDOR_ID, NAME])?, NAME, VENDOR_NAME)?;
    let unique = distinct_on(&names, &[VENDOR_ID])?;
    if unique.row_count() < names.row_count() {
        tracing::warn!(
            duplicates = names.row_count() - unique.row_count(),
            "vendor lookup repeats vendor ids; keeping the first name for each"
        );
    }

    let joined = join(trips, &unique, &[VENDOR_ID], JoinType::Left)?;
    derive_from_pickup(engine, &joined, YEAR, calendar_year)
}
