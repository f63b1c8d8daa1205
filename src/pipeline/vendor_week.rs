//! Trips made by each year's top vendor during that year's busiest week.

use crate::error::ProcessingResult;
use crate::processing::{group_by_aggregate, join, select, Aggregation, JoinType};
use crate::types::DataSet;

use super::columns::{VENDOR_ID, VENDOR_NAME, VENDOR_TOT_TRIPS_IN_WEEK, WEEK, YEAR};

/// `vendor_id, vendor_name, year, week, vendor_tot_trips_in_week`, at most one row per year.
///
/// A year whose top vendor made no trips in the busiest week contributes no row.
pub fn vendor_trips_in_top_week(
    trips_by_week: &DataSet,
    top_week: &DataSet,
    top_vendors: &DataSet,
) -> ProcessingResult<DataSet> {
    let in_top_week = join(trips_by_week, top_week, &[YEAR, WEEK], JoinType::Inner)?;
    let winners = select(top_vendors, &[VENDOR_ID, YEAR])?;
    let by_top_vendor = join(&in_top_week, &winners, &[VENDOR_ID, YEAR], JoinType::Inner)?;
    group_by_aggregate(
        &by_top_vendor,
        &[VENDOR_ID, VENDOR_NAME, YEAR, WEEK],
        &[Aggregation::count(VENDOR_TOT_TRIPS_IN_WEEK)],
    )
}

#[cfg(test)]
mod tests {
    use super::vendor_trips_in_top_week;
    use crate::pipeline::test_support::{at, engine, lookup, text, trip, trips};
    use crate::pipeline::{enrich, top_vendors, top_weeks, with_week};
    use crate::types::{DataSet, Value};

    fn run(rows: Vec<Vec<Value>>) -> DataSet {
        let engine = engine();
        let enriched = enrich(&engine, &trips(rows), &lookup(&[("A", "Alpha"), ("B", "Beta")])).unwrap();
        let by_week = with_week(&engine, &enriched).unwrap();
        let weeks = top_weeks(&engine, &by_week).unwrap();
        let vendors = top_vendors(&engine, &enriched).unwrap();
        vendor_trips_in_top_week(&by_week, &weeks, &vendors).unwrap()
    }

    #[test]
    fn counts_only_the_top_vendor_in_the_top_week() {
        // 2015-06-01 is the Monday of ISO week 23.
        let mut rows = Vec::new();
        rows.extend((0..3).map(|_| trip(Some("A"), at(2015, 6, 1), 1.0)));
        rows.extend((0..4).map(|_| trip(Some("B"), at(2015, 6, 2), 1.0)));
        rows.extend((0..5).map(|_| trip(Some("A"), at(2015, 2, 2), 1.0)));

        let out = run(rows);

        assert_eq!(
            out.rows,
            vec![vec![
                text("A"),
                text("Alpha"),
                Value::Int64(2015),
                Value::Int64(23),
                Value::Int64(3),
            ]]
        );
    }

    #[test]
    fn top_vendor_absent_from_top_week_gives_no_row() {
        let mut rows = Vec::new();
        rows.extend((0..6).map(|_| trip(Some("A"), at(2016, 3, 1), 1.0)));
        rows.extend((0..4).map(|_| trip(Some("B"), at(2016, 8, 2), 1.0)));
        rows.extend((0..3).map(|_| trip(Some("B"), at(2016, 10, 4), 1.0)));
        rows.extend((0..2).map(|_| trip(Some("B"), at(2017, 1, 10), 1.0)));

        let out = run(rows);

        // 2016: B has the most trips (7) but the busiest week holds only A's 6.
        assert_eq!(out.column("year").unwrap(), vec![&Value::Int64(2017)]);
    }
}
