//! Window ranking: row numbers within partitions.

use std::collections::HashMap;

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, DataType, Field, Value};

use super::key::{row_key, RowKey};
use super::sort::{RowComparator, SortKey};

/// Append an `Int64` column `rank_column` numbering rows 1, 2, 3… within each partition.
///
/// Rows sharing the `partition_keys` values form a partition (null is an ordinary value). Inside a
/// partition rows are ordered by `order_by`; rows that compare equal on every key still get
/// distinct consecutive numbers, in input order. The output keeps the input row order.
pub fn rank_within_partition<S: AsRef<str>>(
    dataset: &DataSet,
    partition_keys: &[S],
    order_by: &[SortKey],
    rank_column: &str,
) -> ProcessingResult<DataSet> {
    if dataset.schema.index_of(rank_column).is_some() {
        return Err(ProcessingError::Schema {
            message: format!("rank column '{rank_column}' already exists"),
        });
    }
    let partition_idxs = dataset.schema.require_all(partition_keys)?;
    let comparator = RowComparator::new(&dataset.schema, order_by)?;

    let mut partition_of: HashMap<RowKey, usize> = HashMap::new();
    let mut partitions: Vec<Vec<usize>> = Vec::new();
    for (i, row) in dataset.rows.iter().enumerate() {
        let p = *partition_of
            .entry(row_key(row, &partition_idxs))
            .or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
        partitions[p].push(i);
    }

    let mut ranks = vec![0_i64; dataset.row_count()];
    for members in &mut partitions {
        comparator.sort_indexes(&dataset.rows, members)?;
        for (pos, &row_idx) in members.iter().enumerate() {
            ranks[row_idx] = pos as i64 + 1;
        }
    }

    let mut schema = dataset.schema.clone();
    schema.fields.push(Field::new(rank_column, DataType::Int64));
    let rows = dataset
        .rows
        .iter()
        .zip(ranks)
        .map(|(row, rank)| {
            let mut out = row.clone();
            out.push(Value::Int64(rank));
            out
        })
        .collect();
    Ok(DataSet::new(schema, rows))
}

#[cfg(test)]
mod tests {
    use super::rank_within_partition;
    use crate::error::ProcessingError;
    use crate::processing::SortKey;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn vendor_years() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("vendor_name", DataType::Utf8),
            Field::new("year", DataType::Int64),
            Field::new("tot_trip_distance", DataType::Float64),
            Field::new("tot_trips", DataType::Int64),
        ]);
        let row = |n: &str, y: i64, d: f64, t: i64| {
            vec![Value::Utf8(n.into()), Value::Int64(y), Value::Float64(d), Value::Int64(t)]
        };
        DataSet::new(
            schema,
            vec![
                row("A", 2010, 50.0, 10),
                row("B", 2010, 75.0, 10),
                row("C", 2009, 10.0, 3),
                row("D", 2009, 10.0, 3),
                row("E", 2010, 99.0, 9),
            ],
        )
    }

    fn ranks(ds: &DataSet) -> Vec<i64> {
        ds.column("rank")
            .unwrap()
            .into_iter()
            .map(|v| match v {
                Value::Int64(r) => *r,
                other => panic!("unexpected rank {other:?}"),
            })
            .collect()
    }

    #[test]
    fn tie_on_trips_goes_to_greater_distance() {
        let out = rank_within_partition(
            &vendor_years(),
            &["year"],
            &[
                SortKey::desc("tot_trips"),
                SortKey::desc("tot_trip_distance"),
                SortKey::asc("vendor_name"),
            ],
            "rank",
        )
        .unwrap();
        // Input order is preserved; B beats A on distance, E has fewer trips.
        assert_eq!(ranks(&out), vec![2, 1, 1, 2, 3]);
    }

    #[test]
    fn full_ties_get_distinct_consecutive_ranks() {
        let out = rank_within_partition(&vendor_years(), &["year"], &[SortKey::desc("tot_trips")], "rank")
            .unwrap();
        let r = ranks(&out);
        assert_eq!(r[2], 1);
        assert_eq!(r[3], 2);
        assert_eq!(r[0], 1);
        assert_eq!(r[1], 2);
        assert_eq!(r.iter().filter(|&&x| x == 1).count(), 2);
    }

    #[test]
    fn rank_column_collision_is_schema_error() {
        let err = rank_within_partition(&vendor_years(), &["year"], &[], "year").unwrap_err();
        assert!(matches!(err, ProcessingError::Schema { .. }));
    }

    #[test]
    fn empty_dataset_ranks_to_empty() {
        let empty = DataSet::empty(vendor_years().schema);
        let out = rank_within_partition(&empty, &["year"], &[SortKey::desc("tot_trips")], "rank").unwrap();
        assert!(out.is_empty());
        assert_eq!(out.schema.index_of("rank"), Some(4));
    }
}
