//! Group-by aggregation.

use std::collections::{HashMap, HashSet};

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::key::{row_key, RowKey};
use super::reduce::{check_reducible, fold_column, ReduceOp};

/// One aggregate column of a [`group_by_aggregate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// Reduction applied to every group.
    pub op: ReduceOp,
    /// Input column. `None` only for `count(*)`.
    pub column: Option<String>,
    /// Output column name.
    pub alias: String,
    /// Round Float64 results to this many decimal places.
    pub decimals: Option<u32>,
}

impl Aggregation {
    /// `count(*)`: number of rows in the group, nulls included.
    pub fn count(alias: impl Into<String>) -> Self {
        Self::new(ReduceOp::Count, None, alias)
    }

    /// Sum of a numeric column, ignoring nulls.
    pub fn sum(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(ReduceOp::Sum, Some(column.into()), alias)
    }

    /// Round the aggregate to `decimals` places (half away from zero).
    pub fn rounded(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    fn new(op: ReduceOp, column: Option<String>, alias: impl Into<String>) -> Self {
        Self {
            op,
            column,
            alias: alias.into(),
            decimals: None,
        }
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_half_away(v: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (v * factor).round() / factor
}

struct ResolvedAggregation<'a> {
    agg: &'a Aggregation,
    idx: usize,
    input_type: DataType,
}

/// Partition rows by the `keys` columns and compute `aggregations` per partition.
///
/// Null is an ordinary group value. Produces exactly one row per distinct key combination present
/// in the input, in order of first appearance; an empty input yields an empty output. The output
/// schema is the key fields followed by one field per aggregation.
pub fn group_by_aggregate<S: AsRef<str>>(
    dataset: &DataSet,
    keys: &[S],
    aggregations: &[Aggregation],
) -> ProcessingResult<DataSet> {
    let key_idxs = dataset.schema.require_all(keys)?;

    let mut fields: Vec<Field> = key_idxs
        .iter()
        .map(|&i| dataset.schema.fields[i].clone())
        .collect();
    let mut resolved = Vec::with_capacity(aggregations.len());
    for agg in aggregations {
        let (idx, input_type) = match (&agg.column, agg.op) {
            (Some(column), op) => {
                let idx = dataset.schema.require(column)?;
                let input_type = dataset.schema.data_type_at(idx);
                check_reducible(column, input_type, op)?;
                (idx, input_type)
            }
            (None, ReduceOp::Count) => (0, DataType::Int64),
            (None, op) => {
                return Err(ProcessingError::Schema {
                    message: format!("aggregation '{}' needs an input column for {op:?}", agg.alias),
                });
            }
        };
        fields.push(Field::new(agg.alias.clone(), agg.op.output_type(input_type)));
        resolved.push(ResolvedAggregation {
            agg,
            idx,
            input_type,
        });
    }

    let mut names = HashSet::new();
    for f in &fields {
        if !names.insert(f.name.as_str()) {
            return Err(ProcessingError::Schema {
                message: format!("duplicate output column '{}' in aggregation", f.name),
            });
        }
    }

    let mut group_of: HashMap<RowKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, row) in dataset.rows.iter().enumerate() {
        let g = *group_of.entry(row_key(row, &key_idxs)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(i);
    }

    let rows = groups
        .iter()
        .map(|members| {
            let first = &dataset.rows[members[0]];
            let mut out: Vec<Value> = key_idxs.iter().map(|&i| first[i].clone()).collect();
            for r in &resolved {
                let member_rows = members.iter().map(|&m| dataset.rows[m].as_slice());
                let value = fold_column(member_rows, r.idx, r.input_type, r.agg.op);
                out.push(match (value, r.agg.decimals) {
                    (Value::Float64(v), Some(d)) => Value::Float64(round_half_away(v, d)),
                    (v, _) => v,
                });
            }
            out
        })
        .collect();

    Ok(DataSet::new(Schema::new(fields), rows))
}
