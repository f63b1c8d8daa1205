//! Row-wise union and de-duplication.

use std::collections::HashSet;

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::DataSet;

use super::key::row_key;

/// Concatenate datasets that share one schema, keeping their order.
pub fn concat(datasets: Vec<DataSet>) -> ProcessingResult<DataSet> {
    let mut iter = datasets.into_iter();
    let mut out = iter.next().ok_or_else(|| ProcessingError::Schema {
        message: "concat needs at least one dataset".to_string(),
    })?;
    for (i, ds) in iter.enumerate() {
        if ds.schema != out.schema {
            return Err(ProcessingError::Schema {
                message: format!(
                    "dataset {} has columns {:?}, expected {:?}",
                    i + 1,
                    ds.schema.field_names().collect::<Vec<_>>(),
                    out.schema.field_names().collect::<Vec<_>>()
                ),
            });
        }
        out.rows.extend(ds.rows);
    }
    Ok(out)
}

/// Keep the first row for each distinct value of the `keys` columns.
pub fn distinct_on<S: AsRef<str>>(dataset: &DataSet, keys: &[S]) -> ProcessingResult<DataSet> {
    let idxs = dataset.schema.require_all(keys)?;
    let mut seen = HashSet::new();
    Ok(dataset.filter_rows(|row| seen.insert(row_key(row, &idxs))))
}
