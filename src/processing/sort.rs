//! Multi-key ordering: [`order_by`] and the row comparator shared with ranking.

use std::cmp::Ordering;

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, Schema, Value};

/// Sort direction of a [`SortKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first; nulls sort before every value.
    Ascending,
    /// Largest first; nulls sort after every value.
    Descending,
}

/// One column of a multi-key ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Column to compare.
    pub column: String,
    /// Direction for this column.
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending key on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending key on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Compares rows of one schema by a resolved list of sort keys.
pub(crate) struct RowComparator {
    keys: Vec<(usize, SortDirection, String)>,
}

impl RowComparator {
    pub(crate) fn new(schema: &Schema, keys: &[SortKey]) -> ProcessingResult<Self> {
        let keys = keys
            .iter()
            .map(|k| Ok((schema.require(&k.column)?, k.direction, k.column.clone())))
            .collect::<ProcessingResult<Vec<_>>>()?;
        Ok(Self { keys })
    }

    pub(crate) fn compare(&self, a: &[Value], b: &[Value]) -> ProcessingResult<Ordering> {
        for (idx, direction, column) in &self.keys {
            let ord = compare_values(&a[*idx], &b[*idx], *direction, column)?;
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }

    /// Stable sort of `idxs` (row indexes into `rows`).
    pub(crate) fn sort_indexes(&self, rows: &[Vec<Value>], idxs: &mut [usize]) -> ProcessingResult<()> {
        let mut failure = None;
        idxs.sort_by(|&a, &b| match self.compare(&rows[a], &rows[b]) {
            Ok(ord) => ord,
            Err(e) => {
                failure.get_or_insert(e);
                Ordering::Equal
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn compare_values(
    a: &Value,
    b: &Value,
    direction: SortDirection,
    column: &str,
) -> ProcessingResult<Ordering> {
    let ord = match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => match direction {
            SortDirection::Ascending => Ordering::Less,
            SortDirection::Descending => Ordering::Greater,
        },
        (false, true) => match direction {
            SortDirection::Ascending => Ordering::Greater,
            SortDirection::Descending => Ordering::Less,
        },
        (false, false) => {
            let ord = a.cmp_same_type(b).ok_or_else(|| ProcessingError::TypeMismatch {
                message: format!("cannot compare {a:?} with {b:?} in column '{column}'"),
            })?;
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
    };
    Ok(ord)
}

/// Stable multi-key sort. Rows equal on every key keep their input order.
pub fn order_by(dataset: &DataSet, keys: &[SortKey]) -> ProcessingResult<DataSet> {
    let comparator = RowComparator::new(&dataset.schema, keys)?;
    let mut idxs: Vec<usize> = (0..dataset.row_count()).collect();
    comparator.sort_indexes(&dataset.rows, &mut idxs)?;
    let rows = idxs.into_iter().map(|i| dataset.rows[i].clone()).collect();
    Ok(DataSet::new(dataset.schema.clone(), rows))
}
