//! Hash equi-join of two [`DataSet`]s.

use std::collections::{HashMap, HashSet};

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, Schema, Value};

use super::key::{join_key, RowKey};

/// Which rows a [`join`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Only left rows with at least one match.
    Inner,
    /// Every left row; unmatched rows get nulls for the right-side columns.
    Left,
}

/// Equi-join `left` and `right` on `keys` (columns present on both sides with the same type).
///
/// The output schema is every left column followed by the right columns that are not join keys.
/// Null keys never match. Output rows follow left row order, then right row order among the
/// matches of one left row.
pub fn join<S: AsRef<str>>(
    left: &DataSet,
    right: &DataSet,
    keys: &[S],
    how: JoinType,
) -> ProcessingResult<DataSet> {
    if keys.is_empty() {
        return Err(ProcessingError::Schema {
            message: "join requires at least one key column".to_string(),
        });
    }
    let left_keys = left.schema.require_all(keys)?;
    let right_keys = right.schema.require_all(keys)?;

    for ((name, &l), &r) in keys.iter().zip(&left_keys).zip(&right_keys) {
        let (lt, rt) = (left.schema.data_type_at(l), right.schema.data_type_at(r));
        if lt != rt {
            return Err(ProcessingError::TypeMismatch {
                message: format!(
                    "join key '{}' is {lt:?} on the left but {rt:?} on the right",
                    name.as_ref()
                ),
            });
        }
    }

    let key_set: HashSet<usize> = right_keys.iter().copied().collect();
    let payload: Vec<usize> = (0..right.schema.fields.len())
        .filter(|i| !key_set.contains(i))
        .collect();

    let mut fields = left.schema.fields.clone();
    for &i in &payload {
        let field = &right.schema.fields[i];
        if left.schema.index_of(&field.name).is_some() {
            return Err(ProcessingError::Schema {
                message: format!("join would duplicate column '{}'", field.name),
            });
        }
        fields.push(field.clone());
    }

    let mut index: HashMap<RowKey, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows.iter().enumerate() {
        if let Some(k) = join_key(row, &right_keys) {
            index.entry(k).or_default().push(i);
        }
    }

    let mut rows = Vec::with_capacity(left.row_count());
    for row in &left.rows {
        let matches = join_key(row, &left_keys).and_then(|k| index.get(&k));
        match (matches, how) {
            (Some(ms), _) => {
                for &m in ms {
                    let mut out = row.clone();
                    out.extend(payload.iter().map(|&i| right.rows[m][i].clone()));
                    rows.push(out);
                }
            }
            (None, JoinType::Left) => {
                let mut out = row.clone();
                out.extend(std::iter::repeat_n(Value::Null, payload.len()));
                rows.push(out);
            }
            (None, JoinType::Inner) => {}
        }
    }

    Ok(DataSet::new(Schema::new(fields), rows))
}
