//! Column-level operations: [`select`], [`drop_columns`], [`rename`] and [`with_column`].

use std::collections::HashSet;

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{DataSet, Field, Schema, Value};

/// Project to the named columns, in the given order.
pub fn select<S: AsRef<str>>(dataset: &DataSet, columns: &[S]) -> ProcessingResult<DataSet> {
    let idxs = dataset.schema.require_all(columns)?;
    let mut seen = HashSet::new();
    for c in columns {
        if !seen.insert(c.as_ref()) {
            return Err(ProcessingError::Schema {
                message: format!("column '{}' selected twice", c.as_ref()),
            });
        }
    }
    Ok(project(dataset, &idxs))
}

/// Remove the named columns.
pub fn drop_columns<S: AsRef<str>>(dataset: &DataSet, columns: &[S]) -> ProcessingResult<DataSet> {
    let dropped: HashSet<usize> = dataset.schema.require_all(columns)?.into_iter().collect();
    let keep: Vec<usize> = (0..dataset.schema.fields.len())
        .filter(|i| !dropped.contains(i))
        .collect();
    Ok(project(dataset, &keep))
}

fn project(dataset: &DataSet, idxs: &[usize]) -> DataSet {
    let schema = Schema::new(idxs.iter().map(|&i| dataset.schema.fields[i].clone()).collect());
    let rows = dataset
        .rows
        .iter()
        .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
        .collect();
    DataSet::new(schema, rows)
}

/// Rename column `old` to `new`. Values are untouched.
pub fn rename(dataset: &DataSet, old: &str, new: &str) -> ProcessingResult<DataSet> {
    let idx = dataset.schema.require(old)?;
    if old != new && dataset.schema.index_of(new).is_some() {
        return Err(ProcessingError::Schema {
            message: format!("cannot rename '{old}' to '{new}': column already exists"),
        });
    }
    let mut schema = dataset.schema.clone();
    schema.fields[idx].name = new.to_string();
    Ok(DataSet::new(schema, dataset.rows.clone()))
}

/// Add (or replace) `field`, computing its value row by row with `expr`.
///
/// A replaced column keeps its position; a new column is appended. Every computed value must be
/// null or of `field.data_type`.
pub fn with_column<F>(dataset: &DataSet, field: Field, mut expr: F) -> ProcessingResult<DataSet>
where
    F: FnMut(&[Value]) -> ProcessingResult<Value>,
{
    let derivation = ColumnDerivation::new(&dataset.schema, field);
    let rows = dataset
        .rows
        .iter()
        .map(|row| derivation.apply(row, expr(row)?))
        .collect::<ProcessingResult<Vec<_>>>()?;
    Ok(DataSet::new(derivation.schema.clone(), rows))
}

/// Output schema and row builder for a derived column, shared by the sequential and the
/// parallel ([`crate::execution::ExecutionEngine::with_column_parallel`]) versions.
#[derive(Debug, Clone)]
pub(crate) struct ColumnDerivation {
    pub(crate) schema: Schema,
    field: Field,
    replace: Option<usize>,
}

impl ColumnDerivation {
    pub(crate) fn new(input: &Schema, field: Field) -> Self {
        let replace = input.index_of(&field.name);
        let mut schema = input.clone();
        match replace {
            Some(i) => schema.fields[i] = field.clone(),
            None => schema.fields.push(field.clone()),
        }
        Self {
            schema,
            field,
            replace,
        }
    }

    pub(crate) fn apply(&self, row: &[Value], value: Value) -> ProcessingResult<Vec<Value>> {
        if !value.conforms_to(self.field.data_type) {
            return Err(ProcessingError::TypeMismatch {
                message: format!(
                    "derived column '{}' declared {:?} but produced {value:?}",
                    self.field.name, self.field.data_type
                ),
            });
        }
        let mut out = row.to_vec();
        match self.replace {
            Some(i) => out[i] = value,
            None => out.push(value),
        }
        Ok(out)
    }
}
