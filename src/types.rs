//! Core data model types.
//!
//! Every source is ingested into an in-memory [`DataSet`] using a user-provided [`Schema`] (a list
//! of typed [`Field`]s). Processing operations never mutate a dataset; they return a new one with a
//! derived schema.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDateTime, Timelike};

use crate::error::{ProcessingError, ProcessingResult};

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Date and time without a zone (UTC wall clock).
    Timestamp,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the index of a field by name, or a schema error naming the available columns.
    pub fn require(&self, name: &str) -> ProcessingResult<usize> {
        self.index_of(name).ok_or_else(|| ProcessingError::Schema {
            message: format!(
                "unknown column '{name}'. columns={:?}",
                self.field_names().collect::<Vec<_>>()
            ),
        })
    }

    /// Resolve several column names to indexes, failing on the first unknown one.
    pub fn require_all<S: AsRef<str>>(&self, names: &[S]) -> ProcessingResult<Vec<usize>> {
        names.iter().map(|n| self.require(n.as_ref())).collect()
    }

    /// Data type of the field at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn data_type_at(&self, idx: usize) -> DataType {
        self.fields[idx].data_type
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Date and time.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Whether this value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The data type of a non-null value.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Int64(_) => Some(DataType::Int64),
            Self::Float64(_) => Some(DataType::Float64),
            Self::Bool(_) => Some(DataType::Bool),
            Self::Utf8(_) => Some(DataType::Utf8),
            Self::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    /// `true` if the value is null or of type `data_type`.
    pub fn conforms_to(&self, data_type: DataType) -> bool {
        self.data_type().is_none_or(|t| t == data_type)
    }

    /// Total order between two non-null values of the same type.
    ///
    /// Returns `None` when the variants differ or either side is null. Floats use
    /// [`f64::total_cmp`].
    pub fn cmp_same_type(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int64(a), Self::Int64(b)) => Some(a.cmp(b)),
            (Self::Float64(a), Self::Float64(b)) => Some(a.total_cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Utf8(a), Self::Utf8(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Renders the value as a CSV cell.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Utf8(s) => f.write_str(s),
            Self::Timestamp(ts) if ts.nanosecond() == 0 => {
                write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S"))
            }
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields. Every row has
/// exactly one value per field and each value conforms to its field's type.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows without validating them.
    ///
    /// Use [`DataSet::try_new`] when the rows come from an untrusted producer.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Create a dataset, checking row arity and value types against the schema.
    pub fn try_new(schema: Schema, rows: Vec<Vec<Value>>) -> ProcessingResult<Self> {
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != schema.fields.len() {
                return Err(ProcessingError::Schema {
                    message: format!(
                        "row {row_idx} has {} values but the schema has {} fields",
                        row.len(),
                        schema.fields.len()
                    ),
                });
            }
            for (field, value) in schema.fields.iter().zip(row) {
                if !value.conforms_to(field.data_type) {
                    return Err(ProcessingError::TypeMismatch {
                        message: format!(
                            "row {row_idx} column '{}' expected {:?}, got {value:?}",
                            field.name, field.data_type
                        ),
                    });
                }
            }
        }
        Ok(Self { schema, rows })
    }

    /// An empty dataset with the given schema.
    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `true` if the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> ProcessingResult<Vec<&Value>> {
        let idx = self.schema.require(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Rows for which `predicate` returns `true`, under the same schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSet, DataType, Field, Schema, Value};
    use chrono::NaiveDate;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("vendor_id", DataType::Utf8),
            Field::new("trip_distance", DataType::Float64),
        ])
    }

    #[test]
    fn require_reports_available_columns() {
        let err = schema().require("year").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("schema error"));
        assert!(msg.contains("unknown column 'year'"));
        assert!(msg.contains("vendor_id"));
    }

    #[test]
    fn try_new_rejects_wrong_arity_and_type() {
        let err = DataSet::try_new(schema(), vec![vec![Value::Utf8("CMT".into())]]).unwrap_err();
        assert!(err.to_string().contains("has 1 values"));

        let err = DataSet::try_new(
            schema(),
            vec![vec![Value::Utf8("CMT".into()), Value::Utf8("far".into())]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("type mismatch"));
    }

    #[test]
    fn try_new_accepts_nulls_in_any_column() {
        let ds = DataSet::try_new(schema(), vec![vec![Value::Null, Value::Null]]).unwrap();
        assert_eq!(ds.row_count(), 1);
    }

    #[test]
    fn display_renders_csv_cells() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float64(50.0).to_string(), "50.0");
        assert_eq!(Value::Float64(12.3).to_string(), "12.3");
        assert_eq!(Value::Int64(2009).to_string(), "2009");
        let ts = NaiveDate::from_ymd_opt(2009, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2009-01-15 08:30:00");
    }

    #[test]
    fn cmp_same_type_refuses_mixed_variants() {
        assert!(Value::Int64(1).cmp_same_type(&Value::Float64(1.0)).is_none());
        assert!(Value::Null.cmp_same_type(&Value::Null).is_none());
        assert_eq!(
            Value::Utf8("a".into()).cmp_same_type(&Value::Utf8("b".into())),
            Some(std::cmp::Ordering::Less)
        );
    }
}
