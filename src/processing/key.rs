//! Hashable row keys used for grouping, partitioning, de-duplication and hash joins.

use chrono::NaiveDateTime;

use crate::types::Value;

/// Hashable image of a [`Value`].
///
/// Floats are keyed by bit pattern after folding `-0.0` into `0.0` and every NaN into one NaN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum KeyPart {
    Null,
    Int64(i64),
    Float64(u64),
    Bool(bool),
    Utf8(String),
    Timestamp(NaiveDateTime),
}

impl From<&Value> for KeyPart {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Int64(i) => Self::Int64(*i),
            Value::Float64(f) if *f == 0.0 => Self::Float64(0.0_f64.to_bits()),
            Value::Float64(f) if f.is_nan() => Self::Float64(f64::NAN.to_bits()),
            Value::Float64(f) => Self::Float64(f.to_bits()),
            Value::Bool(b) => Self::Bool(*b),
            Value::Utf8(s) => Self::Utf8(s.clone()),
            Value::Timestamp(ts) => Self::Timestamp(*ts),
        }
    }
}

pub(crate) type RowKey = Vec<KeyPart>;

/// Key of `row` over columns `idxs`. Null is an ordinary key value here.
pub(crate) fn row_key(row: &[Value], idxs: &[usize]) -> RowKey {
    idxs.iter().map(|&i| KeyPart::from(&row[i])).collect()
}

/// Key for equi-join matching: `None` if any key column is null, since null never equals null.
pub(crate) fn join_key(row: &[Value], idxs: &[usize]) -> Option<RowKey> {
    if idxs.iter().any(|&i| row[i].is_null()) {
        return None;
    }
    Some(row_key(row, idxs))
}
