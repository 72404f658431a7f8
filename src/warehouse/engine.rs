//! Query engine abstraction and result decoding.

use async_trait::async_trait;
use serde_json::Value;

use super::error::{WarehouseError, WarehouseResult};
use crate::sql::{BoundQuery, Dialect};

/// One result row, decoded to JSON values.
pub type Row = Vec<Value>;

/// A read-only SQL executor.
///
/// Implementations only run what they are given; query construction and
/// identifier safety live in [`ProbeBuilder`](crate::sql::ProbeBuilder).
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Dialect the engine's SQL must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Execute a query and return all rows.
    async fn fetch(&self, query: &BoundQuery) -> WarehouseResult<Vec<Row>>;
}

/// Expect exactly one row with at least `width` columns.
pub(crate) fn single_row(rows: &[Row], width: usize) -> WarehouseResult<&Row> {
    match rows {
        [row] if row.len() >= width => Ok(row),
        [row] => Err(WarehouseError::UnexpectedResult(format!(
            "expected {} columns, got {}",
            width,
            row.len()
        ))),
        _ => Err(WarehouseError::UnexpectedResult(format!(
            "expected 1 row, got {}",
            rows.len()
        ))),
    }
}

/// Decode a non-negative count.
///
/// Accepts JSON integers, integral floats, and numeric strings (BigQuery
/// reports INT64 as strings).
pub(crate) fn count_value(value: &Value) -> WarehouseResult<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| WarehouseError::UnexpectedResult(format!("not a count: {value}")))
}

/// Decode a non-null text cell.
pub(crate) fn text_value(value: &Value) -> WarehouseResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Err(WarehouseError::UnexpectedResult("unexpected NULL name".into())),
        other => Ok(other.to_string()),
    }
}
