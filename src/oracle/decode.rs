//! Lenient decoding of oracle output and CSV rendering of prompts.

use serde_json::Value;

use crate::keys::{ColumnRef, KeyCandidate, KeyType};

/// Decode a `{"keys": [...]}` payload into candidates.
///
/// Items are checked one at a time; an item missing its column, with an
/// unknown key type, or with no table (and no `default_table`) is dropped.
/// Non-string reference fields are treated as absent.
pub fn decode_candidates(payload: &Value, default_table: Option<&str>) -> Vec<KeyCandidate> {
    let Some(items) = payload.get("keys").and_then(Value::as_array) else {
        tracing::debug!("oracle payload has no keys array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let candidate = decode_item(item, default_table);
            if candidate.is_none() {
                tracing::debug!(%item, "dropping malformed oracle item");
            }
            candidate
        })
        .collect()
}

fn decode_item(item: &Value, default_table: Option<&str>) -> Option<KeyCandidate> {
    let table = string_field(item, "table_name").or(default_table.map(str::to_string))?;
    let column = string_field(item, "column_name")?;
    let key_type: KeyType = item.get("key_type")?.as_str()?.parse().ok()?;

    let (referenced_table, referenced_column) = match key_type {
        KeyType::Foreign => (
            string_field(item, "referenced_table"),
            string_field(item, "referenced_column"),
        ),
        KeyType::Primary => (None, None),
    };

    Some(KeyCandidate {
        table,
        column,
        key_type,
        referenced_table,
        referenced_column,
    })
}

fn string_field(item: &Value, name: &str) -> Option<String> {
    item.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Render columns as `table_name,column_name` CSV for a prompt.
pub fn columns_csv(columns: &[ColumnRef]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for c in columns {
        writer.serialize(c)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
