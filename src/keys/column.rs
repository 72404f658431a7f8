//! Schema positions and the catalog built from them.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// A `(table, column)` pair reported by the metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Table name.
    #[serde(rename = "table_name")]
    pub table: String,
    /// Column name.
    #[serde(rename = "column_name")]
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// The set of columns known to exist in a dataset.
///
/// Query builders only accept identifiers found here, so names coming from
/// an oracle can never reach query text unless the warehouse reported them.
/// Lookups are exact; the warehouse's own spelling is what gets quoted.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    columns: HashSet<(String, String)>,
    /// Columns per table in declaration order.
    tables: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    /// Build a catalog from provider output, preserving column order per table.
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = &'a ColumnRef>) -> Self {
        let mut catalog = Self::default();
        for c in columns {
            if catalog
                .columns
                .insert((c.table.clone(), c.column.clone()))
            {
                catalog
                    .tables
                    .entry(c.table.clone())
                    .or_default()
                    .push(c.column.clone());
            }
        }
        catalog
    }

    /// Check whether a table is known.
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Check whether a column is known.
    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.columns
            .contains(&(table.to_string(), column.to_string()))
    }

    /// Table names in sorted order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Columns of a table in declaration order.
    pub fn columns_of(&self, table: &str) -> &[String] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
