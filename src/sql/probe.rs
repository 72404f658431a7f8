//! Probe query builders.
//!
//! Three query shapes back the key validator:
//!
//! ```text
//! uniqueness   SELECT COUNT(*), COUNT(DISTINCT col) FROM table
//! existence    SELECT COUNT(*) FROM <catalog> WHERE table = ? AND column = ?
//! references   SELECT COUNT(parent.ref_key), COUNT(*) - COUNT(parent.ref_key)
//!              FROM child LEFT JOIN (SELECT DISTINCT ref FROM parent) AS parent ...
//! ```
//!
//! The parent side of the reference probe is deduplicated so each child row
//! is counted exactly once; a NULL child key never matches and is counted
//! as an invalid reference.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::{BoundQuery, Dialect, SqlDialect};
use crate::keys::Catalog;

/// Dataset names are operator-supplied; they may be dot-qualified and,
/// for BigQuery projects, contain dashes.
static DATASET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_\-]*(\.[A-Za-z0-9_][A-Za-z0-9_\-]*)*$").unwrap());

/// Errors raised while building a probe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("column {table}.{column} is not in the catalog")]
    UnknownColumn { table: String, column: String },

    #[error("invalid dataset name: {0:?}")]
    InvalidDataset(String),
}

/// Check that a dataset name is safe to quote into query text.
pub fn validate_dataset_name(dataset: &str) -> Result<(), ProbeError> {
    if DATASET_PATTERN.is_match(dataset) {
        Ok(())
    } else {
        Err(ProbeError::InvalidDataset(dataset.to_string()))
    }
}

/// Builds probe queries for one dataset, allow-listed by a catalog.
#[derive(Debug, Clone)]
pub struct ProbeBuilder {
    dialect: Dialect,
    dataset: String,
    catalog: Arc<Catalog>,
}

impl ProbeBuilder {
    pub fn new(
        dialect: Dialect,
        dataset: impl Into<String>,
        catalog: Arc<Catalog>,
    ) -> Result<Self, ProbeError> {
        let dataset = dataset.into();
        validate_dataset_name(&dataset)?;
        Ok(Self {
            dialect,
            dataset,
            catalog,
        })
    }

    /// Replace the allow-list.
    pub fn with_catalog(self, catalog: Arc<Catalog>) -> Self {
        Self { catalog, ..self }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Catalog listing for the dataset.
    pub fn catalog_columns(&self) -> BoundQuery {
        self.dialect.catalog_columns_query(&self.dataset)
    }

    /// Catalog existence count. Names are bound, so no allow-listing applies.
    pub fn existence(&self, table: &str, column: &str) -> BoundQuery {
        self.dialect.column_exists_query(&self.dataset, table, column)
    }

    /// Row count and distinct count of one column.
    pub fn uniqueness(&self, table: &str, column: &str) -> Result<BoundQuery, ProbeError> {
        self.require(table, column)?;
        let d = &self.dialect;
        Ok(BoundQuery::new(format!(
            "SELECT COUNT(*) AS total_rows, COUNT(DISTINCT {}) AS unique_rows FROM {}",
            d.quote_identifier(column),
            d.qualify_table(&self.dataset, table)
        )))
    }

    /// Matched and unmatched child row counts for a child → parent reference.
    pub fn references(
        &self,
        child_table: &str,
        child_column: &str,
        parent_table: &str,
        parent_column: &str,
    ) -> Result<BoundQuery, ProbeError> {
        self.require(child_table, child_column)?;
        self.require(parent_table, parent_column)?;
        let d = &self.dialect;
        Ok(BoundQuery::new(format!(
            "SELECT COUNT(parent.ref_key) AS valid_references, \
             COUNT(*) - COUNT(parent.ref_key) AS invalid_references \
             FROM {} AS child \
             LEFT JOIN (SELECT DISTINCT {} AS ref_key FROM {}) AS parent \
             ON child.{} = parent.ref_key",
            d.qualify_table(&self.dataset, child_table),
            d.quote_identifier(parent_column),
            d.qualify_table(&self.dataset, parent_table),
            d.quote_identifier(child_column)
        )))
    }

    fn require(&self, table: &str, column: &str) -> Result<(), ProbeError> {
        if self.catalog.has_column(table, column) {
            Ok(())
        } else {
            Err(ProbeError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
        }
    }
}
