//! Metadata and key-check traits, and the warehouse that implements them.

use std::sync::Arc;

use async_trait::async_trait;

use super::engine::{count_value, single_row, text_value, QueryEngine};
use super::error::WarehouseResult;
use crate::keys::{Catalog, ColumnRef};
use crate::sql::{validate_dataset_name, BoundQuery, Dialect, ProbeBuilder, SqlDialect};

/// Source of schema metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// List `(table, column)` pairs, ordered by table then declaration position.
    async fn list_columns(&self, dataset: &str) -> WarehouseResult<Vec<ColumnRef>>;
}

/// The three aggregate checks the key validator relies on.
#[async_trait]
pub trait KeyChecks: Send + Sync {
    /// `(COUNT(*), COUNT(DISTINCT column))` over `table`.
    async fn uniqueness(&self, table: &str, column: &str) -> WarehouseResult<(u64, u64)>;

    /// Number of catalog rows naming `table.column` (0 or 1).
    async fn column_exists(&self, table: &str, column: &str) -> WarehouseResult<u64>;

    /// `(matched, unmatched)` child rows for `child_table.child_column`
    /// against `parent_table.parent_column`.
    async fn reference_counts(
        &self,
        child_table: &str,
        child_column: &str,
        parent_table: &str,
        parent_column: &str,
    ) -> WarehouseResult<(u64, u64)>;
}

/// A dataset on a query engine, with the catalog that allow-lists probes.
///
/// A freshly built warehouse has an empty catalog, so every interpolating
/// probe fails until [`load_catalog`](Self::load_catalog) or
/// [`with_catalog`](Self::with_catalog) installs one.
#[derive(Clone)]
pub struct Warehouse {
    engine: Arc<dyn QueryEngine>,
    probes: ProbeBuilder,
}

impl Warehouse {
    pub fn new(engine: Arc<dyn QueryEngine>, dataset: impl Into<String>) -> WarehouseResult<Self> {
        let probes = ProbeBuilder::new(engine.dialect(), dataset, Arc::new(Catalog::default()))?;
        Ok(Self { engine, probes })
    }

    /// Install a catalog, e.g. one rebuilt from a schema checkpoint.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.probes = self.probes.with_catalog(Arc::new(catalog));
        self
    }

    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.probes = self.probes.clone().with_catalog(Arc::new(catalog));
    }

    /// List the dataset's columns and install them as the catalog.
    pub async fn load_catalog(&mut self) -> WarehouseResult<Vec<ColumnRef>> {
        let columns = self.list_columns(self.probes.dataset()).await?;
        self.set_catalog(Catalog::from_columns(&columns));
        Ok(columns)
    }

    pub fn dataset(&self) -> &str {
        self.probes.dataset()
    }

    pub fn dialect(&self) -> Dialect {
        self.probes.dialect()
    }

    pub fn catalog(&self) -> &Catalog {
        self.probes.catalog()
    }

    async fn fetch(&self, query: &BoundQuery) -> WarehouseResult<Vec<super::Row>> {
        tracing::debug!(dialect = %self.dialect(), sql = %query, "executing probe");
        self.engine.fetch(query).await
    }
}

#[async_trait]
impl MetadataProvider for Warehouse {
    async fn list_columns(&self, dataset: &str) -> WarehouseResult<Vec<ColumnRef>> {
        validate_dataset_name(dataset)?;
        let query = self.dialect().catalog_columns_query(dataset);
        let rows = self.fetch(&query).await?;

        rows.iter()
            .map(|row| {
                let [table, column, ..] = row.as_slice() else {
                    return Err(super::WarehouseError::UnexpectedResult(format!(
                        "catalog row has {} columns",
                        row.len()
                    )));
                };
                Ok(ColumnRef::new(text_value(table)?, text_value(column)?))
            })
            .collect()
    }
}

#[async_trait]
impl KeyChecks for Warehouse {
    async fn uniqueness(&self, table: &str, column: &str) -> WarehouseResult<(u64, u64)> {
        let query = self.probes.uniqueness(table, column)?;
        let rows = self.fetch(&query).await?;
        let row = single_row(&rows, 2)?;
        Ok((count_value(&row[0])?, count_value(&row[1])?))
    }

    async fn column_exists(&self, table: &str, column: &str) -> WarehouseResult<u64> {
        let query = self.probes.existence(table, column);
        let rows = self.fetch(&query).await?;
        let row = single_row(&rows, 1)?;
        count_value(&row[0])
    }

    async fn reference_counts(
        &self,
        child_table: &str,
        child_column: &str,
        parent_table: &str,
        parent_column: &str,
    ) -> WarehouseResult<(u64, u64)> {
        let query =
            self.probes
                .references(child_table, child_column, parent_table, parent_column)?;
        let rows = self.fetch(&query).await?;
        let row = single_row(&rows, 2)?;
        Ok((count_value(&row[0])?, count_value(&row[1])?))
    }
}
