//! Snowflake SQL dialect.
//!
//! Snowflake stores unquoted identifiers upper-cased, so the catalog is
//! queried through the upper-case `INFORMATION_SCHEMA` view.

use super::helpers;
use super::{BoundQuery, SqlDialect};

/// Snowflake SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_question(index)
    }

    fn catalog_columns_query(&self, dataset: &str) -> BoundQuery {
        BoundQuery::new(
            "SELECT TABLE_NAME, COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = ? ORDER BY TABLE_NAME, ORDINAL_POSITION",
        )
        .bind(dataset)
    }

    fn column_exists_query(&self, dataset: &str, table: &str, column: &str) -> BoundQuery {
        BoundQuery::new(
            "SELECT COUNT(*) AS RECORDS FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND COLUMN_NAME = ?",
        )
        .bind(dataset)
        .bind(table)
        .bind(column)
    }
}
