//! BigQuery SQL dialect.
//!
//! BigQuery features:
//! - Backtick identifier quoting, per path segment (`` `project`.`dataset` ``)
//! - Anonymous positional query parameters (`?`)
//! - Column catalog lives under the dataset (`dataset.INFORMATION_SCHEMA.COLUMNS`)

use super::helpers;
use super::{BoundQuery, SqlDialect};

/// BigQuery SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct BigQuery;

impl SqlDialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_question(index)
    }

    fn catalog_columns_query(&self, dataset: &str) -> BoundQuery {
        BoundQuery::new(format!(
            "SELECT table_name, column_name FROM {}.INFORMATION_SCHEMA.COLUMNS \
             ORDER BY table_name, ordinal_position",
            self.qualify_dataset(dataset)
        ))
    }

    fn column_exists_query(&self, dataset: &str, table: &str, column: &str) -> BoundQuery {
        BoundQuery::new(format!(
            "SELECT COUNT(*) AS records FROM {}.INFORMATION_SCHEMA.COLUMNS \
             WHERE table_name = {} AND column_name = {}",
            self.qualify_dataset(dataset),
            self.placeholder(1),
            self.placeholder(2)
        ))
        .bind(table)
        .bind(column)
    }
}
