//! SQLite dialect.
//!
//! SQLite has no `information_schema`; the catalog is assembled from the
//! schema's `sqlite_master` joined with the `pragma_table_info` table-valued
//! function. The dataset is the attached schema name (`main` by default).

use super::helpers;
use super::{BoundQuery, SqlDialect};

/// SQLite dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_numbered_question(index)
    }

    fn catalog_columns_query(&self, dataset: &str) -> BoundQuery {
        BoundQuery::new(format!(
            "SELECT m.name AS table_name, p.name AS column_name \
             FROM {}.sqlite_master AS m \
             JOIN pragma_table_info(m.name, ?1) AS p \
             WHERE m.type IN ('table', 'view') AND m.name NOT LIKE 'sqlite_%' \
             ORDER BY m.name, p.cid",
            self.qualify_dataset(dataset)
        ))
        .bind(dataset)
    }

    fn column_exists_query(&self, dataset: &str, table: &str, column: &str) -> BoundQuery {
        BoundQuery::new(format!(
            "SELECT COUNT(*) AS records \
             FROM {}.sqlite_master AS m \
             JOIN pragma_table_info(m.name, ?1) AS p \
             WHERE m.type IN ('table', 'view') AND m.name = ?2 AND p.name = ?3",
            self.qualify_dataset(dataset)
        ))
        .bind(dataset)
        .bind(table)
        .bind(column)
    }
}
