//! SQL dialect definitions.
//!
//! This module provides a trait-based abstraction for the dialect
//! differences that matter when probing a warehouse:
//!
//! - Identifier quoting: `"` (ANSI/PG/DuckDB/SQLite), `` ` `` (MySQL/BigQuery), `[]` (T-SQL)
//! - Bind placeholders: `?`, `?1`, `$1`, `@p1`
//! - Where the column catalog lives (`information_schema`, dataset-scoped
//!   `INFORMATION_SCHEMA`, or `sqlite_master` + `pragma_table_info`)
//!
//! # Usage
//!
//! ```ignore
//! use fkscout::sql::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("user");  // "user"
//! ```

mod bigquery;
mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod snowflake;
mod sqlite;
mod tsql;

pub use bigquery::BigQuery;
pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use snowflake::Snowflake;
pub use sqlite::Sqlite;
pub use tsql::TSql;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::BoundQuery;

/// SQL dialect trait - defines how probe queries are rendered.
///
/// The default implementations follow ANSI `information_schema` where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Bind placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Quote a dataset name, which may be dot-qualified (`project.dataset`).
    fn qualify_dataset(&self, dataset: &str) -> String {
        helpers::quote_dotted(dataset, |part| self.quote_identifier(part))
    }

    /// Fully qualified, quoted table reference.
    fn qualify_table(&self, dataset: &str, table: &str) -> String {
        format!(
            "{}.{}",
            self.qualify_dataset(dataset),
            self.quote_identifier(table)
        )
    }

    /// Query returning `(table_name, column_name)` rows ordered by table then
    /// declaration position.
    fn catalog_columns_query(&self, dataset: &str) -> BoundQuery {
        BoundQuery::new(format!(
            "SELECT table_name, column_name FROM information_schema.columns \
             WHERE table_schema = {} ORDER BY table_name, ordinal_position",
            self.placeholder(1)
        ))
        .bind(dataset)
    }

    /// Query returning a single count of catalog rows matching a column.
    ///
    /// Table and column are always bound, never interpolated.
    fn column_exists_query(&self, dataset: &str, table: &str, column: &str) -> BoundQuery {
        BoundQuery::new(format!(
            "SELECT COUNT(*) AS records FROM information_schema.columns \
             WHERE table_schema = {} AND table_name = {} AND column_name = {}",
            self.placeholder(1),
            self.placeholder(2),
            self.placeholder(3)
        ))
        .bind(dataset)
        .bind(table)
        .bind(column)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    BigQuery,
    DuckDb,
    MySql,
    Postgres,
    Snowflake,
    Sqlite,
    TSql,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::BigQuery => &BigQuery,
            Dialect::DuckDb => &DuckDb,
            Dialect::MySql => &MySql,
            Dialect::Postgres => &Postgres,
            Dialect::Snowflake => &Snowflake,
            Dialect::Sqlite => &Sqlite,
            Dialect::TSql => &TSql,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn placeholder(&self, index: usize) -> String {
        self.dialect().placeholder(index)
    }

    fn qualify_dataset(&self, dataset: &str) -> String {
        self.dialect().qualify_dataset(dataset)
    }

    fn qualify_table(&self, dataset: &str, table: &str) -> String {
        self.dialect().qualify_table(dataset, table)
    }

    fn catalog_columns_query(&self, dataset: &str) -> BoundQuery {
        self.dialect().catalog_columns_query(dataset)
    }

    fn column_exists_query(&self, dataset: &str, table: &str, column: &str) -> BoundQuery {
        self.dialect().column_exists_query(dataset, table, column)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bigquery" | "bq" => Ok(Dialect::BigQuery),
            "duckdb" | "duck" => Ok(Dialect::DuckDb),
            "mysql" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "snowflake" => Ok(Dialect::Snowflake),
            "sqlite" => Ok(Dialect::Sqlite),
            "tsql" | "mssql" | "sqlserver" => Ok(Dialect::TSql),
            other => Err(format!("unsupported dialect: {other}")),
        }
    }
}
