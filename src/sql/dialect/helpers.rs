//! Shared helper functions for SQL dialect implementations.
//!
//! Reusable building blocks that dialects compose to implement
//! [`SqlDialect`](super::SqlDialect) with minimal duplication.

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, DuckDB, Snowflake, SQLite
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL, BigQuery
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets.
/// Used by: T-SQL
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Quote each dot-separated part of a qualified name.
///
/// `project.dataset` becomes `` `project`.`dataset` `` under backtick quoting.
pub fn quote_dotted(name: &str, quote: impl Fn(&str) -> String) -> String {
    name.split('.').map(quote).collect::<Vec<_>>().join(".")
}

// =============================================================================
// Bind Placeholders
// =============================================================================

/// Anonymous positional placeholder.
/// Used by: MySQL, BigQuery, Snowflake
pub fn placeholder_question(_index: usize) -> String {
    "?".to_string()
}

/// Numbered placeholder with a dollar prefix (`$1`).
/// Used by: Postgres, DuckDB
pub fn placeholder_dollar(index: usize) -> String {
    format!("${}", index)
}

/// Numbered placeholder with a question mark prefix (`?1`).
/// Used by: SQLite
pub fn placeholder_numbered_question(index: usize) -> String {
    format!("?{}", index)
}

/// Named placeholder with an at-sign prefix (`@p1`).
/// Used by: T-SQL
pub fn placeholder_at(index: usize) -> String {
    format!("@p{}", index)
}
