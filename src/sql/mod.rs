//! SQL generation for warehouse probes.
//!
//! - [`dialect`] - quoting, placeholders, and catalog queries per dialect
//! - [`probe`] - the aggregate queries the key validator issues
//!
//! Every identifier that reaches query text has been checked against the
//! [`Catalog`](crate::keys::Catalog) and quoted by the dialect; everything
//! else travels as a bound argument.

pub mod dialect;
pub mod probe;

pub use dialect::{Dialect, SqlDialect};
pub use probe::{validate_dataset_name, ProbeBuilder, ProbeError};

use serde::Serialize;

/// Query text plus positional arguments.
///
/// Arguments are always strings; every probe binds names, never values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundQuery {
    pub sql: String,
    pub args: Vec<String>,
}

impl BoundQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    pub fn bind(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl std::fmt::Display for BoundQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.args.is_empty() {
            write!(f, " -- args: {:?}", self.args)?;
        }
        Ok(())
    }
}
