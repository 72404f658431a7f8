//! Naming-convention oracle.
//!
//! Works offline from column names alone. Primary keys are found by the
//! usual surrogate-key spellings; foreign keys by prefix and suffix rules
//! resolved against the primary keys already known.

use std::collections::HashMap;

use async_trait::async_trait;

use super::inflection::{singularize, table_variants};
use super::{CandidateOracle, OracleResult};
use crate::keys::{Catalog, ColumnRef, KeyCandidate};

/// How a column name points at another table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NamingRule {
    /// `fk_customer_id`, `fk_customer`
    FkPrefix,
    /// `customer_id`
    SuffixId,
    /// `customer_key`
    SuffixKey,
    /// `country_code`
    SuffixCode,
    /// column named exactly like another table's primary key
    PkMatch,
}

const RULES: [NamingRule; 5] = [
    NamingRule::FkPrefix,
    NamingRule::SuffixId,
    NamingRule::SuffixKey,
    NamingRule::SuffixCode,
    NamingRule::PkMatch,
];

impl NamingRule {
    /// Entity name the column refers to, if the rule applies.
    fn base<'a>(self, col_lower: &'a str) -> Option<&'a str> {
        let base = match self {
            Self::FkPrefix => {
                let rest = col_lower.strip_prefix("fk_")?;
                rest.strip_suffix("_id").unwrap_or(rest)
            }
            Self::SuffixId => col_lower.strip_suffix("_id")?,
            Self::SuffixKey => col_lower.strip_suffix("_key")?,
            Self::SuffixCode => col_lower.strip_suffix("_code")?,
            Self::PkMatch => return None,
        };
        (!base.is_empty()).then_some(base)
    }
}

/// A known primary key, indexed by lowercase table name.
#[derive(Debug)]
struct PrimaryKey<'a> {
    table: &'a str,
    column: &'a str,
}

/// Oracle driven purely by naming conventions.
#[derive(Debug, Clone, Default)]
pub struct NamingOracle;

impl NamingOracle {
    pub fn new() -> Self {
        Self
    }

    /// Pick the primary key column of one table, if any spelling fits.
    fn primary_key_of(table: &str, columns: &[String]) -> Option<String> {
        let table_lower = table.to_lowercase();
        let singular = singularize(&table_lower);
        let preferred = [
            "id".to_string(),
            format!("{singular}_id"),
            format!("{table_lower}_id"),
            format!("{singular}_key"),
            format!("{singular}_code"),
        ];

        preferred.iter().find_map(|want| {
            columns
                .iter()
                .find(|c| c.to_lowercase() == *want)
                .cloned()
        })
    }

    fn resolve<'a>(
        table: &str,
        column: &str,
        primary_keys: &'a HashMap<String, PrimaryKey<'a>>,
    ) -> Option<&'a PrimaryKey<'a>> {
        let col_lower = column.to_lowercase();
        let is_self = |pk: &PrimaryKey<'_>| pk.table == table && pk.column == column;

        for rule in RULES {
            if rule == NamingRule::PkMatch {
                let hit = primary_keys
                    .values()
                    .filter(|pk| pk.table != table && pk.column.to_lowercase() == col_lower)
                    .min_by_key(|pk| pk.table);
                if hit.is_some() {
                    return hit;
                }
                continue;
            }

            let Some(base) = rule.base(&col_lower) else {
                continue;
            };
            let hit = table_variants(base)
                .iter()
                .filter_map(|v| primary_keys.get(v))
                .find(|pk| !is_self(pk));
            if hit.is_some() {
                return hit;
            }
        }
        None
    }
}

#[async_trait]
impl CandidateOracle for NamingOracle {
    async fn propose_primary_keys(&self, columns: &[ColumnRef]) -> OracleResult<Vec<KeyCandidate>> {
        let catalog = Catalog::from_columns(columns);
        Ok(catalog
            .tables()
            .filter_map(|table| {
                Self::primary_key_of(table, catalog.columns_of(table))
                    .map(|column| KeyCandidate::primary(table, column))
            })
            .collect())
    }

    async fn propose_foreign_keys(
        &self,
        table: &str,
        columns: &[String],
        known_primary_keys: &[KeyCandidate],
    ) -> OracleResult<Vec<KeyCandidate>> {
        let mut primary_keys: HashMap<String, PrimaryKey<'_>> = HashMap::new();
        for pk in known_primary_keys.iter().filter(|c| c.is_primary()) {
            primary_keys
                .entry(pk.table.to_lowercase())
                .or_insert(PrimaryKey {
                    table: &pk.table,
                    column: &pk.column,
                });
        }

        let proposals = columns
            .iter()
            .filter_map(|column| {
                Self::resolve(table, column, &primary_keys).map(|pk| {
                    KeyCandidate::foreign(table, column.as_str(), pk.table, pk.column)
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(table, proposed = proposals.len(), "naming rules applied");
        Ok(proposals)
    }
}
