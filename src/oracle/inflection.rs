//! Table-name inflection.
//!
//! Column names usually carry the singular entity (`customer_id`) while
//! tables are often plural (`customers`). The `inflector` crate covers the
//! regular cases; the table below covers irregulars common in schemas.

use inflector::Inflector;

static IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("half", "halves"),
    ("hero", "heroes"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("crisis", "crises"),
    ("diagnosis", "diagnoses"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

fn irregular(lower: &str) -> Option<(&'static str, &'static str)> {
    IRREGULARS
        .iter()
        .copied()
        .find(|(singular, plural)| lower == *singular || lower == *plural)
}

/// Plural form of a name. Already-plural irregulars are returned as is.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    match irregular(&word.to_lowercase()) {
        Some((_, plural)) => plural.to_string(),
        None => word.to_plural(),
    }
}

/// Singular form of a name.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    match irregular(&word.to_lowercase()) {
        Some((singular, _)) => singular.to_string(),
        None => word.to_singular(),
    }
}

/// Lowercase spellings a table holding `base` entities might use, most
/// literal first and without duplicates.
pub fn table_variants(base: &str) -> Vec<String> {
    let base = base.to_lowercase();
    let mut out = vec![base.clone()];
    for v in [pluralize(&base), singularize(&base)] {
        if !v.is_empty() && !out.contains(&v) {
            out.push(v);
        }
    }
    out
}
