use std::sync::Arc;

use fkscout::keys::{KeyCandidate, ValidatedCandidate, ValidationEvidence};
use fkscout::validate::{
    is_plausible_primary_key, AcceptanceConfig, AcceptanceFilter, KeyValidator, ValidatorConfig,
};
use fkscout::warehouse::{SqliteEngine, Warehouse};
use rusqlite::Connection;

fn foreign_row(exists: Option<u64>, valid: Option<u64>, invalid: Option<u64>) -> ValidatedCandidate {
    let evidence = ValidationEvidence {
        exists,
        valid_references: valid,
        invalid_references: invalid,
        ..Default::default()
    };
    ValidatedCandidate::new(
        KeyCandidate::foreign("orders", "customer_id", "customers", "id"),
        evidence,
    )
}

#[test]
fn test_threshold_is_strict() {
    let filter = AcceptanceFilter::default();

    let at_threshold = foreign_row(Some(1), Some(10), Some(90));
    assert!(filter.accept(&[at_threshold]).is_empty());

    let above = foreign_row(Some(1), Some(11), Some(89));
    let accepted = filter.accept(&[above]);
    assert_eq!(accepted.len(), 1);
    assert!((accepted[0].match_ratio - 0.11).abs() < 1e-12);
}

#[test]
fn test_zero_evidence_is_never_accepted() {
    let filter = AcceptanceFilter::new(AcceptanceConfig {
        threshold: 0.0,
        ..Default::default()
    })
    .unwrap();
    assert!(filter.accept(&[foreign_row(Some(1), Some(0), Some(0))]).is_empty());
}

#[test]
fn test_missing_evidence_is_excluded() {
    let filter = AcceptanceFilter::default();
    let rows = [
        foreign_row(None, Some(5), Some(0)),
        foreign_row(Some(0), Some(5), Some(0)),
        foreign_row(Some(2), Some(5), Some(0)),
        foreign_row(Some(1), None, None),
        foreign_row(Some(1), Some(5), None),
    ];
    assert!(filter.accept(&rows).is_empty());
}

#[test]
fn test_missing_reference_is_not_accepted() {
    let mut row = foreign_row(Some(1), Some(5), Some(0));
    row.candidate.referenced_table = None;
    assert!(AcceptanceFilter::default().accept(&[row]).is_empty());
}

#[test]
fn test_accepted_relationship_fields() {
    let accepted = AcceptanceFilter::default().accept(&[foreign_row(Some(1), Some(3), Some(1))]);
    let rel = &accepted[0];
    assert_eq!(rel.table, "orders");
    assert_eq!(rel.column, "customer_id");
    assert_eq!(rel.referenced_table, "customers");
    assert_eq!(rel.referenced_column, "id");
    assert_eq!(rel.match_ratio, 0.75);
    assert_eq!(rel.evidence.valid_references, Some(3));
}

#[test]
fn test_unique_parent_gate() {
    let mut unique = ValidationEvidence::default();
    unique.set_uniqueness(3, 3);
    let mut duplicated = ValidationEvidence::default();
    duplicated.set_uniqueness(3, 2);

    let fk = foreign_row(Some(1), Some(3), Some(1));
    let gated = AcceptanceFilter::new(AcceptanceConfig {
        require_unique_parent: true,
        ..Default::default()
    })
    .unwrap();

    // no primary evidence for the parent at all
    assert!(gated.accept(&[fk.clone()]).is_empty());

    let dup_parent = ValidatedCandidate::new(KeyCandidate::primary("customers", "id"), duplicated);
    assert!(!is_plausible_primary_key(&dup_parent));
    assert!(gated.accept(&[dup_parent, fk.clone()]).is_empty());

    let unique_parent = ValidatedCandidate::new(KeyCandidate::primary("customers", "id"), unique);
    let rows = [unique_parent, fk];
    assert_eq!(gated.accept(&rows).len(), 1);
    assert_eq!(gated.plausible_primary_keys(&rows).len(), 1);

    // without the gate the parent's uniqueness does not matter
    assert_eq!(AcceptanceFilter::default().accept(&rows[1..]).len(), 1);
}

#[tokio::test]
async fn test_orders_customers_end_to_end() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE customers (id INTEGER);
         INSERT INTO customers VALUES (1), (2), (3);
         CREATE TABLE orders (customer_id INTEGER);
         INSERT INTO orders VALUES (1), (2), (NULL), (99);",
    )
    .unwrap();
    let mut warehouse = Warehouse::new(Arc::new(SqliteEngine::from_connection(conn)), "main").unwrap();
    warehouse.load_catalog().await.unwrap();

    let validator = KeyValidator::new(Arc::new(warehouse), ValidatorConfig::default());
    let rows = validator
        .validate(vec![
            KeyCandidate::primary("customers", "id"),
            KeyCandidate::foreign("orders", "customer_id", "customers", "id"),
        ])
        .await
        .unwrap();

    let fk = rows[1].evidence;
    assert_eq!(fk.exists, Some(1));
    assert_eq!((fk.valid_references, fk.invalid_references), (Some(2), Some(2)));

    let filter = AcceptanceFilter::default();
    let accepted = filter.accept(&rows);
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].match_ratio, 0.5);
    assert_eq!(filter.plausible_primary_keys(&rows).len(), 1);
}
