use std::sync::Arc;

use fkscout::keys::ColumnRef;
use fkscout::warehouse::{KeyChecks, MetadataProvider, SqliteEngine, Warehouse, WarehouseError};
use rusqlite::Connection;

fn shop() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE customers (id INTEGER, name TEXT);
         INSERT INTO customers VALUES (1, 'ada'), (2, 'grace'), (3, 'edsger');
         CREATE TABLE orders (order_id INTEGER, customer_id INTEGER);
         INSERT INTO orders VALUES (10, 1), (11, 2), (12, NULL), (13, 99);
         CREATE TABLE regions (code TEXT);
         INSERT INTO regions VALUES ('eu'), ('eu'), ('us');
         CREATE TABLE shipments (region_code TEXT);
         INSERT INTO shipments VALUES ('eu'), ('us'), ('apac');
         CREATE INDEX idx_orders_customer ON orders (customer_id);",
    )
    .unwrap();
    conn
}

async fn warehouse() -> Warehouse {
    let engine = SqliteEngine::from_connection(shop());
    let mut warehouse = Warehouse::new(Arc::new(engine), "main").unwrap();
    warehouse.load_catalog().await.unwrap();
    warehouse
}

#[tokio::test]
async fn test_list_columns_orders_by_table_then_position() {
    let warehouse = warehouse().await;
    let columns = warehouse.list_columns("main").await.unwrap();

    assert_eq!(
        columns,
        vec![
            ColumnRef::new("customers", "id"),
            ColumnRef::new("customers", "name"),
            ColumnRef::new("orders", "order_id"),
            ColumnRef::new("orders", "customer_id"),
            ColumnRef::new("regions", "code"),
            ColumnRef::new("shipments", "region_code"),
        ]
    );
    assert_eq!(warehouse.catalog().len(), 6);
}

#[tokio::test]
async fn test_uniqueness() {
    let warehouse = warehouse().await;
    assert_eq!(warehouse.uniqueness("customers", "id").await.unwrap(), (3, 3));
    assert_eq!(warehouse.uniqueness("regions", "code").await.unwrap(), (3, 2));
    // NULLs are not distinct values
    assert_eq!(warehouse.uniqueness("orders", "customer_id").await.unwrap(), (4, 3));
}

#[tokio::test]
async fn test_column_exists() {
    let warehouse = warehouse().await;
    assert_eq!(warehouse.column_exists("customers", "id").await.unwrap(), 1);
    assert_eq!(warehouse.column_exists("customers", "email").await.unwrap(), 0);
    assert_eq!(warehouse.column_exists("ghosts", "id").await.unwrap(), 0);
    // bound, not interpolated
    assert_eq!(
        warehouse
            .column_exists("customers' OR '1'='1", "id")
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_reference_counts_end_to_end() {
    let warehouse = warehouse().await;
    let (valid, invalid) = warehouse
        .reference_counts("orders", "customer_id", "customers", "id")
        .await
        .unwrap();
    assert_eq!((valid, invalid), (2, 2));
}

#[tokio::test]
async fn test_reference_counts_conserve_child_rows() {
    let warehouse = warehouse().await;
    // regions.code has a duplicate 'eu'; each shipment is still counted once
    let (valid, invalid) = warehouse
        .reference_counts("shipments", "region_code", "regions", "code")
        .await
        .unwrap();
    assert_eq!((valid, invalid), (2, 1));
    let (records, _) = warehouse.uniqueness("shipments", "region_code").await.unwrap();
    assert_eq!(valid + invalid, records);
}

#[tokio::test]
async fn test_unknown_identifier_is_rejected_before_querying() {
    let warehouse = warehouse().await;
    let err = warehouse
        .uniqueness("customers", "id\"; DROP TABLE customers; --")
        .await
        .unwrap_err();
    assert!(matches!(err, WarehouseError::Probe(_)));
    assert!(!err.is_fatal());

    let err = warehouse
        .reference_counts("orders", "customer_id", "ghosts", "id")
        .await
        .unwrap_err();
    assert!(matches!(err, WarehouseError::Probe(_)));

    // table is still there
    assert_eq!(warehouse.uniqueness("customers", "id").await.unwrap(), (3, 3));
}

#[tokio::test]
async fn test_probes_fail_without_catalog() {
    let engine = SqliteEngine::from_connection(shop());
    let warehouse = Warehouse::new(Arc::new(engine), "main").unwrap();
    assert!(warehouse.uniqueness("customers", "id").await.is_err());
    assert_eq!(warehouse.column_exists("customers", "id").await.unwrap(), 1);
}

#[tokio::test]
async fn test_load_catalog_installs_allow_list() {
    let engine = SqliteEngine::from_connection(shop());
    let mut warehouse = Warehouse::new(Arc::new(engine), "main").unwrap();
    assert!(warehouse.catalog().is_empty());

    let columns = warehouse.load_catalog().await.unwrap();
    assert_eq!(columns.len(), 6);
    assert!(warehouse.catalog().has_column("orders", "customer_id"));
    assert_eq!(warehouse.reference_counts("orders", "customer_id", "customers", "id").await.unwrap(), (2, 2));
}

#[test]
fn test_invalid_dataset_rejected() {
    let engine = SqliteEngine::from_connection(Connection::open_in_memory().unwrap());
    assert!(Warehouse::new(Arc::new(engine), "main; DROP").is_err());
}
