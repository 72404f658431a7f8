use std::fs;

use fkscout::checkpoint::{CheckpointStore, CANDIDATES_FILE, VALIDATION_FILE};
use fkscout::keys::{ColumnRef, KeyCandidate, ValidatedCandidate, ValidationEvidence};
use fkscout::validate::ValidationObserver;

fn rows() -> Vec<ValidatedCandidate> {
    let mut pk = ValidationEvidence::default();
    pk.set_uniqueness(3, 3);
    pk.set_exists(1);

    let mut fk = ValidationEvidence::default();
    fk.set_exists(1);
    fk.set_references(2, 2);

    let mut no_ref = KeyCandidate::foreign("orders", "note_id", "x", "y");
    no_ref.referenced_table = None;
    no_ref.referenced_column = None;

    vec![
        ValidatedCandidate::new(KeyCandidate::primary("customers", "id"), pk),
        ValidatedCandidate::new(KeyCandidate::foreign("orders", "customer_id", "customers", "id"), fk),
        ValidatedCandidate::new(no_ref, ValidationEvidence::default()),
    ]
}

#[test]
fn test_schema_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("files"));
    let columns = vec![ColumnRef::new("orders", "customer_id"), ColumnRef::new("orders", "total, gross")];

    store.save_schema(&columns).unwrap();
    assert_eq!(store.load_schema().unwrap(), columns);
}

#[test]
fn test_candidates_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    let candidates = vec![
        KeyCandidate::primary("customers", "id"),
        KeyCandidate::foreign("orders", "customer_id", "customers", "id"),
    ];

    store.save_candidates(&candidates).unwrap();
    let text = fs::read_to_string(store.path(CANDIDATES_FILE)).unwrap();
    assert_eq!(
        text,
        "table_name,column_name,key_type,referenced_table,referenced_column\n\
         customers,id,primary,,\n\
         orders,customer_id,foreign,customers,id\n"
    );
    assert_eq!(store.load_candidates().unwrap(), candidates);
}

#[test]
fn test_absent_evidence_roundtrips_as_empty_cells() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());

    store.save_validation(&rows()).unwrap();
    let text = fs::read_to_string(store.path(VALIDATION_FILE)).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "table_name,column_name,key_type,referenced_table,referenced_column,\
         records,unique_records,exists,valid_references,invalid_references"
    );
    assert_eq!(lines[1], "customers,id,primary,,,3,3,1,,");
    assert_eq!(lines[3], "orders,note_id,foreign,,,,,,,");

    assert_eq!(store.load_validation().unwrap(), rows());
}

#[test]
fn test_writer_appends_and_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    let all = rows();

    let mut writer = store.validation_writer().unwrap();
    writer.on_validated(&all[0]);
    assert_eq!(writer.finish().unwrap(), 1);

    // a second writer continues the same file without another header
    let mut writer = store.validation_writer().unwrap();
    writer.on_validated(&all[1]);
    writer.on_validated(&all[2]);
    assert_eq!(writer.written(), 2);
    drop(writer);

    let text = fs::read_to_string(store.path(VALIDATION_FILE)).unwrap();
    assert_eq!(text.matches("table_name").count(), 1);
    assert_eq!(store.load_validation().unwrap(), all);
}

#[test]
fn test_unreadable_validation_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    store.save_validation(&rows()[..1]).unwrap();

    let path = store.path(VALIDATION_FILE);
    let mut text = fs::read_to_string(&path).unwrap();
    text.push_str("orders,x,sideways,,,,,,,\n");
    fs::write(&path, text).unwrap();

    let loaded = store.load_validation().unwrap();
    assert_eq!(loaded, rows()[..1].to_vec());
}

#[test]
fn test_diagram_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    store.save_diagram("erDiagram\n", "<html></html>").unwrap();

    assert_eq!(store.load_diagram().unwrap(), "erDiagram\n");
    assert!(store.exists("diagram.html"));
    store.remove("diagram.html").unwrap();
    assert!(!store.exists("diagram.html"));
}
