use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fkscout::keys::{KeyCandidate, ValidatedCandidate, ValidationEvidence};
use fkscout::validate::{KeyValidator, ValidationError, ValidationObserver, ValidatorConfig};
use fkscout::warehouse::{KeyChecks, WarehouseError, WarehouseResult};

type Pair = (String, String);

/// Scripted warehouse. Anything not scripted fails with a query error.
#[derive(Default)]
struct FakeChecks {
    uniqueness: HashMap<Pair, (u64, u64)>,
    columns: Vec<Pair>,
    references: HashMap<(Pair, Pair), (u64, u64)>,
    unreachable: bool,
    calls: AtomicUsize,
}

fn pair(table: &str, column: &str) -> Pair {
    (table.to_string(), column.to_string())
}

impl FakeChecks {
    fn shop() -> Self {
        let mut fake = FakeChecks::default();
        fake.uniqueness.insert(pair("customers", "id"), (3, 3));
        fake.uniqueness.insert(pair("orders", "customer_id"), (4, 3));
        fake.columns = vec![pair("customers", "id"), pair("orders", "customer_id")];
        fake.references.insert(
            (pair("orders", "customer_id"), pair("customers", "id")),
            (2, 2),
        );
        fake
    }

    fn call(&self) -> WarehouseResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(WarehouseError::Unreachable("connection refused".into()));
        }
        Ok(())
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyChecks for FakeChecks {
    async fn uniqueness(&self, table: &str, column: &str) -> WarehouseResult<(u64, u64)> {
        self.call()?;
        self.uniqueness
            .get(&pair(table, column))
            .copied()
            .ok_or_else(|| WarehouseError::Query(format!("no such column {table}.{column}")))
    }

    async fn column_exists(&self, table: &str, column: &str) -> WarehouseResult<u64> {
        self.call()?;
        Ok(self.columns.contains(&pair(table, column)) as u64)
    }

    async fn reference_counts(
        &self,
        child_table: &str,
        child_column: &str,
        parent_table: &str,
        parent_column: &str,
    ) -> WarehouseResult<(u64, u64)> {
        self.call()?;
        // stagger completion so rows finish out of order
        tokio::time::sleep(Duration::from_millis((child_column.len() % 5) as u64 * 5)).await;
        self.references
            .get(&(pair(child_table, child_column), pair(parent_table, parent_column)))
            .copied()
            .ok_or_else(|| WarehouseError::Query("join failed".into()))
    }
}

fn validator(checks: Arc<FakeChecks>) -> KeyValidator {
    KeyValidator::new(checks, ValidatorConfig::default())
}

#[derive(Default)]
struct Collect(Vec<ValidatedCandidate>);

impl ValidationObserver for Collect {
    fn on_validated(&mut self, row: &ValidatedCandidate) {
        self.0.push(row.clone());
    }
}

#[tokio::test]
async fn test_primary_candidate_evidence() {
    let rows = validator(Arc::new(FakeChecks::shop()))
        .validate(vec![KeyCandidate::primary("customers", "id")])
        .await
        .unwrap();

    let e = rows[0].evidence;
    assert_eq!((e.records, e.unique_records, e.exists), (Some(3), Some(3), Some(1)));
    assert_eq!((e.valid_references, e.invalid_references), (None, None));
}

#[tokio::test]
async fn test_foreign_candidate_evidence() {
    let rows = validator(Arc::new(FakeChecks::shop()))
        .validate(vec![KeyCandidate::foreign("orders", "customer_id", "customers", "id")])
        .await
        .unwrap();

    let e = rows[0].evidence;
    assert_eq!(e.records, None);
    assert_eq!(e.exists, Some(1));
    assert_eq!((e.valid_references, e.invalid_references), (Some(2), Some(2)));
}

#[tokio::test]
async fn test_failing_check_leaves_others_untouched() {
    let checks = Arc::new(FakeChecks::shop());
    let broken = KeyCandidate::foreign("customers", "id", "orders", "customer_id");
    let healthy = KeyCandidate::foreign("orders", "customer_id", "customers", "id");

    let rows = validator(checks)
        .validate(vec![broken, healthy])
        .await
        .unwrap();

    // the reference check of the first failed; its existence check did not
    assert_eq!(rows[0].evidence.exists, Some(1));
    assert_eq!(rows[0].evidence.valid_references, None);
    assert_eq!(rows[0].evidence.invalid_references, None);

    assert_eq!(rows[1].evidence.valid_references, Some(2));
    assert_eq!(rows[1].evidence.invalid_references, Some(2));
}

#[tokio::test]
async fn test_uniqueness_failure_keeps_fields_paired() {
    let rows = validator(Arc::new(FakeChecks::shop()))
        .validate(vec![KeyCandidate::primary("customers", "name")])
        .await
        .unwrap();

    let e = rows[0].evidence;
    assert_eq!((e.records, e.unique_records), (None, None));
    assert_eq!(e.exists, Some(0));
}

#[tokio::test]
async fn test_missing_reference_skips_checks() {
    let checks = Arc::new(FakeChecks::shop());
    let mut blank = KeyCandidate::foreign("orders", "customer_id", "customers", "  ");
    blank.referenced_column = Some("   ".into());
    let mut missing = KeyCandidate::foreign("orders", "customer_id", "x", "y");
    missing.referenced_table = None;

    let rows = validator(checks.clone())
        .validate(vec![blank, missing])
        .await
        .unwrap();

    for row in &rows {
        assert!(row.evidence.is_empty(), "{}", row.candidate);
    }
    assert_eq!(checks.calls(), 0);
}

#[tokio::test]
async fn test_rows_come_back_in_input_order() {
    let mut checks = FakeChecks::shop();
    let mut candidates = Vec::new();
    for i in 0..20 {
        let column = format!("c{}", "x".repeat(i));
        checks.columns.push(pair("t", &column));
        checks.references.insert((pair("t", &column), pair("customers", "id")), (i as u64, 1));
        candidates.push(KeyCandidate::foreign("t", column, "customers", "id"));
    }

    let validator = KeyValidator::new(
        Arc::new(checks),
        ValidatorConfig {
            max_in_flight: 4,
            ..Default::default()
        },
    );
    let rows = validator.validate(candidates.clone()).await.unwrap();

    assert_eq!(rows.len(), 20);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.candidate, candidates[i]);
        assert_eq!(row.evidence.valid_references, Some(i as u64));
    }
}

#[tokio::test]
async fn test_validation_is_idempotent() {
    let checks = Arc::new(FakeChecks::shop());
    let candidates = vec![
        KeyCandidate::primary("customers", "id"),
        KeyCandidate::foreign("orders", "customer_id", "customers", "id"),
        KeyCandidate::foreign("orders", "customer_id", "customers", "id"),
        KeyCandidate::foreign("orders", "customer_id", "ghosts", "id"),
    ];
    let validator = validator(checks);

    let first = validator.validate(candidates.clone()).await.unwrap();
    let second = validator.validate(candidates).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first[1], first[2]);
}

#[tokio::test]
async fn test_connectivity_failure_aborts_batch() {
    let checks = FakeChecks {
        unreachable: true,
        ..FakeChecks::shop()
    };
    let err = validator(Arc::new(checks))
        .validate(vec![KeyCandidate::primary("customers", "id")])
        .await
        .unwrap_err();

    let ValidationError::Connectivity(source) = err;
    assert!(source.is_fatal());
}

#[tokio::test]
async fn test_resume_skips_validated_candidates() {
    let checks = Arc::new(FakeChecks::shop());
    let done = KeyCandidate::foreign("orders", "customer_id", "customers", "id");
    let mut done_evidence = ValidationEvidence::default();
    done_evidence.set_exists(1);
    done_evidence.set_references(7, 1);
    let previous = vec![ValidatedCandidate::new(done.clone(), done_evidence)];

    let mut observer = Collect::default();
    let rows = validator(checks.clone())
        .validate_resuming(
            vec![KeyCandidate::primary("customers", "id"), done],
            &previous,
            Some(&mut observer),
        )
        .await
        .unwrap();

    // only the primary candidate was queried: uniqueness + existence
    assert_eq!(checks.calls(), 2);
    assert_eq!(rows[1].evidence, done_evidence);
    assert_eq!(observer.0.len(), 1);
    assert_eq!(observer.0[0].candidate, KeyCandidate::primary("customers", "id"));
}

#[tokio::test]
async fn test_resume_retries_rows_without_evidence() {
    let checks = Arc::new(FakeChecks::shop());
    let candidate = KeyCandidate::primary("customers", "id");
    let previous = vec![ValidatedCandidate::new(candidate.clone(), ValidationEvidence::default())];

    let rows = validator(checks.clone())
        .validate_resuming(vec![candidate], &previous, None)
        .await
        .unwrap();
    assert_eq!(rows[0].evidence.records, Some(3));
    assert_eq!(checks.calls(), 2);
}

#[tokio::test]
async fn test_resume_retries_rows_with_missing_fields() {
    let checks = Arc::new(FakeChecks::shop());
    let candidate = KeyCandidate::primary("customers", "id");
    // uniqueness timed out on the previous run; existence succeeded
    let mut partial = ValidationEvidence::default();
    partial.set_exists(1);
    let previous = vec![ValidatedCandidate::new(candidate.clone(), partial)];

    let mut observer = Collect::default();
    let rows = validator(checks.clone())
        .validate_resuming(vec![candidate], &previous, Some(&mut observer))
        .await
        .unwrap();
    assert_eq!(checks.calls(), 2);
    assert_eq!(rows[0].evidence.records, Some(3));
    assert_eq!(rows[0].evidence.unique_records, Some(3));
    assert_eq!(rows[0].evidence.exists, Some(1));
    assert_eq!(observer.0.len(), 1);
}

#[tokio::test]
async fn test_excluded_columns_are_dropped() {
    let checks = Arc::new(FakeChecks::shop());
    let validator = KeyValidator::new(
        checks.clone(),
        ValidatorConfig {
            exclude_foreign_columns: vec!["id".into()],
            ..Default::default()
        },
    );
    let rows = validator
        .validate(vec![
            KeyCandidate::foreign("customers", "Id", "orders", "customer_id"),
            KeyCandidate::foreign("orders", "customer_id", "customers", "id"),
        ])
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].candidate.column, "customer_id");
    assert_eq!(checks.calls(), 2);
}
