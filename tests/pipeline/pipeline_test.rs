use std::sync::Arc;

use async_trait::async_trait;
use fkscout::checkpoint::{CheckpointStore, CANDIDATES_FILE, DIAGRAM_FILE, HTML_FILE, SCHEMA_FILE, VALIDATION_FILE};
use fkscout::config::{Settings, WarehouseBackend};
use fkscout::keys::{ColumnRef, KeyCandidate};
use fkscout::oracle::{CandidateOracle, FixedOracle, NamingOracle, OracleError, OracleResult};
use fkscout::pipeline::{diagram_from_checkpoint, Pipeline, PipelineError, PipelineOptions};
use fkscout::validate::AcceptanceFilter;
use fkscout::warehouse::{SqliteEngine, Warehouse};
use rusqlite::Connection;
use tempfile::TempDir;

fn warehouse() -> Warehouse {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE customers (id INTEGER, name TEXT);
         INSERT INTO customers VALUES (1, 'ada'), (2, 'grace'), (3, 'edsger');
         CREATE TABLE orders (order_id INTEGER, customer_id INTEGER);
         INSERT INTO orders VALUES (10, 1), (11, 2), (12, NULL), (13, 99);",
    )
    .unwrap();
    Warehouse::new(Arc::new(SqliteEngine::from_connection(conn)), "main").unwrap()
}

fn fixed() -> Arc<FixedOracle> {
    Arc::new(FixedOracle::new(vec![
        KeyCandidate::primary("customers", "id"),
        KeyCandidate::primary("orders", "order_id"),
        KeyCandidate::foreign("orders", "customer_id", "customers", "id"),
        KeyCandidate::foreign("orders", "order_id", "customers", "name"),
    ]))
}

fn pipeline(dir: &TempDir, oracle: Arc<dyn CandidateOracle>) -> Pipeline {
    Pipeline::new(warehouse(), oracle, CheckpointStore::new(dir.path()))
}

#[tokio::test]
async fn test_run_writes_every_checkpoint() {
    let dir = TempDir::new().unwrap();
    let mut pipeline = pipeline(&dir, fixed());

    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.columns, 4);
    assert_eq!(summary.candidates, 4);
    assert_eq!(summary.validated, 4);
    assert_eq!(summary.diagram.accepted.len(), 1);
    assert_eq!(summary.diagram.accepted[0].match_ratio, 0.5);
    assert_eq!(
        summary.diagram.mermaid,
        "erDiagram\n    orders }o--|| customers : \"customer_id\"\n"
    );

    let store = pipeline.store();
    for file in [SCHEMA_FILE, CANDIDATES_FILE, VALIDATION_FILE, DIAGRAM_FILE, HTML_FILE] {
        assert!(store.exists(file), "{file} missing");
    }
    assert_eq!(store.load_validation().unwrap().len(), 4);
}

#[tokio::test]
async fn test_naming_oracle_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut pipeline = pipeline(&dir, Arc::new(NamingOracle::new()));

    let summary = pipeline.run().await.unwrap();
    let accepted = &summary.diagram.accepted;
    assert_eq!(accepted.len(), 1);
    assert_eq!(
        (accepted[0].table.as_str(), accepted[0].referenced_table.as_str()),
        ("orders", "customers")
    );
}

#[tokio::test]
async fn test_second_run_reuses_checkpoints() {
    let dir = TempDir::new().unwrap();
    pipeline(&dir, fixed()).run().await.unwrap();

    // an oracle with nothing to say is never consulted
    let mut again = pipeline(&dir, Arc::new(FixedOracle::default()));
    let summary = again.run().await.unwrap();
    assert_eq!(summary.candidates, 4);
    assert_eq!(summary.diagram.accepted.len(), 1);
}

#[tokio::test]
async fn test_fresh_candidates_reconsults_oracle() {
    let dir = TempDir::new().unwrap();
    pipeline(&dir, fixed()).run().await.unwrap();

    let mut again = pipeline(&dir, Arc::new(FixedOracle::default())).with_options(PipelineOptions {
        fresh_candidates: true,
        fresh_validation: true,
        ..Default::default()
    });
    let summary = again.run().await.unwrap();
    assert_eq!(summary.candidates, 0);
    assert!(summary.diagram.accepted.is_empty());
    assert_eq!(summary.diagram.mermaid, "erDiagram\n");
}

#[tokio::test]
async fn test_validation_resumes_from_partial_checkpoint() {
    let dir = TempDir::new().unwrap();
    let mut first = pipeline(&dir, fixed());
    let columns = first.schema().await.unwrap();
    let candidates = first.candidates(&columns).await.unwrap();
    let rows = first.validate(candidates.clone()).await.unwrap();

    // keep only the header and the first row, as if the run had died
    let store = first.store();
    store.save_validation(&rows[..1]).unwrap();

    let mut second = pipeline(&dir, fixed());
    second.schema().await.unwrap();
    let resumed = second.validate(candidates).await.unwrap();
    assert_eq!(resumed, rows);
}

#[tokio::test]
async fn test_diagram_from_checkpoint_applies_threshold() {
    let dir = TempDir::new().unwrap();
    pipeline(&dir, fixed()).run().await.unwrap();
    let store = CheckpointStore::new(dir.path());

    let lenient = diagram_from_checkpoint(&store, &AcceptanceFilter::default()).unwrap();
    assert_eq!(lenient.accepted.len(), 1);

    let strict = AcceptanceFilter::new(fkscout::validate::AcceptanceConfig {
        threshold: 0.5,
        ..Default::default()
    })
    .unwrap();
    assert!(diagram_from_checkpoint(&store, &strict).unwrap().accepted.is_empty());
    assert_eq!(store.load_diagram().unwrap(), "erDiagram\n");
}

struct FlakyOracle;

#[async_trait]
impl CandidateOracle for FlakyOracle {
    async fn propose_primary_keys(&self, _columns: &[ColumnRef]) -> OracleResult<Vec<KeyCandidate>> {
        Ok(vec![KeyCandidate::primary("customers", "id")])
    }

    async fn propose_foreign_keys(
        &self,
        table: &str,
        _columns: &[String],
        _known: &[KeyCandidate],
    ) -> OracleResult<Vec<KeyCandidate>> {
        match table {
            "customers" => Err(OracleError::Http {
                status: 500,
                body: "overloaded".into(),
            }),
            _ => Ok(vec![KeyCandidate::foreign(table, "customer_id", "customers", "id")]),
        }
    }
}

#[tokio::test]
async fn test_non_fatal_oracle_errors_skip_the_table() {
    let dir = TempDir::new().unwrap();
    let summary = pipeline(&dir, Arc::new(FlakyOracle)).run().await.unwrap();
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.diagram.accepted.len(), 1);
}

struct DeadOracle;

#[async_trait]
impl CandidateOracle for DeadOracle {
    async fn propose_primary_keys(&self, _columns: &[ColumnRef]) -> OracleResult<Vec<KeyCandidate>> {
        Err(OracleError::Unreachable("connection refused".into()))
    }

    async fn propose_foreign_keys(
        &self,
        _table: &str,
        _columns: &[String],
        _known: &[KeyCandidate],
    ) -> OracleResult<Vec<KeyCandidate>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_fatal_oracle_error_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let err = pipeline(&dir, Arc::new(DeadOracle)).run().await.unwrap_err();
    assert!(matches!(err, PipelineError::Oracle(OracleError::Unreachable(_))));
    assert!(!CheckpointStore::new(dir.path()).exists(CANDIDATES_FILE));
}

/// Settings for a SQLite file in `dir`, with the default LLM oracle and a
/// key variable that is never set.
fn llm_settings(dir: &TempDir) -> Settings {
    let db = dir.path().join("shop.db");
    let conn = Connection::open(&db).unwrap();
    conn.execute_batch(
        "CREATE TABLE customers (id INTEGER);
         CREATE TABLE orders (order_id INTEGER, customer_id INTEGER);",
    )
    .unwrap();
    drop(conn);

    let mut settings = Settings::default();
    settings.warehouse.backend = WarehouseBackend::Sqlite;
    settings.warehouse.path = Some(db.to_string_lossy().into_owned());
    settings.oracle.api_key_env = "FKSCOUT_TEST_KEY_NEVER_SET".to_string();
    settings.checkpoint.dir = dir.path().join("files");
    settings
}

#[tokio::test]
async fn test_checkpointed_candidates_need_no_api_key() {
    let dir = TempDir::new().unwrap();
    let settings = llm_settings(&dir);
    CheckpointStore::new(&settings.checkpoint.dir)
        .save_candidates(&[KeyCandidate::primary("customers", "id")])
        .unwrap();

    let mut pipeline = Pipeline::from_settings(&settings).await.unwrap();
    let columns = pipeline.schema().await.unwrap();
    let candidates = pipeline.candidates(&columns).await.unwrap();
    assert_eq!(candidates, vec![KeyCandidate::primary("customers", "id")]);

    let err = Pipeline::from_settings(&settings)
        .await
        .unwrap()
        .with_options(PipelineOptions {
            fresh_candidates: true,
            ..Default::default()
        })
        .candidates(&columns)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Oracle(OracleError::MissingApiKey(_))));
}
