//! End-to-end orchestration with checkpoint resume.
//!
//! ```text
//! schema ──▶ candidates ──▶ validation ──▶ diagram
//!   │            │              │             │
//! schema.csv candidates.csv validation.csv diagram.mmd / diagram.html
//! ```
//!
//! Each stage loads its checkpoint when one exists, unless the matching
//! `fresh_*` option asks for recomputation. Stages are independent: a fresh
//! schema does not force fresh candidates.

use std::sync::Arc;

use crate::checkpoint::{CheckpointError, CheckpointStore, CANDIDATES_FILE, SCHEMA_FILE, VALIDATION_FILE};
use crate::config::{expand_env_vars, OracleKind, OracleSettings, Settings, SettingsError, WarehouseBackend};
use crate::diagram::{render_html, render_mermaid};
use crate::keys::{AcceptedRelationship, Catalog, ColumnRef, KeyCandidate, ValidatedCandidate};
use crate::oracle::{CandidateOracle, LlmOracle, NamingOracle, OracleError, OracleResult};
use crate::validate::{
    AcceptanceConfig, AcceptanceFilter, KeyValidator, ThresholdError, ValidationError, ValidatorConfig,
};
use crate::warehouse::{
    MetadataProvider, QueryEngine, SqliteEngine, Warehouse, WarehouseError, WorkerEngine,
};
use crate::worker::WorkerClient;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Threshold(#[from] ThresholdError),
}

/// Which stages ignore their checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub fresh_schema: bool,
    pub fresh_candidates: bool,
    pub fresh_validation: bool,
}

/// Accepted relationships and their rendered diagram.
#[derive(Debug, Clone)]
pub struct DiagramOutput {
    pub accepted: Vec<AcceptedRelationship>,
    pub mermaid: String,
}

/// Counts and output of a full run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub columns: usize,
    pub candidates: usize,
    pub validated: usize,
    pub diagram: DiagramOutput,
}

/// Where candidates come from.
///
/// The LLM client is only built when a stage actually has to propose
/// candidates, so checkpoint-backed commands run without an API key.
enum OracleSource {
    Ready(Arc<dyn CandidateOracle>),
    Llm(OracleSettings),
}

impl OracleSource {
    fn resolve(&self) -> PipelineResult<Arc<dyn CandidateOracle>> {
        match self {
            Self::Ready(oracle) => Ok(Arc::clone(oracle)),
            Self::Llm(settings) => {
                let mut settings = settings.clone();
                if let Some(key) = &settings.api_key {
                    settings.api_key = Some(expand_env_vars(key)?);
                }
                Ok(Arc::new(LlmOracle::from_settings(&settings)?))
            }
        }
    }
}

pub struct Pipeline {
    warehouse: Warehouse,
    oracle: OracleSource,
    store: CheckpointStore,
    validator: ValidatorConfig,
    acceptance: AcceptanceFilter,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(warehouse: Warehouse, oracle: Arc<dyn CandidateOracle>, store: CheckpointStore) -> Self {
        Self::with_source(warehouse, OracleSource::Ready(oracle), store)
    }

    fn with_source(warehouse: Warehouse, oracle: OracleSource, store: CheckpointStore) -> Self {
        Self {
            warehouse,
            oracle,
            store,
            validator: ValidatorConfig::default(),
            acceptance: AcceptanceFilter::default(),
            options: PipelineOptions::default(),
        }
    }

    /// Build the warehouse, oracle and checkpoint store described by `settings`.
    ///
    /// The worker backend spawns its connector process here. The LLM oracle
    /// is deferred until candidates have to be proposed.
    pub async fn from_settings(settings: &Settings) -> PipelineResult<Self> {
        settings.validate()?;
        let wh = &settings.warehouse;

        let engine: Arc<dyn QueryEngine> = match wh.backend {
            WarehouseBackend::Sqlite => Arc::new(SqliteEngine::open(wh.resolved_path()?)?),
            WarehouseBackend::Worker => {
                let client = WorkerClient::spawn_with_settings(&wh.worker)
                    .await
                    .map_err(WarehouseError::from)?;
                Arc::new(WorkerEngine::new(
                    Arc::new(client),
                    wh.driver.clone().unwrap_or_default(),
                    wh.resolved_connection_string()?,
                    wh.resolved_dialect(),
                ))
            }
        };
        let warehouse = Warehouse::new(engine, wh.dataset.clone())?;

        let oracle = match settings.oracle.kind {
            OracleKind::Llm => OracleSource::Llm(settings.oracle.clone()),
            OracleKind::Naming => OracleSource::Ready(Arc::new(NamingOracle::new())),
        };

        let acceptance = AcceptanceFilter::new(AcceptanceConfig {
            threshold: settings.acceptance.threshold,
            require_unique_parent: settings.acceptance.require_unique_parent,
        })?;

        let store = CheckpointStore::new(settings.checkpoint.dir.clone());
        Ok(Self::with_source(warehouse, oracle, store)
            .with_validator_config(ValidatorConfig::from(&settings.validation))
            .with_acceptance(acceptance))
    }

    pub fn with_validator_config(mut self, config: ValidatorConfig) -> Self {
        self.validator = config;
        self
    }

    pub fn with_acceptance(mut self, acceptance: AcceptanceFilter) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    /// Schema columns, from checkpoint or the metadata provider. Installs
    /// them as the warehouse's probe allow-list either way.
    pub async fn schema(&mut self) -> PipelineResult<Vec<ColumnRef>> {
        let columns = if !self.options.fresh_schema && self.store.exists(SCHEMA_FILE) {
            let columns = self.store.load_schema()?;
            tracing::info!(columns = columns.len(), "loaded schema checkpoint");
            columns
        } else {
            let columns = self.warehouse.list_columns(self.warehouse.dataset()).await?;
            self.store.save_schema(&columns)?;
            tracing::info!(
                dataset = self.warehouse.dataset(),
                columns = columns.len(),
                "listed schema"
            );
            columns
        };

        self.warehouse.set_catalog(Catalog::from_columns(&columns));
        Ok(columns)
    }

    /// Key candidates, from checkpoint or the oracle.
    ///
    /// Primary keys are proposed once for the whole schema; foreign keys
    /// are proposed table by table against those primary keys.
    pub async fn candidates(&self, columns: &[ColumnRef]) -> PipelineResult<Vec<KeyCandidate>> {
        if !self.options.fresh_candidates && self.store.exists(CANDIDATES_FILE) {
            let candidates = self.store.load_candidates()?;
            tracing::info!(candidates = candidates.len(), "loaded candidate checkpoint");
            return Ok(candidates);
        }

        let oracle = self.oracle.resolve()?;
        let mut candidates = tolerate(oracle.propose_primary_keys(columns).await, "primary keys")?;
        tracing::info!(primary = candidates.len(), "primary key candidates proposed");

        let catalog = Catalog::from_columns(columns);
        let mut foreign = Vec::new();
        for table in catalog.tables() {
            let proposals = oracle
                .propose_foreign_keys(table, catalog.columns_of(table), &candidates)
                .await;
            let proposals = tolerate(proposals, table)?;
            tracing::info!(table, foreign = proposals.len(), "foreign key candidates proposed");
            foreign.extend(proposals);
        }
        candidates.extend(foreign);

        self.store.save_candidates(&candidates)?;
        Ok(candidates)
    }

    /// Validate candidates, resuming from any partial validation checkpoint.
    ///
    /// Rows are appended to `validation.csv` as they complete; on success the
    /// file is rewritten with the full result in candidate order.
    pub async fn validate(&self, candidates: Vec<KeyCandidate>) -> PipelineResult<Vec<ValidatedCandidate>> {
        let previous = if self.options.fresh_validation {
            self.store.remove(VALIDATION_FILE)?;
            Vec::new()
        } else if self.store.exists(VALIDATION_FILE) {
            let rows = self.store.load_validation()?;
            tracing::info!(rows = rows.len(), "resuming from validation checkpoint");
            rows
        } else {
            Vec::new()
        };

        let validator = KeyValidator::new(Arc::new(self.warehouse.clone()), self.validator.clone());
        let mut writer = self.store.validation_writer()?;
        let outcome = validator
            .validate_resuming(candidates, &previous, Some(&mut writer))
            .await;

        let written = writer.finish();
        let rows = outcome?;
        written?;

        self.store.save_validation(&rows)?;
        Ok(rows)
    }

    /// Accept, render and save the diagram.
    pub fn diagram(&self, rows: &[ValidatedCandidate]) -> PipelineResult<DiagramOutput> {
        render_and_save(&self.store, &self.acceptance, rows)
    }

    /// Run every stage.
    pub async fn run(&mut self) -> PipelineResult<RunSummary> {
        let columns = self.schema().await?;
        let candidates = self.candidates(&columns).await?;
        let candidate_count = candidates.len();
        let rows = self.validate(candidates).await?;
        let diagram = self.diagram(&rows)?;

        tracing::info!(
            columns = columns.len(),
            candidates = candidate_count,
            accepted = diagram.accepted.len(),
            "run complete"
        );
        Ok(RunSummary {
            columns: columns.len(),
            candidates: candidate_count,
            validated: rows.len(),
            diagram,
        })
    }
}

/// Rebuild the diagram from `validation.csv` alone; no warehouse needed.
pub fn diagram_from_checkpoint(
    store: &CheckpointStore,
    acceptance: &AcceptanceFilter,
) -> PipelineResult<DiagramOutput> {
    let rows = store.load_validation()?;
    render_and_save(store, acceptance, &rows)
}

fn render_and_save(
    store: &CheckpointStore,
    acceptance: &AcceptanceFilter,
    rows: &[ValidatedCandidate],
) -> PipelineResult<DiagramOutput> {
    let accepted = acceptance.accept(rows);
    let mermaid = render_mermaid(&accepted);
    store.save_diagram(&mermaid, &render_html(&mermaid))?;
    Ok(DiagramOutput { accepted, mermaid })
}

/// Non-fatal oracle failures mean "no candidates from this call".
fn tolerate(outcome: OracleResult<Vec<KeyCandidate>>, scope: &str) -> PipelineResult<Vec<KeyCandidate>> {
    match outcome {
        Ok(candidates) => Ok(candidates),
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => {
            tracing::warn!(scope, error = %e, "oracle call failed; continuing without candidates");
            Ok(Vec::new())
        }
    }
}
