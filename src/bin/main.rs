//! fkscout CLI - infer and validate key relationships
//!
//! Usage:
//!   fkscout schema                 list the dataset's columns
//!   fkscout propose                ask the oracle for key candidates
//!   fkscout validate               check candidates against the data
//!   fkscout diagram                render accepted relationships
//!   fkscout run                    all of the above
//!
//! Examples:
//!   fkscout --config fkscout.toml run --fresh-validation
//!   fkscout --threshold 0.5 diagram
//!   RUST_LOG=fkscout=debug fkscout validate

use clap::{Args, Parser, Subcommand};
use fkscout::checkpoint::CheckpointStore;
use fkscout::config::Settings;
use fkscout::pipeline::{diagram_from_checkpoint, Pipeline, PipelineError, PipelineOptions};
use fkscout::validate::{AcceptanceConfig, AcceptanceFilter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fkscout")]
#[command(about = "fkscout - infer and validate primary/foreign keys in undeclared schemas")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to $FKSCOUT_CONFIG, ./fkscout.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset (schema) to analyse
    #[arg(long, global = true)]
    dataset: Option<String>,

    /// Directory for stage checkpoints
    #[arg(long, global = true)]
    checkpoint_dir: Option<PathBuf>,

    /// Match ratio a relationship must exceed to be accepted
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    fresh: FreshArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FreshArgs {
    /// Re-list the schema instead of loading schema.csv
    #[arg(long, global = true)]
    fresh_schema: bool,

    /// Re-run the oracle instead of loading candidates.csv
    #[arg(long, global = true)]
    fresh_candidates: bool,

    /// Re-validate everything instead of resuming from validation.csv
    #[arg(long, global = true)]
    fresh_validation: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the dataset's columns
    Schema,
    /// Propose key candidates
    Propose,
    /// Validate key candidates against the data
    Validate,
    /// Render accepted relationships from the validation checkpoint
    Diagram,
    /// Run every stage
    Run,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Diagram => cmd_diagram(&settings),
        Commands::Schema => cmd_schema(&settings, &cli.fresh).await,
        Commands::Propose => cmd_propose(&settings, &cli.fresh).await,
        Commands::Validate => cmd_validate(&settings, &cli.fresh).await,
        Commands::Run => cmd_run(&settings, &cli.fresh).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fkscout=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fkscout=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings, PipelineError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    if let Some(dataset) = &cli.dataset {
        settings.warehouse.dataset = dataset.clone();
    }
    if let Some(dir) = &cli.checkpoint_dir {
        settings.checkpoint.dir = dir.clone();
    }
    if let Some(threshold) = cli.threshold {
        settings.acceptance.threshold = threshold;
    }
    Ok(settings)
}

async fn pipeline(settings: &Settings, fresh: &FreshArgs) -> Result<Pipeline, PipelineError> {
    let options = PipelineOptions {
        fresh_schema: fresh.fresh_schema,
        fresh_candidates: fresh.fresh_candidates,
        fresh_validation: fresh.fresh_validation,
    };
    Ok(Pipeline::from_settings(settings).await?.with_options(options))
}

async fn cmd_schema(settings: &Settings, fresh: &FreshArgs) -> Result<(), PipelineError> {
    let mut pipeline = pipeline(settings, fresh).await?;
    let columns = pipeline.schema().await?;
    for column in &columns {
        println!("{column}");
    }
    Ok(())
}

async fn cmd_propose(settings: &Settings, fresh: &FreshArgs) -> Result<(), PipelineError> {
    let mut pipeline = pipeline(settings, fresh).await?;
    let columns = pipeline.schema().await?;
    for candidate in pipeline.candidates(&columns).await? {
        println!("{candidate}");
    }
    Ok(())
}

async fn cmd_validate(settings: &Settings, fresh: &FreshArgs) -> Result<(), PipelineError> {
    let mut pipeline = pipeline(settings, fresh).await?;
    let columns = pipeline.schema().await?;
    let candidates = pipeline.candidates(&columns).await?;
    let rows = pipeline.validate(candidates).await?;

    for row in &rows {
        let e = &row.evidence;
        println!(
            "{:<60} records={} unique={} exists={} valid={} invalid={}",
            row.candidate.to_string(),
            show(e.records),
            show(e.unique_records),
            show(e.exists),
            show(e.valid_references),
            show(e.invalid_references),
        );
    }
    Ok(())
}

fn cmd_diagram(settings: &Settings) -> Result<(), PipelineError> {
    let store = CheckpointStore::new(settings.checkpoint.dir.clone());
    let acceptance = AcceptanceFilter::new(AcceptanceConfig {
        threshold: settings.acceptance.threshold,
        require_unique_parent: settings.acceptance.require_unique_parent,
    })?;
    let output = diagram_from_checkpoint(&store, &acceptance)?;
    print!("{}", output.mermaid);
    Ok(())
}

async fn cmd_run(settings: &Settings, fresh: &FreshArgs) -> Result<(), PipelineError> {
    let mut pipeline = pipeline(settings, fresh).await?;
    let summary = pipeline.run().await?;
    print!("{}", summary.diagram.mermaid);
    eprintln!(
        "{} columns, {} candidates, {} validated, {} accepted; diagram written to {}",
        summary.columns,
        summary.candidates,
        summary.validated,
        summary.diagram.accepted.len(),
        pipeline.store().dir().display()
    );
    Ok(())
}

fn show(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
