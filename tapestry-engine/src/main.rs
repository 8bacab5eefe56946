//! tapestry-engine - Theme Normalization Service
//!
//! **[TTE-OV-010]** Batch engine that maps upstream free-text labels
//! onto the curated theme taxonomy and balances corpus-wide theme usage.
//! One invocation is one run; the run report printed at the end is the
//! authoritative record of what happened.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tapestry_common::config::{resolve_database_path, TomlConfig};
use tapestry_engine::config::EngineOverrides;
use tapestry_engine::services::AssignmentPipeline;
use tapestry_engine::stores::{SqliteAssignmentStore, SqliteLabelSource, SqliteTaxonomyStore};
use tapestry_engine::{CommitMode, EngineParams, RunMode};

#[derive(Parser, Debug)]
#[command(name = "tapestry-engine", version, about = "Theme normalization and diversity balancing")]
struct Cli {
    /// Path to the shared Tapestry database
    #[arg(long)]
    database: Option<PathBuf>,

    /// Explicit TOML config file (otherwise the platform search path)
    #[arg(long)]
    config: Option<PathBuf>,

    /// fresh: assign unassigned labeled stories; reassign: recompute all
    #[arg(long, value_enum, default_value_t = RunMode::Fresh)]
    mode: RunMode,

    /// Minimum distinct themes per story
    #[arg(long, env = "TAPESTRY_MIN_DIVERSITY")]
    min_diversity: Option<usize>,

    /// Maximum themes per story
    #[arg(long, env = "TAPESTRY_MAX_CATEGORIES")]
    max_categories: Option<usize>,

    /// Usage count above which a theme is deprioritized in backfill
    #[arg(long, env = "TAPESTRY_OVERUSE_THRESHOLD")]
    overuse_threshold: Option<u64>,

    /// batch: frozen snapshot for the whole run; incremental: per-record
    #[arg(long, value_enum, env = "TAPESTRY_COMMIT_MODE")]
    commit_mode: Option<CommitMode>,

    /// Compute-phase worker tasks (batch commit mode only)
    #[arg(long, env = "TAPESTRY_PARALLELISM")]
    parallelism: Option<usize>,

    /// Resume an interrupted run by its id
    #[arg(long)]
    resume_run: Option<Uuid>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    report_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (RUST_LOG overrides, info default)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting tapestry-engine (Theme Normalization)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Resolve configuration file and database path
    let toml_config = match &cli.config {
        Some(path) => Some(TomlConfig::load_from(path)?),
        None => TomlConfig::load_default()?,
    };
    let db_path = resolve_database_path(cli.database.as_deref(), toml_config.as_ref());
    info!("Database: {}", db_path.display());

    // Step 2: Resolve and validate engine parameters
    let overrides = EngineOverrides {
        min_diversity: cli.min_diversity,
        max_categories: cli.max_categories,
        overuse_threshold: cli.overuse_threshold,
        commit_mode: cli.commit_mode,
        parallelism: cli.parallelism,
    };
    let params = EngineParams::resolve(&overrides, toml_config.as_ref().map(|c| &c.engine))?;
    info!(
        min_diversity = params.min_diversity,
        max_categories = params.max_categories,
        overuse_threshold = params.overuse_threshold,
        commit_mode = %params.commit_mode,
        parallelism = params.parallelism,
        "Engine parameters resolved"
    );

    // Step 3: Open database and wire the collaborators
    let pool = tapestry_common::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let pipeline = AssignmentPipeline::new(
        SqliteTaxonomyStore::new(pool.clone()),
        SqliteLabelSource::new(pool.clone()),
        SqliteAssignmentStore::new(pool.clone()),
        params,
    );

    // Step 4: Run, finishing the in-flight record on Ctrl-C
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received; stopping after the current record");
            signal_cancel.cancel();
        }
    });

    let report = match cli.resume_run {
        Some(run_id) => pipeline.run_with_id(run_id, cli.mode, &cancel).await?,
        None => pipeline.run(cli.mode, &cancel).await?,
    };

    info!("{}", report.display_string());
    if cli.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
