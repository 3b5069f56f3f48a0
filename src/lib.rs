pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod ingest;
pub mod log;
pub mod metrics;
pub mod pipeline;
pub mod providers;
pub mod store;
pub mod validate;

use crate::core::fund::RiskLevel;
use crate::engine::session::FjallSessionStore;
use crate::ingest::NavIngestJob;
use crate::pipeline::MetricsPipeline;
use crate::providers::navapi::MfApiProvider;
use crate::store::Stores;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Fetch NAV histories for the configured watchlist.
    Sync,
    /// Refresh activity/eligibility flags from NAV coverage.
    Validate,
    /// Recompute and normalize fund metrics.
    Metrics,
    /// One-shot ranking for the given preferences.
    Recommend {
        risk: Option<RiskLevel>,
        categories: Vec<String>,
    },
    /// Interactive advisory session on stdin.
    Chat,
    /// Load monthly expense snapshots from a YAML file.
    LoadExpenses { path: PathBuf },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fundrec starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_dir = config.data_dir()?;
    let keyspace = store::disk::open_keyspace(&data_dir)?;
    let stores = Stores::from_keyspace(&keyspace)?;

    match command {
        AppCommand::Sync => {
            let provider = Arc::new(MfApiProvider::new(config.nav_base_url())?);
            let job = NavIngestJob::new(stores, provider, config.retention_years);
            cli::sync::run(&job, &config.funds).await
        }
        AppCommand::Validate => {
            let summary = validate::refresh_fund_flags(&stores).await?;
            println!(
                "Validated {} funds: {} inactive, {} active but not recommendable.",
                summary.checked, summary.inactive, summary.ineligible
            );
            Ok(())
        }
        AppCommand::Metrics => {
            let pipeline = MetricsPipeline::new(stores, config.workers);
            let summary = pipeline.run(None).await?;
            println!(
                "Computed metrics for {}/{} eligible funds ({} skipped).",
                summary.computed, summary.eligible, summary.skipped
            );
            Ok(())
        }
        AppCommand::Recommend { risk, categories } => {
            let categories = if !categories.is_empty() {
                categories
            } else if let Some(risk) = risk {
                risk.fallback_categories()
            } else {
                anyhow::bail!("Pass --risk or at least one --category");
            };
            cli::recommend::run(stores, &categories).await
        }
        AppCommand::Chat => {
            let sessions = Arc::new(FjallSessionStore::new(&keyspace)?);
            cli::chat::run(stores, sessions, "cli").await
        }
        AppCommand::LoadExpenses { path } => {
            let count = ingest::load_expenses(&stores, &path).await?;
            println!("Loaded {count} expense snapshots from {}.", path.display());
            Ok(())
        }
    }
}
