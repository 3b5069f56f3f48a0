use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fundrec::core::fund::RiskLevel;
use fundrec::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fundrec::AppCommand {
    fn from(cmd: Commands) -> fundrec::AppCommand {
        match cmd {
            Commands::Sync => fundrec::AppCommand::Sync,
            Commands::Validate => fundrec::AppCommand::Validate,
            Commands::Metrics => fundrec::AppCommand::Metrics,
            Commands::Recommend { risk, category } => fundrec::AppCommand::Recommend {
                risk,
                categories: category,
            },
            Commands::Chat => fundrec::AppCommand::Chat,
            Commands::LoadExpenses { path } => fundrec::AppCommand::LoadExpenses { path },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch NAV histories for the configured watchlist
    Sync,
    /// Refresh fund activity and eligibility flags
    Validate,
    /// Recompute and normalize fund metrics
    Metrics,
    /// Rank funds for a risk level or explicit categories
    Recommend {
        /// Risk appetite: low, moderate or high
        #[arg(short, long)]
        risk: Option<RiskLevel>,
        /// Fund category (repeatable); overrides the risk-derived set
        #[arg(long)]
        category: Vec<String>,
    },
    /// Interactive advisory session
    Chat,
    /// Load monthly expense snapshots from a YAML file
    LoadExpenses {
        /// Path to the expense YAML file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => fundrec::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = fundrec::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
# Scheme codes to sync and rank.
funds:
  - 100027

providers:
  nav:
    base_url: "https://api.mfapi.in"

retention_years: 6
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
