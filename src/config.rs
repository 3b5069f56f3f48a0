use crate::core::nav::FundId;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_NAV_BASE_URL: &str = "https://api.mfapi.in";
pub const DEFAULT_RETENTION_YEARS: i32 = 6;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NavProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub nav: Option<NavProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            nav: Some(NavProviderConfig {
                base_url: DEFAULT_NAV_BASE_URL.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Watchlist of scheme codes to sync and rank.
    pub funds: Vec<FundId>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_retention_years")]
    pub retention_years: i32,
    /// Compute worker override for the metrics batch.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Keyspace location; defaults to the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_retention_years() -> i32 {
    DEFAULT_RETENTION_YEARS
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = project_dirs()?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn nav_base_url(&self) -> &str {
        self.providers
            .nav
            .as_ref()
            .map_or(DEFAULT_NAV_BASE_URL, |p| &p.base_url)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "fundrec", "fundrec").context("Could not determine project directories")
}
