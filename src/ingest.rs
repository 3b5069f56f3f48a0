//! NAV ingestion: pull scheme histories from the provider, land them in
//! the stores and prune the retention window.

use crate::core::fund::{ExpenseSnapshot, FundRecord};
use crate::core::nav::{FundId, NavPoint};
use crate::providers::NavSource;
use crate::store::Stores;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Full NAV history for one scheme as returned by the provider.
#[derive(Debug, Clone)]
pub struct SchemeHistory {
    pub fund_id: FundId,
    pub scheme_name: String,
    pub scheme_category: String,
    /// Ascending by date, duplicates already collapsed.
    pub points: Vec<NavPoint>,
}

impl SchemeHistory {
    /// Plan type read off the scheme name; AMCs encode it there.
    pub fn plan_type(&self) -> &'static str {
        if self.scheme_name.to_lowercase().contains("direct") {
            "Direct"
        } else {
            "Regular"
        }
    }

    /// Coarse peer-group category derived from the provider's verbose
    /// scheme category string.
    pub fn coarse_category(&self) -> &'static str {
        let lower = self.scheme_category.to_lowercase();
        if lower.contains("hybrid") || lower.contains("balanced") {
            "hybrid"
        } else if lower.contains("equity") || lower.contains("elss") {
            "equity"
        } else if lower.contains("debt") || lower.contains("gilt") || lower.contains("bond") {
            "debt"
        } else {
            "other"
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub synced: usize,
    pub failed: usize,
    pub inserted: usize,
    pub pruned: u64,
}

pub struct NavIngestJob {
    stores: Stores,
    source: Arc<dyn NavSource>,
    retention_years: i32,
}

impl NavIngestJob {
    pub fn new(stores: Stores, source: Arc<dyn NavSource>, retention_years: i32) -> Self {
        NavIngestJob {
            stores,
            source,
            retention_years,
        }
    }

    /// Syncs the given watchlist. Provider failures are logged per fund
    /// and counted; the run continues with the remaining funds. Finishes
    /// with a retention prune across the whole series partition.
    pub async fn sync(&self, fund_ids: &[FundId]) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();
        for &fund_id in fund_ids {
            match self.sync_one(fund_id).await {
                Ok(inserted) => {
                    summary.synced += 1;
                    summary.inserted += inserted;
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(fund_id, error = %e, "Scheme sync failed, continuing");
                }
            }
        }

        summary.pruned = self.prune().await?;
        info!(
            synced = summary.synced,
            failed = summary.failed,
            inserted = summary.inserted,
            pruned = summary.pruned,
            "NAV sync finished"
        );
        Ok(summary)
    }

    /// Drops NAV records older than the retention window.
    pub async fn prune(&self) -> Result<u64> {
        self.stores.nav.prune(self.retention_years).await
    }

    /// Fetches and lands one scheme; returns the newly inserted count.
    pub async fn sync_one(&self, fund_id: FundId) -> Result<usize> {
        let history = self.source.fetch_history(fund_id).await?;
        let inserted = self.stores.nav.bulk_insert(&history.points).await?;
        self.upsert_master(&history).await?;
        info!(
            fund_id,
            points = history.points.len(),
            inserted,
            "Scheme history landed"
        );
        Ok(inserted)
    }

    /// Writes identity fields from the provider while preserving the
    /// validation job's flags on an existing record.
    async fn upsert_master(&self, history: &SchemeHistory) -> Result<()> {
        let mut record = match self.stores.directory.get(history.fund_id).await? {
            Some(existing) => existing,
            None => FundRecord::new(history.fund_id, "", ""),
        };
        record.display_name = history.scheme_name.clone();
        record.category = history.coarse_category().to_string();
        record.plan_type = history.plan_type().to_string();
        record.last_nav_date = history.points.last().map(|p| p.date);
        record.nav_record_count = history.points.len() as u64;
        self.stores.directory.upsert(record).await
    }
}

#[derive(Debug, Deserialize)]
struct ExpenseFile {
    expenses: Vec<ExpenseSnapshot>,
}

/// Loads monthly expense snapshots from a YAML file. TER disclosures
/// have no public API; the file is maintained by hand.
pub async fn load_expenses(stores: &Stores, path: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read expense file {}", path.display()))?;
    let file: ExpenseFile = serde_yaml::from_str(&text)
        .with_context(|| format!("Failed to parse expense file {}", path.display()))?;

    let count = file.expenses.len();
    for snapshot in file.expenses {
        stores.expenses.upsert(snapshot).await?;
    }
    info!(count, "Expense snapshots loaded");
    Ok(count)
}
