//! Metrics batch: fetch -> parallel compute -> normalize -> upsert.
//!
//! All NAV and expense data is bulk-fetched sequentially before fan-out,
//! and the output is bulk-upserted once after fan-in; per-fund I/O never
//! interleaves with computation. The upsert is idempotent, so an aborted
//! run is retried by simply running the batch again.

use crate::core::metrics::FundMetrics;
use crate::core::nav::FundId;
use crate::metrics::normalize::normalize_by_category;
use crate::metrics::{FundComputeInput, compute_fund_metrics};
use crate::store::Stores;
use anyhow::Result;
use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use tracing::{debug, info, warn};

/// Upper bound on compute workers, protecting the store connection
/// during fan-in.
pub const MAX_WORKERS: usize = 8;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetricsRunSummary {
    pub eligible: usize,
    pub computed: usize,
    pub skipped: usize,
}

pub struct MetricsPipeline {
    stores: Stores,
    workers: usize,
}

impl MetricsPipeline {
    pub fn new(stores: Stores, workers: Option<usize>) -> Self {
        let workers = workers.unwrap_or_else(default_workers).clamp(1, MAX_WORKERS);
        MetricsPipeline { stores, workers }
    }

    /// Recomputes metrics for every recommendable fund (or the given
    /// subset). A single fund's failure is logged and skipped; it never
    /// aborts the batch.
    pub async fn run(&self, fund_ids: Option<&[FundId]>) -> Result<MetricsRunSummary> {
        let mut funds = self.stores.directory.recommendable().await?;
        if let Some(ids) = fund_ids {
            funds.retain(|f| ids.contains(&f.fund_id));
        }
        if funds.is_empty() {
            info!("No eligible funds found, nothing to compute");
            return Ok(MetricsRunSummary::default());
        }

        let ids: Vec<FundId> = funds.iter().map(|f| f.fund_id).collect();
        info!(fund_count = ids.len(), "Bulk fetching NAV and expense data");
        let mut nav_map = self.stores.nav.series_for(&ids).await?;
        let mut expense_map = self.stores.expenses.latest_for(&ids).await?;

        let inputs: Vec<FundComputeInput> = funds
            .iter()
            .map(|f| FundComputeInput {
                fund_id: f.fund_id,
                category: f.category.clone(),
                nav: nav_map.remove(&f.fund_id).unwrap_or_default(),
                expense: expense_map.remove(&f.fund_id),
            })
            .collect();

        info!(workers = self.workers, "Computing metrics in parallel");
        let results: Vec<_> = stream::iter(inputs.into_iter().map(|input| {
            let fund_id = input.fund_id;
            async move {
                let joined =
                    tokio::task::spawn_blocking(move || compute_fund_metrics(input)).await;
                (fund_id, joined)
            }
        }))
        .buffer_unordered(self.workers)
        .collect()
        .await;

        let mut records: Vec<FundMetrics> = Vec::new();
        let mut skipped = 0;
        for (fund_id, joined) in results {
            match joined {
                Ok(Some(metrics)) => records.push(metrics),
                Ok(None) => {
                    skipped += 1;
                    debug!(fund_id, stage = "compute", "No NAV history, fund skipped");
                }
                Err(e) => {
                    skipped += 1;
                    warn!(fund_id, stage = "compute", error = %e, "Metric computation failed, fund skipped");
                }
            }
        }

        if records.is_empty() {
            warn!("No metrics were computed in this run");
            return Ok(MetricsRunSummary {
                eligible: ids.len(),
                computed: 0,
                skipped,
            });
        }

        normalize_by_category(&mut records);

        let now = Utc::now();
        for record in &mut records {
            record.last_updated = now;
        }
        records.sort_by_key(|r| r.fund_id);

        self.stores.metrics.bulk_upsert(&records).await?;
        info!(
            computed = records.len(),
            skipped, "Metrics run finished"
        );

        Ok(MetricsRunSummary {
            eligible: ids.len(),
            computed: records.len(),
            skipped,
        })
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_WORKERS)
}
