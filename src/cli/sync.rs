use super::ui;
use crate::core::nav::FundId;
use crate::ingest::NavIngestJob;
use anyhow::Result;
use tracing::{info, warn};

/// Drives a NAV sync over the watchlist with a progress bar, then
/// prunes the retention window and prints the totals.
pub async fn run(job: &NavIngestJob, fund_ids: &[FundId]) -> Result<()> {
    if fund_ids.is_empty() {
        println!("No funds configured. Add scheme codes under `funds:` in the config.");
        return Ok(());
    }
    info!("Syncing NAV history for {} funds...", fund_ids.len());

    let pb = ui::new_progress_bar(fund_ids.len() as u64, true);
    let mut synced = 0usize;
    let mut failed = 0usize;
    let mut inserted = 0usize;
    for &fund_id in fund_ids {
        pb.set_message(format!("scheme {fund_id}"));
        match job.sync_one(fund_id).await {
            Ok(count) => {
                synced += 1;
                inserted += count;
            }
            Err(e) => {
                failed += 1;
                warn!(fund_id, error = %e, "Scheme sync failed, continuing");
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let pruned = job.prune().await?;

    println!(
        "Synced {synced}/{} schemes ({inserted} new NAV records, {pruned} pruned).",
        fund_ids.len()
    );
    if failed > 0 {
        println!(
            "{}",
            ui::style_text(&format!("{failed} schemes failed; see log."), ui::StyleType::Error)
        );
    }
    Ok(())
}
