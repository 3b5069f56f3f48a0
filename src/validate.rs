//! Fund validation: refreshes activity and eligibility flags from NAV
//! coverage. Runs after every sync, before metrics.

use crate::store::Stores;
use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

/// Funds below this many NAV points cannot support the 3y/5y windows
/// and are excluded from recommendations.
pub const MIN_RECO_POINTS: u64 = 750;

/// Funds below this many NAV points are treated as defunct.
pub const MIN_ACTIVE_POINTS: u64 = 60;

/// A fund whose latest NAV is older than this has stopped publishing.
pub const STALE_AFTER_DAYS: i64 = 30;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSummary {
    pub checked: usize,
    pub inactive: usize,
    pub ineligible: usize,
}

/// Recomputes `is_active` and `eligible_for_reco` for every fund in the
/// directory from the NAV partition's coverage. Flags move in both
/// directions: a fund that resumes publishing becomes active again on
/// the next run.
pub async fn refresh_fund_flags(stores: &Stores) -> Result<ValidationSummary> {
    let coverage = stores.nav.coverage().await?;
    let today = Utc::now().date_naive();
    let now = Utc::now();

    let mut summary = ValidationSummary::default();
    for mut record in stores.directory.all().await? {
        summary.checked += 1;

        let (count, latest) = match coverage.get(&record.fund_id) {
            Some(c) => (c.record_count, Some(c.latest_date)),
            None => (0, None),
        };

        let stale = match latest {
            Some(date) => (today - date).num_days() > STALE_AFTER_DAYS,
            None => true,
        };

        record.is_active = count >= MIN_ACTIVE_POINTS && !stale;
        record.eligible_for_reco = record.is_active && count >= MIN_RECO_POINTS;
        record.last_nav_date = latest;
        record.nav_record_count = count;
        record.validated_at = Some(now);
        record.status_note = if !record.is_active {
            if stale {
                Some(format!("stale: latest NAV {latest:?}"))
            } else {
                Some(format!("thin history: {count} points"))
            }
        } else if !record.eligible_for_reco {
            Some(format!("below recommendation floor: {count} points"))
        } else {
            None
        };

        if !record.is_active {
            summary.inactive += 1;
        } else if !record.eligible_for_reco {
            summary.ineligible += 1;
        }
        debug!(
            fund_id = record.fund_id,
            is_active = record.is_active,
            eligible = record.eligible_for_reco,
            count,
            "Fund flags refreshed"
        );
        stores.directory.upsert(record).await?;
    }

    info!(
        checked = summary.checked,
        inactive = summary.inactive,
        ineligible = summary.ineligible,
        "Validation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fund::FundRecord;
    use crate::core::nav::{FundId, NavPoint};
    use chrono::Duration;

    async fn seed(stores: &Stores, fund_id: FundId, points: usize, latest_age_days: i64) {
        stores
            .directory
            .upsert(FundRecord::new(fund_id, format!("Fund {fund_id}"), "equity"))
            .await
            .unwrap();
        let latest = Utc::now().date_naive() - Duration::days(latest_age_days);
        let nav: Vec<NavPoint> = (0..points)
            .map(|i| NavPoint {
                fund_id,
                date: latest - Duration::days((points - 1 - i) as i64),
                value: 100.0 + i as f64,
            })
            .collect();
        stores.nav.bulk_insert(&nav).await.unwrap();
    }

    #[tokio::test]
    async fn test_healthy_fund_stays_recommendable() {
        let stores = Stores::in_memory();
        seed(&stores, 1, 800, 1).await;

        let summary = refresh_fund_flags(&stores).await.unwrap();
        assert_eq!(summary.checked, 1);
        assert_eq!(summary.inactive, 0);

        let record = stores.directory.get(1).await.unwrap().unwrap();
        assert!(record.is_active && record.eligible_for_reco);
        assert_eq!(record.nav_record_count, 800);
        assert!(record.validated_at.is_some());
        assert_eq!(record.status_note, None);
    }

    #[tokio::test]
    async fn test_thin_history_blocks_recommendation_only() {
        let stores = Stores::in_memory();
        seed(&stores, 1, 400, 1).await;

        let summary = refresh_fund_flags(&stores).await.unwrap();
        assert_eq!(summary.ineligible, 1);

        let record = stores.directory.get(1).await.unwrap().unwrap();
        assert!(record.is_active);
        assert!(!record.eligible_for_reco);
    }

    #[tokio::test]
    async fn test_very_thin_history_deactivates() {
        let stores = Stores::in_memory();
        seed(&stores, 1, 30, 1).await;

        refresh_fund_flags(&stores).await.unwrap();
        let record = stores.directory.get(1).await.unwrap().unwrap();
        assert!(!record.is_active);
        assert!(!record.eligible_for_reco);
    }

    #[tokio::test]
    async fn test_stale_fund_deactivates() {
        let stores = Stores::in_memory();
        seed(&stores, 1, 800, 45).await;

        let summary = refresh_fund_flags(&stores).await.unwrap();
        assert_eq!(summary.inactive, 1);

        let record = stores.directory.get(1).await.unwrap().unwrap();
        assert!(!record.is_active);
        assert!(record.status_note.unwrap().starts_with("stale"));
    }

    #[tokio::test]
    async fn test_flags_recover_when_publishing_resumes() {
        let stores = Stores::in_memory();
        let mut record = FundRecord::new(1, "Fund 1", "equity");
        record.is_active = false;
        record.eligible_for_reco = false;
        stores.directory.upsert(record).await.unwrap();
        seed(&stores, 1, 800, 1).await;

        refresh_fund_flags(&stores).await.unwrap();
        let record = stores.directory.get(1).await.unwrap().unwrap();
        assert!(record.is_active && record.eligible_for_reco);
    }

    #[tokio::test]
    async fn test_fund_without_any_nav_is_inactive() {
        let stores = Stores::in_memory();
        stores
            .directory
            .upsert(FundRecord::new(9, "Ghost", "debt"))
            .await
            .unwrap();

        refresh_fund_flags(&stores).await.unwrap();
        let record = stores.directory.get(9).await.unwrap().unwrap();
        assert!(!record.is_active);
        assert_eq!(record.nav_record_count, 0);
    }
}
