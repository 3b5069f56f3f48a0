//! Weighted scoring and ranking over precomputed normalized metrics.

use crate::core::metrics::FundMetrics;
use crate::core::nav::FundId;
use crate::store::Stores;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

pub const WEIGHT_CAGR_5Y: f64 = 0.4;
pub const WEIGHT_CONSISTENCY: f64 = 0.25;
pub const WEIGHT_MAX_DRAWDOWN: f64 = 0.2;
pub const WEIGHT_EXPENSE_RATIO: f64 = 0.15;

pub const DEFAULT_TOP_K: usize = 5;

/// Weighted sum over the normalized metrics. Weights are fixed and sum
/// to 1.0; drawdown enters through its z-score, where shallower
/// drawdowns already sit above the group mean.
pub fn score(metrics: &FundMetrics) -> f64 {
    WEIGHT_CAGR_5Y * metrics.norm_cagr_5y
        + WEIGHT_CONSISTENCY * metrics.norm_consistency
        + WEIGHT_MAX_DRAWDOWN * metrics.norm_max_drawdown
        + WEIGHT_EXPENSE_RATIO * metrics.norm_expense_ratio
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFund {
    pub fund_id: FundId,
    pub display_name: String,
    pub category: String,
    pub score: f64,
    pub metrics: FundMetrics,
}

pub struct Recommender {
    stores: Stores,
    top_k: usize,
}

impl Recommender {
    pub fn new(stores: Stores) -> Self {
        Recommender {
            stores,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_top_k(stores: Stores, top_k: usize) -> Self {
        Recommender { stores, top_k }
    }

    /// Ranks recommendable funds in the given categories by descending
    /// score, `fund_id` breaking ties, truncated to `top_k`. Funds
    /// without a metrics record are excluded rather than zero-filled.
    /// An empty result is a legitimate outcome, not an error.
    pub async fn rank(&self, categories: &[String]) -> Result<Vec<ScoredFund>> {
        let wanted: Vec<String> = categories.iter().map(|c| c.to_lowercase()).collect();
        let funds = self.stores.directory.recommendable().await?;
        let metrics: HashMap<FundId, FundMetrics> = self
            .stores
            .metrics
            .all()
            .await?
            .into_iter()
            .map(|m| (m.fund_id, m))
            .collect();

        let mut scored: Vec<ScoredFund> = funds
            .into_iter()
            .filter(|f| wanted.contains(&f.category.to_lowercase()))
            .filter_map(|f| {
                let m = metrics.get(&f.fund_id)?;
                Some(ScoredFund {
                    fund_id: f.fund_id,
                    display_name: f.display_name,
                    category: f.category,
                    score: score(m),
                    metrics: m.clone(),
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.fund_id.cmp(&b.fund_id))
        });
        scored.truncate(self.top_k);

        debug!(categories = ?wanted, results = scored.len(), "Ranked funds");
        if scored.is_empty() {
            info!(categories = ?wanted, "No funds matched the requested categories");
        }
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fund::FundRecord;

    async fn seed(stores: &Stores, fund_id: FundId, category: &str, norm_cagr_5y: f64) {
        stores
            .directory
            .upsert(FundRecord::new(fund_id, format!("Fund {fund_id}"), category))
            .await
            .unwrap();
        let mut m = FundMetrics::new(fund_id, category);
        m.norm_cagr_5y = norm_cagr_5y;
        stores.metrics.bulk_upsert(&[m]).await.unwrap();
    }

    #[tokio::test]
    async fn test_rank_orders_by_score_descending() {
        let stores = Stores::in_memory();
        seed(&stores, 1, "equity", 0.5).await;
        seed(&stores, 2, "equity", 1.5).await;
        seed(&stores, 3, "equity", -1.0).await;

        let ranked = Recommender::new(stores)
            .rank(&["equity".to_string()])
            .await
            .unwrap();
        let ids: Vec<FundId> = ranked.iter().map(|f| f.fund_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[tokio::test]
    async fn test_rank_is_deterministic_on_ties() {
        let stores = Stores::in_memory();
        seed(&stores, 7, "equity", 0.0).await;
        seed(&stores, 3, "equity", 0.0).await;
        seed(&stores, 5, "equity", 0.0).await;

        let recommender = Recommender::new(stores);
        let first = recommender.rank(&["equity".to_string()]).await.unwrap();
        let second = recommender.rank(&["equity".to_string()]).await.unwrap();
        let ids: Vec<FundId> = first.iter().map(|f| f.fund_id).collect();
        assert_eq!(ids, vec![3, 5, 7]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_rank_matches_categories_case_insensitively() {
        let stores = Stores::in_memory();
        seed(&stores, 1, "Equity", 1.0).await;

        let ranked = Recommender::new(stores)
            .rank(&["EQUITY".to_string()])
            .await
            .unwrap();
        assert_eq!(ranked.len(), 1);
    }

    #[tokio::test]
    async fn test_rank_excludes_ineligible_and_metricless() {
        let stores = Stores::in_memory();
        seed(&stores, 1, "equity", 1.0).await;
        let mut barred = FundRecord::new(2, "Barred", "equity");
        barred.eligible_for_reco = false;
        stores.directory.upsert(barred).await.unwrap();
        // Fund 3 has a directory entry but no metrics record.
        stores
            .directory
            .upsert(FundRecord::new(3, "No Metrics", "equity"))
            .await
            .unwrap();

        let ranked = Recommender::new(stores)
            .rank(&["equity".to_string()])
            .await
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].fund_id, 1);
    }

    #[tokio::test]
    async fn test_rank_truncates_to_top_k() {
        let stores = Stores::in_memory();
        for id in 1..=8 {
            seed(&stores, id, "equity", id as f64).await;
        }

        let ranked = Recommender::new(stores.clone())
            .rank(&["equity".to_string()])
            .await
            .unwrap();
        assert_eq!(ranked.len(), DEFAULT_TOP_K);
        assert_eq!(ranked[0].fund_id, 8);

        let ranked = Recommender::with_top_k(stores, 2)
            .rank(&["equity".to_string()])
            .await
            .unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let stores = Stores::in_memory();
        seed(&stores, 1, "equity", 1.0).await;

        let ranked = Recommender::new(stores)
            .rank(&["debt".to_string()])
            .await
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total = WEIGHT_CAGR_5Y + WEIGHT_CONSISTENCY + WEIGHT_MAX_DRAWDOWN + WEIGHT_EXPENSE_RATIO;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_formula() {
        let mut m = FundMetrics::new(1, "equity");
        m.norm_cagr_5y = 1.0;
        m.norm_consistency = 1.0;
        m.norm_max_drawdown = 1.0;
        m.norm_expense_ratio = 1.0;
        assert!((score(&m) - 1.0).abs() < 1e-12);

        m.norm_consistency = -1.0;
        assert!((score(&m) - 0.5).abs() < 1e-12);
    }
}
