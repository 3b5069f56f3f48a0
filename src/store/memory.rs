//! In-memory store implementations, primarily for tests and the chat
//! session of a single process.

use super::{ExpenseStore, FundDirectory, MetricsStore, NavStore};
use crate::core::fund::{ExpenseSnapshot, FundRecord};
use crate::core::metrics::FundMetrics;
use crate::core::nav::{self, FundId, NavCoverage, NavPoint};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct MemoryNavStore {
    inner: RwLock<BTreeMap<(FundId, NaiveDate), f64>>,
}

impl MemoryNavStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NavStore for MemoryNavStore {
    async fn insert(&self, fund_id: FundId, date: NaiveDate, value: f64) -> Result<bool> {
        if value <= 0.0 || !value.is_finite() {
            return Err(anyhow!(
                "Rejected non-positive NAV {} for fund {} on {}",
                value,
                fund_id,
                date
            ));
        }
        let mut map = self.inner.write().await;
        if map.contains_key(&(fund_id, date)) {
            debug!(fund_id, %date, "Duplicate NAV skipped");
            return Ok(false);
        }
        map.insert((fund_id, date), value);
        Ok(true)
    }

    async fn bulk_insert(&self, points: &[NavPoint]) -> Result<usize> {
        let mut inserted = 0;
        for point in points {
            if self.insert(point.fund_id, point.date, point.value).await? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn prune(&self, lookback_years: i32) -> Result<u64> {
        let cutoff = nav::years_before(Utc::now().date_naive(), lookback_years);
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|(_, date), _| *date >= cutoff);
        Ok((before - map.len()) as u64)
    }

    async fn series(&self, fund_id: FundId) -> Result<Vec<NavPoint>> {
        let map = self.inner.read().await;
        Ok(map
            .range((fund_id, NaiveDate::MIN)..=(fund_id, NaiveDate::MAX))
            .map(|(&(fund_id, date), &value)| NavPoint {
                fund_id,
                date,
                value,
            })
            .collect())
    }

    async fn series_for(&self, fund_ids: &[FundId]) -> Result<HashMap<FundId, Vec<NavPoint>>> {
        let mut result = HashMap::new();
        for &fund_id in fund_ids {
            let series = self.series(fund_id).await?;
            if !series.is_empty() {
                result.insert(fund_id, series);
            }
        }
        Ok(result)
    }

    async fn coverage(&self) -> Result<HashMap<FundId, NavCoverage>> {
        let map = self.inner.read().await;
        let mut result: HashMap<FundId, NavCoverage> = HashMap::new();
        for (&(fund_id, date), _) in map.iter() {
            result
                .entry(fund_id)
                .and_modify(|c| {
                    c.record_count += 1;
                    if date > c.latest_date {
                        c.latest_date = date;
                    }
                })
                .or_insert(NavCoverage {
                    record_count: 1,
                    latest_date: date,
                });
        }
        Ok(result)
    }
}

#[derive(Default)]
pub struct MemoryFundDirectory {
    inner: RwLock<BTreeMap<FundId, FundRecord>>,
}

impl MemoryFundDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FundDirectory for MemoryFundDirectory {
    async fn upsert(&self, record: FundRecord) -> Result<()> {
        self.inner.write().await.insert(record.fund_id, record);
        Ok(())
    }

    async fn get(&self, fund_id: FundId) -> Result<Option<FundRecord>> {
        Ok(self.inner.read().await.get(&fund_id).cloned())
    }

    async fn all(&self) -> Result<Vec<FundRecord>> {
        Ok(self.inner.read().await.values().cloned().collect())
    }

    async fn active(&self) -> Result<Vec<FundRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .values()
            .filter(|f| f.is_active)
            .cloned()
            .collect())
    }

    async fn recommendable(&self) -> Result<Vec<FundRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .values()
            .filter(|f| f.is_active && f.eligible_for_reco)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryExpenseStore {
    // Keyed by (fund_id, as_of_month, plan_type); month keys sort
    // chronologically.
    inner: RwLock<BTreeMap<(FundId, String, String), ExpenseSnapshot>>,
}

impl MemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
    async fn upsert(&self, snapshot: ExpenseSnapshot) -> Result<()> {
        let key = (
            snapshot.fund_id,
            snapshot.as_of_month.clone(),
            snapshot.plan_type.clone(),
        );
        self.inner.write().await.insert(key, snapshot);
        Ok(())
    }

    async fn latest_for(&self, fund_ids: &[FundId]) -> Result<HashMap<FundId, ExpenseSnapshot>> {
        let map = self.inner.read().await;
        let mut result = HashMap::new();
        for &fund_id in fund_ids {
            let latest = map
                .range((fund_id, String::new(), String::new())..)
                .take_while(|((id, _, _), _)| *id == fund_id)
                .max_by(|(a, _), (b, _)| a.1.cmp(&b.1));
            if let Some((_, snapshot)) = latest {
                result.insert(fund_id, snapshot.clone());
            }
        }
        Ok(result)
    }
}

#[derive(Default)]
pub struct MemoryMetricsStore {
    inner: RwLock<BTreeMap<FundId, FundMetrics>>,
}

impl MemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsStore for MemoryMetricsStore {
    async fn bulk_upsert(&self, records: &[FundMetrics]) -> Result<()> {
        let mut map = self.inner.write().await;
        for record in records {
            map.insert(record.fund_id, record.clone());
        }
        Ok(())
    }

    async fn get(&self, fund_id: FundId) -> Result<Option<FundMetrics>> {
        Ok(self.inner.read().await.get(&fund_id).cloned())
    }

    async fn all(&self) -> Result<Vec<FundMetrics>> {
        Ok(self.inner.read().await.values().cloned().collect())
    }
}
