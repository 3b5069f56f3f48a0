//! fjall-backed store implementations.
//!
//! One keyspace holds every collection as a partition. Keys are built so
//! that lexicographic order matches the access pattern: NAV keys are
//! `{fund_id:010}/{date}` so a prefix scan yields one fund's series in
//! ascending date order.

use super::{ExpenseStore, FundDirectory, MetricsStore, NavStore};
use crate::core::fund::{ExpenseSnapshot, FundRecord};
use crate::core::metrics::FundMetrics;
use crate::core::nav::{self, FundId, NavCoverage, NavPoint};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub fn open_keyspace(path: &Path) -> Result<Arc<Keyspace>> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
    let keyspace = fjall::Config::new(path)
        .open()
        .with_context(|| format!("Failed to open keyspace at {}", path.display()))?;
    Ok(Arc::new(keyspace))
}

fn open_partition(keyspace: &Keyspace, name: &str) -> Result<PartitionHandle> {
    keyspace
        .open_partition(name, PartitionCreateOptions::default())
        .with_context(|| format!("Failed to open partition: {name}"))
}

fn fund_key(fund_id: FundId) -> String {
    format!("{fund_id:010}")
}

fn nav_key(fund_id: FundId, date: NaiveDate) -> String {
    format!("{fund_id:010}/{}", date.format("%Y-%m-%d"))
}

fn parse_nav_key(key: &[u8]) -> Result<(FundId, NaiveDate)> {
    let key = std::str::from_utf8(key).context("NAV key is not valid UTF-8")?;
    let (fund, date) = key
        .split_once('/')
        .ok_or_else(|| anyhow!("Malformed NAV key: {key}"))?;
    Ok((
        fund.parse().with_context(|| format!("Bad fund id in key: {key}"))?,
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("Bad date in key: {key}"))?,
    ))
}

pub struct FjallNavStore {
    partition: PartitionHandle,
}

impl FjallNavStore {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        Ok(FjallNavStore {
            partition: open_partition(keyspace, "nav")?,
        })
    }
}

#[async_trait]
impl NavStore for FjallNavStore {
    async fn insert(&self, fund_id: FundId, date: NaiveDate, value: f64) -> Result<bool> {
        if value <= 0.0 || !value.is_finite() {
            return Err(anyhow!(
                "Rejected non-positive NAV {} for fund {} on {}",
                value,
                fund_id,
                date
            ));
        }
        let key = nav_key(fund_id, date);
        if self.partition.contains_key(&key)? {
            debug!(fund_id, %date, "Duplicate NAV skipped");
            return Ok(false);
        }
        self.partition.insert(&key, serde_json::to_vec(&value)?)?;
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
        let mut stale = Vec::new();
        for item in self.partition.iter() {
            let (key, _) = item?;
            let (_, date) = parse_nav_key(&key)?;
            if date < cutoff {
                stale.push(key);
            }
        }
        let deleted = stale.len() as u64;
        for key in stale {
            self.partition.remove(key)?;
        }
        Ok(deleted)
    }

    async fn series(&self, fund_id: FundId) -> Result<Vec<NavPoint>> {
        let prefix = format!("{}/", fund_key(fund_id));
        let mut series = Vec::new();
        for item in self.partition.prefix(prefix) {
            let (key, value) = item?;
            let (fund_id, date) = parse_nav_key(&key)?;
            series.push(NavPoint {
                fund_id,
                date,
                value: serde_json::from_slice(&value)?,
            });
        }
        Ok(series)
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
        let mut result: HashMap<FundId, NavCoverage> = HashMap::new();
        for item in self.partition.iter() {
            let (key, _) = item?;
            let (fund_id, date) = parse_nav_key(&key)?;
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

pub struct FjallFundDirectory {
    partition: PartitionHandle,
}

impl FjallFundDirectory {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        Ok(FjallFundDirectory {
            partition: open_partition(keyspace, "fund_master")?,
        })
    }

    fn scan(&self, filter: impl Fn(&FundRecord) -> bool) -> Result<Vec<FundRecord>> {
        let mut records = Vec::new();
        for item in self.partition.iter() {
            let (_, value) = item?;
            let record: FundRecord = serde_json::from_slice(&value)?;
            if filter(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl FundDirectory for FjallFundDirectory {
    async fn upsert(&self, record: FundRecord) -> Result<()> {
        self.partition
            .insert(fund_key(record.fund_id), serde_json::to_vec(&record)?)?;
        Ok(())
    }

    async fn get(&self, fund_id: FundId) -> Result<Option<FundRecord>> {
        match self.partition.get(fund_key(fund_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<FundRecord>> {
        self.scan(|_| true)
    }

    async fn active(&self) -> Result<Vec<FundRecord>> {
        self.scan(|f| f.is_active)
    }

    async fn recommendable(&self) -> Result<Vec<FundRecord>> {
        self.scan(|f| f.is_active && f.eligible_for_reco)
    }
}

pub struct FjallExpenseStore {
    partition: PartitionHandle,
}

impl FjallExpenseStore {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        Ok(FjallExpenseStore {
            partition: open_partition(keyspace, "ter_snapshot")?,
        })
    }
}

#[async_trait]
impl ExpenseStore for FjallExpenseStore {
    async fn upsert(&self, snapshot: ExpenseSnapshot) -> Result<()> {
        // Month precedes plan in the key so the latest month per fund is
        // the last entry in a prefix scan.
        let key = format!(
            "{}/{}/{}",
            fund_key(snapshot.fund_id),
            snapshot.as_of_month,
            snapshot.plan_type
        );
        self.partition.insert(key, serde_json::to_vec(&snapshot)?)?;
        Ok(())
    }

    async fn latest_for(&self, fund_ids: &[FundId]) -> Result<HashMap<FundId, ExpenseSnapshot>> {
        let mut result = HashMap::new();
        for &fund_id in fund_ids {
            let prefix = format!("{}/", fund_key(fund_id));
            if let Some(item) = self.partition.prefix(prefix).next_back() {
                let (_, value) = item?;
                result.insert(fund_id, serde_json::from_slice(&value)?);
            }
        }
        Ok(result)
    }
}

pub struct FjallMetricsStore {
    partition: PartitionHandle,
}

impl FjallMetricsStore {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        Ok(FjallMetricsStore {
            partition: open_partition(keyspace, "fund_metrics")?,
        })
    }
}

#[async_trait]
impl MetricsStore for FjallMetricsStore {
    async fn bulk_upsert(&self, records: &[FundMetrics]) -> Result<()> {
        for record in records {
            self.partition
                .insert(fund_key(record.fund_id), serde_json::to_vec(record)?)?;
        }
        Ok(())
    }

    async fn get(&self, fund_id: FundId) -> Result<Option<FundMetrics>> {
        match self.partition.get(fund_key(fund_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<FundMetrics>> {
        let mut records = Vec::new();
        for item in self.partition.iter() {
            let (_, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}
