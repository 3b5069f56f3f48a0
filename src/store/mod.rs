//! Store abstractions over the persisted collections.
//!
//! Every collection is exposed behind a trait with an in-memory
//! implementation for tests and a fjall-backed one for production. Store
//! failures are fatal to the calling job; partially-applied bulk writes
//! stay valid because every write is an idempotent insert or upsert.

pub mod disk;
pub mod memory;

use crate::core::fund::{ExpenseSnapshot, FundRecord};
use crate::core::metrics::FundMetrics;
use crate::core::nav::{FundId, NavCoverage, NavPoint};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Append-only NAV time-series keyed on (fund_id, date).
#[async_trait]
pub trait NavStore: Send + Sync {
    /// Returns `false` for a duplicate (fund_id, date): a no-op, not an
    /// error. Non-positive values are rejected.
    async fn insert(&self, fund_id: FundId, date: NaiveDate, value: f64) -> Result<bool>;

    /// Best-effort, non-atomic bulk insert; duplicates are silently
    /// skipped. Returns the number of newly inserted points.
    async fn bulk_insert(&self, points: &[NavPoint]) -> Result<usize>;

    /// Deletes records older than today minus `lookback_years`.
    async fn prune(&self, lookback_years: i32) -> Result<u64>;

    /// Full series for one fund, ascending by date.
    async fn series(&self, fund_id: FundId) -> Result<Vec<NavPoint>>;

    /// Sequential bulk fetch for a metrics batch; funds without history
    /// are absent from the map.
    async fn series_for(&self, fund_ids: &[FundId]) -> Result<HashMap<FundId, Vec<NavPoint>>>;

    /// Record count and latest date per fund, for the validation job.
    async fn coverage(&self) -> Result<HashMap<FundId, NavCoverage>>;
}

/// Fund master directory.
#[async_trait]
pub trait FundDirectory: Send + Sync {
    async fn upsert(&self, record: FundRecord) -> Result<()>;
    async fn get(&self, fund_id: FundId) -> Result<Option<FundRecord>>;
    async fn all(&self) -> Result<Vec<FundRecord>>;

    /// Funds with `is_active` set.
    async fn active(&self) -> Result<Vec<FundRecord>>;

    /// Funds with both `is_active` and `eligible_for_reco` set.
    async fn recommendable(&self) -> Result<Vec<FundRecord>>;
}

/// Monthly expense ratio snapshots keyed on (fund, plan, month).
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn upsert(&self, snapshot: ExpenseSnapshot) -> Result<()>;

    /// Latest snapshot by month per fund; funds without one are absent.
    async fn latest_for(&self, fund_ids: &[FundId]) -> Result<HashMap<FundId, ExpenseSnapshot>>;
}

/// Latest normalized metrics, unique-keyed on fund_id.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    async fn bulk_upsert(&self, records: &[FundMetrics]) -> Result<()>;
    async fn get(&self, fund_id: FundId) -> Result<Option<FundMetrics>>;
    async fn all(&self) -> Result<Vec<FundMetrics>>;
}

/// The full set of stores a job or command needs, injected as trait
/// objects so tests can swap in-memory backings.
#[derive(Clone)]
pub struct Stores {
    pub nav: Arc<dyn NavStore>,
    pub directory: Arc<dyn FundDirectory>,
    pub expenses: Arc<dyn ExpenseStore>,
    pub metrics: Arc<dyn MetricsStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Stores {
            nav: Arc::new(memory::MemoryNavStore::new()),
            directory: Arc::new(memory::MemoryFundDirectory::new()),
            expenses: Arc::new(memory::MemoryExpenseStore::new()),
            metrics: Arc::new(memory::MemoryMetricsStore::new()),
        }
    }

    /// Opens the fjall keyspace at `path` and hands out one partition per
    /// collection.
    pub fn open(path: &Path) -> Result<Self> {
        let keyspace = disk::open_keyspace(path)?;
        Self::from_keyspace(&keyspace)
    }

    /// Builds the collection set on an already-open keyspace, for callers
    /// that hold further partitions on it (a single keyspace holds one
    /// writer lock).
    pub fn from_keyspace(keyspace: &fjall::Keyspace) -> Result<Self> {
        Ok(Stores {
            nav: Arc::new(disk::FjallNavStore::new(keyspace)?),
            directory: Arc::new(disk::FjallFundDirectory::new(keyspace)?),
            expenses: Arc::new(disk::FjallExpenseStore::new(keyspace)?),
            metrics: Arc::new(disk::FjallMetricsStore::new(keyspace)?),
        })
    }
}
