pub mod navapi;
pub mod util;

use crate::core::nav::FundId;
use crate::ingest::SchemeHistory;
use anyhow::Result;
use async_trait::async_trait;

/// A remote source of full NAV history for one scheme.
#[async_trait]
pub trait NavSource: Send + Sync {
    async fn fetch_history(&self, fund_id: FundId) -> Result<SchemeHistory>;
}
