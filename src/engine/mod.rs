//! Conversational recommendation engine: intent detection, preference
//! extraction, session state and ranking.

pub mod extract;
pub mod intent;
pub mod orchestrator;
pub mod recommender;
pub mod session;
pub mod snapshot;

use crate::engine::snapshot::PartialPreferences;
use anyhow::Result;
use async_trait::async_trait;

/// Optional collaborator that fills preference fields the rule-based
/// extractor left empty. Its absence or failure never changes what the
/// rules alone would have produced.
#[async_trait]
pub trait PreferenceEnricher: Send + Sync {
    async fn enrich(&self, text: &str, current: &PartialPreferences) -> Result<PartialPreferences>;
}
