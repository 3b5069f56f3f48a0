//! Session persistence: snapshot plus the last served recommendations,
//! keyed by an opaque session id.

use crate::engine::recommender::ScoredFund;
use crate::engine::snapshot::UserSnapshot;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub snapshot: UserSnapshot,
    #[serde(default)]
    pub last_recommendations: Vec<ScoredFund>,
}

/// Create-on-first-touch session storage. `load` of an unknown id hands
/// back a fresh session; `end` drops the state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Session>;
    async fn save(&self, session_id: &str, session: &Session) -> Result<()>;
    async fn end(&self, session_id: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Session> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn save(&self, session_id: &str, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), session.clone());
        Ok(())
    }

    async fn end(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(())
    }
}

pub struct FjallSessionStore {
    partition: PartitionHandle,
}

impl FjallSessionStore {
    pub fn new(keyspace: &Keyspace) -> Result<Self> {
        let partition = keyspace
            .open_partition("sessions", PartitionCreateOptions::default())
            .context("Failed to open partition: sessions")?;
        Ok(FjallSessionStore { partition })
    }
}

#[async_trait]
impl SessionStore for FjallSessionStore {
    async fn load(&self, session_id: &str) -> Result<Session> {
        match self.partition.get(session_id)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt session record: {session_id}")),
            None => {
                debug!(session_id, "New session");
                Ok(Session::default())
            }
        }
    }

    async fn save(&self, session_id: &str, session: &Session) -> Result<()> {
        self.partition
            .insert(session_id, serde_json::to_vec(session)?)?;
        Ok(())
    }

    async fn end(&self, session_id: &str) -> Result<()> {
        self.partition.remove(session_id)?;
        Ok(())
    }
}
