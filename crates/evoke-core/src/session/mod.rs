//! Session state and its store.
//!
//! A session holds one user's board: the analyzed base embedding, the latest
//! refined embedding and the current slider positions. Sessions expire after
//! a configured time-to-live.
//!
//! - [`SessionState`]: one session's persisted state
//! - [`SessionStore`]: async key/value store with per-entry expiry
//! - [`InMemorySessionStore`]: `DashMap`-backed implementation

mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use memory::InMemorySessionStore;

use crate::error::EvokeResult;
use crate::types::{Embedding, MoodVector};

/// Persisted state of one mood board session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    /// Embedding produced by audio analysis. Refinement always starts here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_embedding: Option<Embedding>,
    /// Embedding produced by the latest refinement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_embedding: Option<Embedding>,
    #[serde(flatten)]
    pub mood: MoodVector,
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    /// Fresh session with a random id, neutral mood and no embedding.
    pub fn create() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            base_embedding: None,
            refined_embedding: None,
            mood: MoodVector::neutral(),
            created_at: Utc::now(),
        }
    }

    /// Embedding the board currently shows: refined if present, else base.
    pub fn current_embedding(&self) -> Option<&[f32]> {
        self.refined_embedding
            .as_deref()
            .or(self.base_embedding.as_deref())
    }
}

/// Key/value store for session state with per-entry expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Live session for `session_id`, or `None` if missing or expired.
    async fn get(&self, session_id: &str) -> EvokeResult<Option<SessionState>>;

    /// Insert or replace a session; its expiry restarts at `ttl` from now.
    async fn put(&self, state: SessionState, ttl: Duration) -> EvokeResult<()>;

    /// Remove a session. Returns whether one was present.
    async fn delete(&self, session_id: &str) -> EvokeResult<bool>;

    /// Check that the store is reachable.
    async fn ping(&self) -> EvokeResult<()>;
}
