//! In-memory session store.
//!
//! Entries carry their own deadline. An expired entry is dropped when its id
//! is read, and every `get` / `put` sweeps the whole map once the sweep
//! interval has passed, so abandoned sessions do not accumulate. Data does
//! not survive the process.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::{SessionState, SessionStore};
use crate::error::EvokeResult;

struct StoredSession {
    state: SessionState,
    expires_at: Instant,
}

/// Minimum time between full sweeps of expired sessions.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// `DashMap`-backed [`SessionStore`].
pub struct InMemorySessionStore {
    sessions: DashMap<String, StoredSession>,
    last_sweep: Mutex<Instant>,
    sweep_interval: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
            sweep_interval,
        }
    }

    /// Purge if the sweep interval has passed. Skipped while another caller
    /// is already sweeping.
    fn maybe_sweep(&self, now: Instant) {
        let Some(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if now.duration_since(*last) < self.sweep_interval {
            return;
        }
        *last = now;
        drop(last);
        self.purge_expired();
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }
        purged
    }

    /// Entries held, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> EvokeResult<Option<SessionState>> {
        let now = Instant::now();
        self.maybe_sweep(now);
        if let Some(stored) = self.sessions.get(session_id) {
            if stored.expires_at > now {
                return Ok(Some(stored.state.clone()));
            }
        }
        if self
            .sessions
            .remove_if(session_id, |_, s| s.expires_at <= now)
            .is_some()
        {
            trace!(session_id, "Evicted expired session");
        }
        Ok(None)
    }

    async fn put(&self, state: SessionState, ttl: Duration) -> EvokeResult<()> {
        let now = Instant::now();
        self.maybe_sweep(now);
        let expires_at = now + ttl;
        trace!(session_id = %state.session_id, ttl_secs = ttl.as_secs(), "Stored session");
        self.sessions
            .insert(state.session_id.clone(), StoredSession { state, expires_at });
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> EvokeResult<bool> {
        Ok(self.sessions.remove(session_id).is_some())
    }

    async fn ping(&self) -> EvokeResult<()> {
        Ok(())
    }
}
