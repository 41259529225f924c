//! Mood retrieval engine.
//!
//! Composes the [`EmbeddingRefiner`] and a [`CorpusIndex`] behind two
//! operations:
//!
//! - [`MoodRetrievalEngine::retrieve_for_embedding`]: search as is (first
//!   view of a board)
//! - [`MoodRetrievalEngine::refine_and_retrieve`]: refine, then search with
//!   the refined embedding, returning both
//!
//! The engine keeps no per-request state and no result cache. Every call
//! runs a fresh search under the caller's [`RequestContext`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EvokeError, EvokeResult};
use crate::index::CorpusIndex;
use crate::refine::EmbeddingRefiner;
use crate::types::{Embedding, MoodVector, RetrievalResult};

/// Request-scoped deadline and cancellation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Deadline for the search. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Cancelled by the caller to abandon the request.
    pub cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    /// Context with a fresh token and the given deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: CancellationToken::new(),
        }
    }

    /// Context with a fresh token and no deadline.
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Refined embedding plus the results retrieved with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedRetrieval {
    /// Mood after the range policy was applied
    #[serde(flatten)]
    pub mood: MoodVector,
    pub embedding: Embedding,
    pub results: Vec<RetrievalResult>,
}

/// Stateless orchestration of refinement and search.
#[derive(Clone)]
pub struct MoodRetrievalEngine {
    refiner: EmbeddingRefiner,
    index: Arc<dyn CorpusIndex>,
    config: EngineConfig,
}

impl MoodRetrievalEngine {
    pub fn new(refiner: EmbeddingRefiner, index: Arc<dyn CorpusIndex>, config: EngineConfig) -> Self {
        Self {
            refiner,
            index,
            config,
        }
    }

    #[inline]
    pub fn index(&self) -> &Arc<dyn CorpusIndex> {
        &self.index
    }

    #[inline]
    pub fn refiner(&self) -> &EmbeddingRefiner {
        &self.refiner
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Request context carrying the configured search deadline.
    pub fn default_context(&self) -> RequestContext {
        RequestContext::new(self.config.search_timeout(), CancellationToken::new())
    }

    /// Top-`k` results for `embedding`, unmodified.
    ///
    /// # Errors
    ///
    /// - `EvokeError::Cancelled` / `EvokeError::Timeout` from the context
    /// - any error from the index
    pub async fn retrieve_for_embedding(
        &self,
        ctx: &RequestContext,
        embedding: &[f32],
        k: usize,
    ) -> EvokeResult<Vec<RetrievalResult>> {
        self.search(ctx, embedding, k).await
    }

    /// Refine `base` toward `mood`, then retrieve with the refined embedding.
    ///
    /// The mood is first checked against the configured range policy.
    /// Refinement always completes before the search is issued.
    ///
    /// # Errors
    ///
    /// - `EvokeError::InvalidMoodInput` if the mood policy rejects a scalar
    /// - `EvokeError::Cancelled` / `EvokeError::Timeout` from the context
    /// - any error from the index
    pub async fn refine_and_retrieve(
        &self,
        ctx: &RequestContext,
        base: &[f32],
        mood: &MoodVector,
        k: usize,
    ) -> EvokeResult<RefinedRetrieval> {
        let mood = mood.apply_policy(self.config.mood_range)?;
        let embedding = self.refiner.refine(base, &mood);
        let results = self.search(ctx, &embedding, k).await?;
        Ok(RefinedRetrieval {
            mood,
            embedding,
            results,
        })
    }

    async fn search(&self, ctx: &RequestContext, query: &[f32], k: usize) -> EvokeResult<Vec<RetrievalResult>> {
        if ctx.cancel.is_cancelled() {
            return Err(EvokeError::Cancelled);
        }

        let start = Instant::now();
        let search = self.index.search(query, k);
        let outcome = match ctx.timeout {
            Some(timeout) => tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => Err(EvokeError::Cancelled),
                res = tokio::time::timeout(timeout, search) => match res {
                    Ok(inner) => inner,
                    Err(_) => Err(EvokeError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                },
            },
            None => tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => Err(EvokeError::Cancelled),
                res = search => res,
            },
        };

        match &outcome {
            Ok(results) => debug!(
                backend = %self.index.backend(),
                k,
                returned = results.len(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "Search complete"
            ),
            Err(e) => warn!(backend = %self.index.backend(), error = %e, "Search failed"),
        }
        outcome
    }
}
