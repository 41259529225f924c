//! In-memory vector database collection.
//!
//! Reports scores in a configurable [`RemoteMetric`] so the remote backend's
//! normalization can be exercised without a live database. Availability and
//! latency can be controlled to simulate outages and slow responses.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{EvokeError, EvokeResult};
use crate::index::{RemoteHit, RemoteMetric, VectorDbClient};
use crate::similarity::{l2_norm, squared_l2_distance};
use crate::types::{cmp_distance, CorpusEntry};

/// Vector database collection held in process memory.
pub struct InMemoryVectorDbClient {
    entries: RwLock<Vec<CorpusEntry>>,
    metric: RemoteMetric,
    available: AtomicBool,
    latency: Option<Duration>,
    search_calls: AtomicUsize,
}

impl InMemoryVectorDbClient {
    pub fn new(metric: RemoteMetric) -> Self {
        Self::with_entries(metric, Vec::new())
    }

    pub fn with_entries(metric: RemoteMetric, entries: Vec<CorpusEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
            metric,
            available: AtomicBool::new(true),
            latency: None,
            search_calls: AtomicUsize::new(0),
        }
    }

    /// Delay every search by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate the database going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Searches that reached the collection.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> EvokeResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EvokeError::CorpusUnavailable(
                "vector database unreachable".to_string(),
            ))
        }
    }

    /// Score in the collection's own metric.
    fn score(&self, query: &[f32], embedding: &[f32]) -> f32 {
        match self.metric {
            RemoteMetric::L2 => squared_l2_distance(query, embedding).sqrt(),
            RemoteMetric::SquaredL2 => squared_l2_distance(query, embedding),
            RemoteMetric::Cosine => {
                let dot: f32 = query.iter().zip(embedding).map(|(a, b)| a * b).sum();
                let denom = l2_norm(query) * l2_norm(embedding);
                if denom == 0.0 {
                    0.0
                } else {
                    dot / denom
                }
            }
        }
    }
}

#[async_trait]
impl VectorDbClient for InMemoryVectorDbClient {
    async fn search(&self, query: &[f32], k: usize, _nprobe: usize) -> EvokeResult<Vec<RemoteHit>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check_available()?;
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let entries = self.entries.read();
        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (pos, self.score(query, &e.embedding)))
            .collect();

        let descending = self.metric == RemoteMetric::Cosine;
        scored.sort_by(|a, b| {
            let by_score = if descending {
                cmp_distance(b.1, a.1)
            } else {
                cmp_distance(a.1, b.1)
            };
            by_score.then(a.0.cmp(&b.0))
        });

        let hits: Vec<RemoteHit> = scored
            .into_iter()
            .take(k)
            .map(|(pos, score)| RemoteHit {
                id: entries[pos].id,
                reference: entries[pos].reference.clone(),
                score,
            })
            .collect();
        debug!(metric = %self.metric, returned = hits.len(), "In-memory collection search");
        Ok(hits)
    }

    async fn insert(&self, entries: &[CorpusEntry]) -> EvokeResult<()> {
        self.check_available()?;
        self.entries.write().extend_from_slice(entries);
        Ok(())
    }

    async fn count(&self) -> EvokeResult<usize> {
        self.check_available()?;
        Ok(self.entries.read().len())
    }

    async fn ping(&self) -> EvokeResult<()> {
        self.check_available()
    }
}
