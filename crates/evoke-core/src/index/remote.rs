//! Remote vector database backend.
//!
//! The database is reached through [`VectorDbClient`]. Whatever metric it
//! reports is converted to Euclidean distance here, so results from this
//! backend order exactly like the in-process ones.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{check_query_dimension, CorpusIndex};
use crate::config::{DimensionPolicy, IndexBackend};
use crate::error::{EvokeError, EvokeResult};
use crate::types::{cmp_distance, CorpusEntry, EntryId, RetrievalResult};

/// Score convention of a remote database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteMetric {
    /// Euclidean distance. Used as is.
    #[default]
    L2,
    /// Squared Euclidean distance. Square root is taken.
    SquaredL2,
    /// Cosine similarity (higher = closer). Converted with
    /// `d = sqrt(2 - 2·cos)`, exact for unit-norm vectors.
    Cosine,
}

impl RemoteMetric {
    /// Convert a reported score to Euclidean distance.
    #[inline]
    pub fn to_l2_distance(self, score: f32) -> f32 {
        match self {
            Self::L2 => score,
            Self::SquaredL2 => score.max(0.0).sqrt(),
            Self::Cosine => (2.0 - 2.0 * score).max(0.0).sqrt(),
        }
    }
}

impl fmt::Display for RemoteMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L2 => write!(f, "l2"),
            Self::SquaredL2 => write!(f, "squared_l2"),
            Self::Cosine => write!(f, "cosine"),
        }
    }
}

/// One hit as reported by the database, in its own metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteHit {
    pub id: EntryId,
    pub reference: String,
    pub score: f32,
}

/// Client for an external vector database collection.
#[async_trait]
pub trait VectorDbClient: Send + Sync {
    /// Top-`k` hits for `query`, probing `nprobe` lists where supported.
    async fn search(&self, query: &[f32], k: usize, nprobe: usize) -> EvokeResult<Vec<RemoteHit>>;

    /// Insert entries into the collection.
    async fn insert(&self, entries: &[CorpusEntry]) -> EvokeResult<()>;

    /// Number of entries in the collection.
    async fn count(&self) -> EvokeResult<usize>;

    /// Check connectivity.
    async fn ping(&self) -> EvokeResult<()>;
}

/// Corpus index served by a remote vector database.
pub struct RemoteIndex {
    client: Arc<dyn VectorDbClient>,
    metric: RemoteMetric,
    dimension: usize,
    nprobe: usize,
    policy: DimensionPolicy,
}

impl RemoteIndex {
    pub fn new(
        client: Arc<dyn VectorDbClient>,
        metric: RemoteMetric,
        dimension: usize,
        nprobe: usize,
        policy: DimensionPolicy,
    ) -> Self {
        Self {
            client,
            metric,
            dimension,
            nprobe,
            policy,
        }
    }

    #[inline]
    pub fn metric(&self) -> RemoteMetric {
        self.metric
    }
}

/// Any client failure means the corpus could not be consulted.
fn unavailable(err: EvokeError) -> EvokeError {
    match err {
        EvokeError::CorpusUnavailable(_) => err,
        other => EvokeError::CorpusUnavailable(other.to_string()),
    }
}

#[async_trait]
impl CorpusIndex for RemoteIndex {
    async fn search(&self, query: &[f32], k: usize) -> EvokeResult<Vec<RetrievalResult>> {
        check_query_dimension(query, self.dimension, self.policy)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let hits = self
            .client
            .search(query, k, self.nprobe)
            .await
            .map_err(|e| {
                warn!(error = %e, "Remote search failed");
                unavailable(e)
            })?;

        let mut results: Vec<RetrievalResult> = hits
            .into_iter()
            .map(|h| RetrievalResult::new(h.id, h.reference, self.metric.to_l2_distance(h.score)))
            .collect();
        results.sort_by(|a, b| cmp_distance(a.score, b.score).then(a.id.cmp(&b.id)));
        results.truncate(k);

        debug!(metric = %self.metric, k, returned = results.len(), "Remote search complete");
        Ok(results)
    }

    async fn count(&self) -> EvokeResult<usize> {
        self.client.count().await.map_err(unavailable)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn backend(&self) -> IndexBackend {
        IndexBackend::Remote
    }

    async fn ping(&self) -> EvokeResult<()> {
        self.client.ping().await.map_err(unavailable)
    }

    async fn ingest(&self, entries: Vec<CorpusEntry>) -> EvokeResult<usize> {
        for entry in &entries {
            if entry.embedding.len() != self.dimension {
                return Err(EvokeError::dimension_mismatch(
                    format!("ingested entry (id {})", entry.id),
                    self.dimension,
                    entry.embedding.len(),
                ));
            }
        }
        self.client.insert(&entries).await.map_err(unavailable)?;
        let total = self.count().await?;
        info!(added = entries.len(), total, "Ingested entries into remote collection");
        Ok(total)
    }
}
