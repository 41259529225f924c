//! Corpus index: top-K nearest-image search.
//!
//! One capability, [`CorpusIndex`], with three implementations selected at
//! startup by [`IndexBackend`]:
//!
//! | Backend | Type | Search |
//! |---------|------|--------|
//! | `brute_force` | [`BruteForceIndex`] | exact O(N·D) scan (reference) |
//! | `ivf` | [`IvfIndex`] | k-means inverted lists, `nprobe` of `nlist` probed |
//! | `remote` | [`RemoteIndex`] | external vector database via [`VectorDbClient`] |
//!
//! # Ordering contract
//!
//! Every backend reports `score` as the Euclidean distance to the query and
//! returns results ascending by score. Equal distances keep corpus load
//! order. `k = 0` yields an empty result and `k >= len` yields everything.
//!
//! # Snapshots
//!
//! In-process backends hold their corpus behind `RwLock<Arc<_>>`. A search
//! clones the `Arc` once and works on that snapshot, so an administrative
//! [`CorpusIndex::ingest`] is never visible to a search already in flight.

mod brute_force;
mod ivf;
mod remote;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

pub use brute_force::BruteForceIndex;
pub use ivf::{IvfIndex, IvfParams};
pub use remote::{RemoteHit, RemoteIndex, RemoteMetric, VectorDbClient};

use crate::config::{DimensionPolicy, EvokeConfig, IndexBackend};
use crate::error::{EvokeError, EvokeResult};
use crate::types::{cmp_distance, Corpus, CorpusEntry, RetrievalResult};

/// Top-K similarity search over the image corpus.
#[async_trait]
pub trait CorpusIndex: Send + Sync {
    /// Return the `k` entries nearest to `query`, best first.
    ///
    /// # Errors
    ///
    /// - `EvokeError::CorpusUnavailable` if the backing store cannot answer
    /// - `EvokeError::DimensionMismatch` if the query length differs from the
    ///   corpus dimension under [`DimensionPolicy::Reject`]
    async fn search(&self, query: &[f32], k: usize) -> EvokeResult<Vec<RetrievalResult>>;

    /// Number of entries currently searchable.
    async fn count(&self) -> EvokeResult<usize>;

    /// Embedding dimension of the corpus.
    fn dimension(&self) -> usize;

    /// Which backend this is.
    fn backend(&self) -> IndexBackend;

    /// Check that the index can answer queries.
    async fn ping(&self) -> EvokeResult<()>;

    /// Append entries and publish a new snapshot.
    ///
    /// Administrative operation. Returns the entry count after ingestion.
    async fn ingest(&self, entries: Vec<CorpusEntry>) -> EvokeResult<usize>;
}

/// Build the configured backend.
///
/// `corpus` seeds the in-process backends. The remote backend searches
/// whatever the database already holds and needs `remote_client`.
///
/// # Errors
///
/// - `EvokeError::IndexBuild` if the remote backend is selected without a client
/// - `EvokeError::DimensionMismatch` if the corpus dimension differs from config
pub fn build_index(
    config: &EvokeConfig,
    corpus: Corpus,
    remote_client: Option<Arc<dyn VectorDbClient>>,
) -> EvokeResult<Arc<dyn CorpusIndex>> {
    let index_cfg = &config.index;
    if corpus.dimension() != index_cfg.dimension {
        return Err(EvokeError::dimension_mismatch(
            "corpus",
            index_cfg.dimension,
            corpus.dimension(),
        ));
    }

    let index: Arc<dyn CorpusIndex> = match index_cfg.backend {
        IndexBackend::BruteForce => {
            Arc::new(BruteForceIndex::new(corpus, index_cfg.dimension_policy))
        }
        IndexBackend::Ivf => Arc::new(IvfIndex::build(
            corpus,
            IvfParams::from(index_cfg),
            index_cfg.dimension_policy,
        )?),
        IndexBackend::Remote => {
            let client = remote_client.ok_or_else(|| {
                EvokeError::IndexBuild(
                    "remote backend selected but no vector database client was supplied".to_string(),
                )
            })?;
            Arc::new(RemoteIndex::new(
                client,
                config.remote.metric,
                index_cfg.dimension,
                index_cfg.nprobe,
                index_cfg.dimension_policy,
            ))
        }
    };

    info!(
        backend = %index.backend(),
        dimension = index.dimension(),
        "Corpus index ready"
    );
    Ok(index)
}

/// Enforce the dimension policy on an incoming query.
pub(crate) fn check_query_dimension(
    query: &[f32],
    dimension: usize,
    policy: DimensionPolicy,
) -> EvokeResult<()> {
    if policy == DimensionPolicy::Reject && query.len() != dimension {
        return Err(EvokeError::dimension_mismatch("query", dimension, query.len()));
    }
    Ok(())
}

/// Order `(position, distance)` candidates ascending by distance, ties by
/// position, and keep the best `k`.
pub(crate) fn rank_candidates(mut candidates: Vec<(usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    let cmp = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
        cmp_distance(a.1, b.1).then(a.0.cmp(&b.0))
    };

    if k == 0 {
        return Vec::new();
    }
    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, cmp);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(cmp);
    candidates
}

/// Turn ranked positions into results against the snapshot they came from.
pub(crate) fn to_results(corpus: &Corpus, ranked: Vec<(usize, f32)>) -> Vec<RetrievalResult> {
    ranked
        .into_iter()
        .filter_map(|(pos, distance)| {
            corpus
                .get(pos)
                .map(|entry| RetrievalResult::new(entry.id, entry.reference.clone(), distance))
        })
        .collect()
}
