//! Inverted-file (IVF) approximate index.
//!
//! The corpus is partitioned into `nlist` clusters by k-means. A query scans
//! only the entries of the `nprobe` clusters whose centroids are nearest to
//! it, then ranks those candidates exactly.
//!
//! # Recall
//!
//! `nprobe` is the recall/latency knob: with `nprobe == nlist` every list is
//! scanned and results are identical to [`super::BruteForceIndex`]. Smaller
//! values trade recall for a scan of roughly `N · nprobe / nlist` entries.
//! Both values are clamped to what the corpus supports: `nlist` to the
//! corpus size, `nprobe` to the effective `nlist`.

mod clustering;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use super::{check_query_dimension, rank_candidates, to_results, CorpusIndex};
use crate::config::{DimensionPolicy, IndexBackend, IndexConfig};
use crate::error::{EvokeError, EvokeResult};
use crate::similarity::{l2_distance, squared_l2_distance};
use crate::types::{cmp_distance, Corpus, CorpusEntry, Embedding, RetrievalResult};

/// IVF build and probe parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvfParams {
    /// Requested number of inverted lists.
    pub nlist: usize,
    /// Lists scanned per query.
    pub nprobe: usize,
    /// Lloyd iterations for centroid training.
    pub max_iterations: usize,
}

impl From<&IndexConfig> for IvfParams {
    fn from(config: &IndexConfig) -> Self {
        Self {
            nlist: config.nlist,
            nprobe: config.nprobe,
            max_iterations: config.max_iterations,
        }
    }
}

/// Trained lists over one corpus snapshot.
struct IvfSnapshot {
    corpus: Arc<Corpus>,
    centroids: Vec<Embedding>,
    /// Corpus positions per list, ascending.
    lists: Vec<Vec<usize>>,
    nprobe: usize,
}

impl IvfSnapshot {
    fn train(corpus: Arc<Corpus>, params: IvfParams) -> Self {
        let start = Instant::now();
        let vectors: Vec<&[f32]> = corpus.entries().iter().map(|e| e.embedding.as_slice()).collect();
        let nlist = params.nlist.min(vectors.len());
        let trained = clustering::train(&vectors, nlist, corpus.dimension(), params.max_iterations);

        let mut lists = vec![Vec::new(); trained.centroids.len()];
        for (pos, &list) in trained.assignments.iter().enumerate() {
            lists[list].push(pos);
        }
        let nprobe = params.nprobe.min(trained.centroids.len());

        info!(
            entries = corpus.len(),
            nlist = trained.centroids.len(),
            nprobe,
            iterations = trained.iterations,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trained IVF lists"
        );

        Self {
            corpus,
            centroids: trained.centroids,
            lists,
            nprobe,
        }
    }

    /// Lists to probe for `query`, nearest centroid first.
    fn probe_order(&self, query: &[f32]) -> Vec<usize> {
        let mut order: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(c, centroid)| (c, squared_l2_distance(query, centroid)))
            .collect();
        order.sort_by(|a, b| cmp_distance(a.1, b.1).then(a.0.cmp(&b.0)));
        order.into_iter().take(self.nprobe).map(|(c, _)| c).collect()
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<RetrievalResult> {
        let probed = self.probe_order(query);
        let candidates: Vec<(usize, f32)> = probed
            .iter()
            .flat_map(|&list| self.lists[list].iter())
            .map(|&pos| (pos, l2_distance(query, &self.corpus.entries()[pos].embedding)))
            .collect();

        debug!(
            probed = probed.len(),
            candidates = candidates.len(),
            k,
            "IVF search"
        );
        to_results(&self.corpus, rank_candidates(candidates, k))
    }
}

/// Approximate top-K over k-means inverted lists.
///
/// `ingest_lock` serializes retraining; searches only take the read lock.
pub struct IvfIndex {
    snapshot: RwLock<Arc<IvfSnapshot>>,
    ingest_lock: Mutex<()>,
    params: IvfParams,
    policy: DimensionPolicy,
}

impl IvfIndex {
    /// Train lists over `corpus`.
    ///
    /// # Errors
    ///
    /// - `EvokeError::IndexBuild` if `nlist`, `nprobe` or `max_iterations` is zero
    pub fn build(corpus: Corpus, params: IvfParams, policy: DimensionPolicy) -> EvokeResult<Self> {
        if params.nlist == 0 || params.nprobe == 0 || params.max_iterations == 0 {
            return Err(EvokeError::IndexBuild(format!(
                "IVF parameters must be > 0 (nlist={}, nprobe={}, max_iterations={})",
                params.nlist, params.nprobe, params.max_iterations
            )));
        }
        let snapshot = IvfSnapshot::train(Arc::new(corpus), params);
        Ok(Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            ingest_lock: Mutex::new(()),
            params,
            policy,
        })
    }

    /// Lists actually trained (requested `nlist` clamped to corpus size).
    pub fn effective_nlist(&self) -> usize {
        self.snapshot.read().centroids.len()
    }

    /// Lists probed per query after clamping.
    pub fn effective_nprobe(&self) -> usize {
        self.snapshot.read().nprobe
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.snapshot.read().corpus.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current(&self) -> Arc<IvfSnapshot> {
        Arc::clone(&self.snapshot.read())
    }
}

#[async_trait]
impl CorpusIndex for IvfIndex {
    async fn search(&self, query: &[f32], k: usize) -> EvokeResult<Vec<RetrievalResult>> {
        let snapshot = self.current();
        check_query_dimension(query, snapshot.corpus.dimension(), self.policy)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        Ok(snapshot.search(query, k))
    }

    async fn count(&self) -> EvokeResult<usize> {
        Ok(self.len())
    }

    fn dimension(&self) -> usize {
        self.snapshot.read().corpus.dimension()
    }

    fn backend(&self) -> IndexBackend {
        IndexBackend::Ivf
    }

    async fn ping(&self) -> EvokeResult<()> {
        Ok(())
    }

    /// Retrains every list over the extended corpus before swapping.
    async fn ingest(&self, entries: Vec<CorpusEntry>) -> EvokeResult<usize> {
        let added = entries.len();
        let total = {
            let _guard = self.ingest_lock.lock();
            let corpus = Arc::new(self.current().corpus.extended(entries)?);
            let next = IvfSnapshot::train(corpus, self.params);
            let total = next.corpus.len();
            *self.snapshot.write() = Arc::new(next);
            total
        };
        info!(added, total, "Ingested entries into IVF index");
        Ok(total)
    }
}
