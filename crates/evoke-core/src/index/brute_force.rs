//! Exact linear-scan index. Reference implementation for every other backend.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tracing::{debug, info};

use super::{check_query_dimension, rank_candidates, to_results, CorpusIndex};
use crate::config::{DimensionPolicy, IndexBackend};
use crate::error::EvokeResult;
use crate::similarity::l2_distance;
use crate::types::{Corpus, CorpusEntry, RetrievalResult};

/// Corpora at least this large are scanned with rayon.
const PARALLEL_SCAN_THRESHOLD: usize = 2048;

/// Exact top-K by scanning every entry.
///
/// Searches only take the snapshot read lock. Ingestion holds `ingest_lock`
/// from reading the current snapshot until the extended one is published,
/// so concurrent ingests never drop each other's entries.
pub struct BruteForceIndex {
    snapshot: RwLock<Arc<Corpus>>,
    ingest_lock: Mutex<()>,
    policy: DimensionPolicy,
}

impl BruteForceIndex {
    pub fn new(corpus: Corpus, policy: DimensionPolicy) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(corpus)),
            ingest_lock: Mutex::new(()),
            policy,
        }
    }

    /// Current corpus snapshot.
    pub fn snapshot(&self) -> Arc<Corpus> {
        Arc::clone(&self.snapshot.read())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synchronous search against the current snapshot.
    pub fn search_sync(&self, query: &[f32], k: usize) -> EvokeResult<Vec<RetrievalResult>> {
        let corpus = self.snapshot();
        check_query_dimension(query, corpus.dimension(), self.policy)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let entries = corpus.entries();
        let distances: Vec<(usize, f32)> = if entries.len() >= PARALLEL_SCAN_THRESHOLD {
            entries
                .par_iter()
                .enumerate()
                .map(|(pos, e)| (pos, l2_distance(query, &e.embedding)))
                .collect()
        } else {
            entries
                .iter()
                .enumerate()
                .map(|(pos, e)| (pos, l2_distance(query, &e.embedding)))
                .collect()
        };

        let ranked = rank_candidates(distances, k);
        debug!(
            scanned = entries.len(),
            k,
            returned = ranked.len(),
            "Brute-force search complete"
        );
        Ok(to_results(&corpus, ranked))
    }
}

#[async_trait]
impl CorpusIndex for BruteForceIndex {
    async fn search(&self, query: &[f32], k: usize) -> EvokeResult<Vec<RetrievalResult>> {
        self.search_sync(query, k)
    }

    async fn count(&self) -> EvokeResult<usize> {
        Ok(self.len())
    }

    fn dimension(&self) -> usize {
        self.snapshot.read().dimension()
    }

    fn backend(&self) -> IndexBackend {
        IndexBackend::BruteForce
    }

    async fn ping(&self) -> EvokeResult<()> {
        Ok(())
    }

    async fn ingest(&self, entries: Vec<CorpusEntry>) -> EvokeResult<usize> {
        let added = entries.len();
        let total = {
            let _guard = self.ingest_lock.lock();
            let next = Arc::new(self.snapshot().extended(entries)?);
            let total = next.len();
            *self.snapshot.write() = next;
            total
        };
        info!(added, total, "Ingested entries into brute-force index");
        Ok(total)
    }
}
