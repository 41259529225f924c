//! End-to-end retrieval and refinement scenarios.
//!
//! Covers:
//! 1. Nearest-two search over a three-entry corpus
//! 2. Energy-only refinement of a zero base
//! 3. All-zero refinement (normalization skipped)
//! 4. Ordering properties across every backend
//! 5. Repeated refinement drifts (no fixed point)

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use evoke_core::config::{DimensionPolicy, EngineConfig};
use evoke_core::directions::DirectionTable;
use evoke_core::engine::{MoodRetrievalEngine, RequestContext};
use evoke_core::index::{
    BruteForceIndex, CorpusIndex, IvfIndex, IvfParams, RemoteIndex, RemoteMetric,
};
use evoke_core::refine::{refine_embedding, EmbeddingRefiner};
use evoke_core::similarity::{l2_norm, normalize};
use evoke_core::stubs::InMemoryVectorDbClient;
use evoke_core::types::{Corpus, CorpusEntry, MoodVector};

fn scenario_entries() -> Vec<CorpusEntry> {
    vec![
        CorpusEntry::new(0, "img/0.jpg", vec![1.0, 0.0]),
        CorpusEntry::new(1, "img/1.jpg", vec![0.0, 1.0]),
        CorpusEntry::new(2, "img/2.jpg", vec![0.9, 0.1]),
    ]
}

fn energy_table() -> DirectionTable {
    DirectionTable::new(vec![1.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0])
}

fn random_entries(rng: &mut ChaCha8Rng, n: usize, dim: usize) -> Vec<CorpusEntry> {
    (0..n)
        .map(|i| {
            let mut v: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
            normalize(&mut v);
            CorpusEntry::new(i as u64, format!("img/{}.jpg", i), v)
        })
        .collect()
}

/// Every backend over the same entries, with IVF probing every list.
fn all_backends(entries: Vec<CorpusEntry>, dim: usize) -> Vec<Arc<dyn CorpusIndex>> {
    let corpus = Corpus::new(dim, entries.clone()).unwrap();
    let nlist = 4;
    let client = Arc::new(InMemoryVectorDbClient::with_entries(RemoteMetric::SquaredL2, entries));
    vec![
        Arc::new(BruteForceIndex::new(corpus.clone(), DimensionPolicy::Truncate)),
        Arc::new(
            IvfIndex::build(
                corpus,
                IvfParams {
                    nlist,
                    nprobe: nlist,
                    max_iterations: 25,
                },
                DimensionPolicy::Truncate,
            )
            .unwrap(),
        ),
        Arc::new(RemoteIndex::new(
            client,
            RemoteMetric::SquaredL2,
            dim,
            nlist,
            DimensionPolicy::Truncate,
        )),
    ]
}

#[tokio::test]
async fn scenario_nearest_two() {
    println!("\n=== SCENARIO 1: nearest two of three ===");
    for index in all_backends(scenario_entries(), 2) {
        let results = index.search(&[1.0, 0.0], 2).await.unwrap();
        println!("{}: {:?}", index.backend(), results);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 0);
        assert!(results[0].score.abs() < 1e-6);
        assert_eq!(results[1].id, 2);
        assert!(
            (results[1].score - 0.141_421_36).abs() < 1e-5,
            "{}: d = {}",
            index.backend(),
            results[1].score
        );
    }
}

#[test]
fn scenario_energy_only_refinement() {
    println!("\n=== SCENARIO 2: energy=1.0 on zero base ===");
    let refined = refine_embedding(&energy_table(), &[0.0, 0.0], &MoodVector::new(1.0, 0.5, 0.5, 0.5));
    println!("refined = {:?}", refined);
    assert!((refined[0] - 1.0).abs() < 1e-6);
    assert!(refined[1].abs() < 1e-6);
}

#[test]
fn scenario_all_zero_refinement() {
    println!("\n=== SCENARIO 3: all-zero base and directions ===");
    let refined = refine_embedding(
        &DirectionTable::zeros(4),
        &[0.0; 4],
        &MoodVector::new(0.9, 0.1, 0.8, 0.2),
    );
    assert_eq!(refined, vec![0.0; 4]);
    assert!(refined.iter().all(|x| !x.is_nan()));
}

#[tokio::test]
async fn property_k_zero_is_empty_everywhere() {
    for index in all_backends(scenario_entries(), 2) {
        assert!(index.search(&[0.3, 0.7], 0).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn property_large_k_returns_full_sorted_corpus() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let entries = random_entries(&mut rng, 40, 8);
    let query: Vec<f32> = (0..8).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let mut reference = None;
    for index in all_backends(entries, 8) {
        let results = index.search(&query, 1000).await.unwrap();
        assert_eq!(results.len(), 40);
        assert!(results.windows(2).all(|w| w[0].score <= w[1].score));

        let ids: Vec<_> = results.iter().map(|r| r.id).collect();
        match &reference {
            None => reference = Some(ids),
            Some(expected) => assert_eq!(&ids, expected, "{} disagrees", index.backend()),
        }
    }
}

#[tokio::test]
async fn property_ties_keep_load_order() {
    let entries: Vec<_> = (0..6)
        .map(|i| CorpusEntry::new(i, format!("dup/{}", i), vec![0.5, 0.5]))
        .collect();
    for index in all_backends(entries, 2) {
        let ids: Vec<_> = index
            .search(&[0.0, 1.0], 6)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5], "{}", index.backend());
    }
}

#[test]
fn property_neutral_refinement_is_normalization() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let dim = 32;
    let table = DirectionTable::new(
        (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect(),
        (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect(),
        (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect(),
        (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect(),
    );
    for _ in 0..20 {
        let base: Vec<f32> = (0..dim).map(|_| rng.gen_range(-5.0..5.0)).collect();
        let mut expected = base.clone();
        normalize(&mut expected);
        let refined = refine_embedding(&table, &base, &MoodVector::neutral());
        for (a, b) in refined.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}

#[test]
fn property_refined_output_is_unit_norm_and_deterministic() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let dim = 16;
    let table = DirectionTable::new(
        (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect(),
        (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect(),
        (0..dim / 2).map(|_| rng.gen_range(-1.0..1.0)).collect(),
        Vec::new(),
    );
    let refiner = EmbeddingRefiner::new(Arc::new(table));
    for _ in 0..50 {
        let base: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mood = MoodVector::new(rng.gen(), rng.gen(), rng.gen(), rng.gen());
        let a = refiner.refine(&base, &mood);
        let b = refiner.refine(&base, &mood);
        assert_eq!(a, b);
        assert_eq!(a.len(), dim);
        assert!((l2_norm(&a) - 1.0).abs() < 1e-5);
    }
}

/// Refining an already-refined vector at the same mood moves it again.
///
/// base = [0, 1], energy direction = [1, 0], energy = 1.0:
/// - first pass:  [0.1, 1.0] / 1.004988  → [0.099504, 0.995037]
/// - second pass: [0.199504, 0.995037] / 1.014841 → [0.196586, 0.980487]
///
/// Dimension 0 grows by about 0.0971 on the second pass.
#[test]
fn property_refinement_is_not_idempotent() {
    let mood = MoodVector::new(1.0, 0.5, 0.5, 0.5);
    let table = energy_table();
    let once = refine_embedding(&table, &[0.0, 1.0], &mood);
    let twice = refine_embedding(&table, &once, &mood);

    println!("once = {:?}, twice = {:?}", once, twice);
    assert!((once[0] - 0.099_504).abs() < 1e-5);
    assert!((twice[0] - 0.196_586).abs() < 1e-5);

    let delta = twice[0] - once[0];
    assert!((delta - 0.097_08).abs() < 1e-4, "delta = {}", delta);
    assert_ne!(once, twice);
}

#[tokio::test]
async fn engine_refine_and_retrieve_matches_manual_composition() {
    let corpus = Corpus::new(2, scenario_entries()).unwrap();
    let index: Arc<dyn CorpusIndex> = Arc::new(BruteForceIndex::new(corpus, DimensionPolicy::Truncate));
    let refiner = EmbeddingRefiner::new(Arc::new(energy_table()));
    let engine = MoodRetrievalEngine::new(refiner.clone(), index.clone(), EngineConfig::default());

    let base = [0.2, 0.8];
    let mood = MoodVector::new(0.9, 0.5, 0.5, 0.5);
    let ctx = RequestContext::unbounded();
    let out = engine.refine_and_retrieve(&ctx, &base, &mood, 3).await.unwrap();

    let manual = refiner.refine(&base, &mood);
    assert_eq!(out.embedding, manual);
    assert_eq!(out.results, index.search(&manual, 3).await.unwrap());
}
