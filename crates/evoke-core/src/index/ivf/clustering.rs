//! Centroid training for the inverted-file index.
//!
//! Deterministic k-means: farthest-point k-means++ seeding followed by Lloyd
//! iterations. Same input, same centroids.

use rayon::prelude::*;

use crate::similarity::squared_l2_distance;
use crate::types::{cmp_distance, Embedding};

/// Points at or above this count are assigned in parallel.
const PARALLEL_ASSIGN_THRESHOLD: usize = 1024;

/// Trained partition of a set of vectors.
#[derive(Debug, Clone)]
pub(crate) struct Clustering {
    pub centroids: Vec<Embedding>,
    pub assignments: Vec<usize>,
    pub iterations: usize,
}

/// Seed `k` centroids with deterministic k-means++.
///
/// The first centroid is the first vector. Each next centroid is the vector
/// farthest from its nearest existing centroid. When every remaining vector
/// coincides with a centroid, the first vector not yet chosen is taken.
pub(crate) fn kmeans_plus_plus_init(vectors: &[&[f32]], k: usize) -> Vec<Embedding> {
    let n = vectors.len();
    let k = k.min(n);
    let mut centroids: Vec<Embedding> = Vec::with_capacity(k);
    if k == 0 {
        return centroids;
    }

    let mut chosen = vec![false; n];
    chosen[0] = true;
    centroids.push(vectors[0].to_vec());
    let mut min_distances = vec![f32::MAX; n];

    while centroids.len() < k {
        let last = &centroids[centroids.len() - 1];
        for (i, v) in vectors.iter().enumerate() {
            let d = squared_l2_distance(v, last);
            if d < min_distances[i] {
                min_distances[i] = d;
            }
        }

        let farthest = min_distances
            .iter()
            .enumerate()
            .filter(|(i, d)| !chosen[*i] && **d > 0.0)
            .max_by(|(ia, a), (ib, b)| cmp_distance(**a, **b).then(ib.cmp(ia)))
            .map(|(i, _)| i);

        let next = match farthest.or_else(|| chosen.iter().position(|c| !c)) {
            Some(i) => i,
            None => break,
        };
        chosen[next] = true;
        centroids.push(vectors[next].to_vec());
    }

    centroids
}

/// Index of the centroid nearest to `v`; ties go to the lower index.
pub(crate) fn nearest_centroid(v: &[f32], centroids: &[Embedding]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::MAX;
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_l2_distance(v, centroid);
        if d < best_distance {
            best = c;
            best_distance = d;
        }
    }
    best
}

fn assign(vectors: &[&[f32]], centroids: &[Embedding]) -> Vec<usize> {
    if vectors.len() >= PARALLEL_ASSIGN_THRESHOLD {
        vectors
            .par_iter()
            .map(|v| nearest_centroid(v, centroids))
            .collect()
    } else {
        vectors
            .iter()
            .map(|v| nearest_centroid(v, centroids))
            .collect()
    }
}

/// Mean of the assigned points per cluster. An empty cluster keeps its
/// previous centroid.
fn compute_centroids(
    vectors: &[&[f32]],
    assignments: &[usize],
    previous: &[Embedding],
    dimension: usize,
) -> Vec<Embedding> {
    let k = previous.len();
    let mut sums = vec![vec![0.0f32; dimension]; k];
    let mut counts = vec![0usize; k];

    for (v, &cluster) in vectors.iter().zip(assignments) {
        counts[cluster] += 1;
        for (s, x) in sums[cluster].iter_mut().zip(v.iter()) {
            *s += x;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((mut sum, count), prev)| {
            if count == 0 {
                return prev.clone();
            }
            for s in sum.iter_mut() {
                *s /= count as f32;
            }
            sum
        })
        .collect()
}

/// Partition `vectors` into at most `k` clusters.
///
/// Stops when assignments no longer change or after `max_iterations`.
pub(crate) fn train(vectors: &[&[f32]], k: usize, dimension: usize, max_iterations: usize) -> Clustering {
    let mut centroids = kmeans_plus_plus_init(vectors, k);
    if centroids.is_empty() {
        return Clustering {
            centroids,
            assignments: Vec::new(),
            iterations: 0,
        };
    }

    let mut assignments = assign(vectors, &centroids);
    let mut iterations = 0;
    while iterations < max_iterations {
        iterations += 1;
        centroids = compute_centroids(vectors, &assignments, &centroids, dimension);
        let next = assign(vectors, &centroids);
        if next == assignments {
            break;
        }
        assignments = next;
    }

    Clustering {
        centroids,
        assignments,
        iterations,
    }
}
