//! Dense vector distance primitives.
//!
//! Distances here compare only the overlapping prefix of the two vectors.
//! Whether a length mismatch is allowed to reach these functions is decided
//! upstream by [`crate::config::DimensionPolicy`].

/// Calculate L2 norm (magnitude) of a vector.
///
/// # Example
/// ```
/// use evoke_core::similarity::l2_norm;
///
/// let norm = l2_norm(&[3.0, 4.0]);
/// assert!((norm - 5.0).abs() < 1e-6);
/// ```
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize a vector to unit length in-place.
///
/// Only an exactly-zero norm is skipped; the vector is then left untouched.
/// Returns whether normalization was applied.
///
/// # Example
/// ```
/// use evoke_core::similarity::normalize;
///
/// let mut v = vec![3.0, 4.0];
/// assert!(normalize(&mut v));
/// assert!((v[0] - 0.6).abs() < 1e-6);
///
/// let mut zero = vec![0.0, 0.0];
/// assert!(!normalize(&mut zero));
/// assert_eq!(zero, vec![0.0, 0.0]);
/// ```
#[inline]
pub fn normalize(v: &mut [f32]) -> bool {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

/// Squared Euclidean distance over the shared prefix of `a` and `b`.
#[inline]
pub fn squared_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance over the shared prefix of `a` and `b`.
///
/// Components beyond the shorter vector's length are ignored.
///
/// # Example
/// ```
/// use evoke_core::similarity::l2_distance;
///
/// assert!((l2_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
/// // Only the first component is compared.
/// assert_eq!(l2_distance(&[1.0], &[1.0, 9.0]), 0.0);
/// ```
#[inline]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    squared_l2_distance(a, b).sqrt()
}
