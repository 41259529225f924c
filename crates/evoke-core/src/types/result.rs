//! Ranked retrieval hit.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::EntryId;

/// One result from a top-K corpus query.
///
/// `score` is the Euclidean (L2) distance between the query and the entry:
/// lower = more similar. Every backend reports this same quantity so callers
/// never need to know which backend answered.
///
/// The serialized form matches the board payload
/// (`{"id": .., "image_url": .., "score": ..}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Corpus entry identifier
    pub id: EntryId,
    /// Display reference (image URL)
    #[serde(rename = "image_url")]
    pub reference: String,
    /// L2 distance from the query (lower = more similar)
    pub score: f32,
}

impl RetrievalResult {
    #[inline]
    pub fn new(id: EntryId, reference: impl Into<String>, score: f32) -> Self {
        Self {
            id,
            reference: reference.into(),
            score,
        }
    }
}

/// Total order on distances with NaN treated as worst.
#[inline]
pub(crate) fn cmp_distance(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmp_distance_nan_last() {
        assert_eq!(cmp_distance(0.1, 0.2), Ordering::Less);
        assert_eq!(cmp_distance(0.2, 0.2), Ordering::Equal);
        assert_eq!(cmp_distance(f32::NAN, 5.0), Ordering::Greater);
        assert_eq!(cmp_distance(5.0, f32::NAN), Ordering::Less);
    }

    #[test]
    fn test_serde_uses_image_url() {
        let result = RetrievalResult::new(4, "https://img/4.jpg", 0.25);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"image_url\":\"https://img/4.jpg\""));

        let back: RetrievalResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
