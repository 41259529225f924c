//! Domain types shared by every engine component.
//!
//! - [`Embedding`]: dense `f32` vector in the shared audio/image space
//! - [`MoodVector`] / [`MoodAxis`]: the four user-facing steering scalars
//! - [`CorpusEntry`] / [`Corpus`]: the immutable image collection
//! - [`RetrievalResult`]: one ranked hit, produced fresh per query

mod corpus;
mod mood;
mod result;

pub use corpus::{Corpus, CorpusEntry, EntryId};
pub use mood::{MoodAxis, MoodVector};
pub use result::RetrievalResult;
pub(crate) use result::cmp_distance;

/// Dense embedding vector.
///
/// All embeddings compared with each other are expected to share one
/// dimension; see [`crate::config::DimensionPolicy`] for what happens when
/// they do not.
pub type Embedding = Vec<f32>;

/// Embedding dimension produced by the audio analyzer and the image corpus.
pub const DEFAULT_EMBEDDING_DIM: usize = 512;

/// Return the index of the first non-finite component, if any.
#[inline]
pub(crate) fn first_non_finite(v: &[f32]) -> Option<usize> {
    v.iter().position(|x| !x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_finite() {
        assert_eq!(first_non_finite(&[0.0, 1.0, 2.0]), None);
        assert_eq!(first_non_finite(&[0.0, f32::NAN, 2.0]), Some(1));
        assert_eq!(first_non_finite(&[f32::INFINITY]), Some(0));
        assert_eq!(first_non_finite(&[]), None);
    }
}
