//! Image corpus: the fixed, ordered collection searched against.

use serde::{Deserialize, Serialize};

use super::{first_non_finite, Embedding};
use crate::error::{EvokeError, EvokeResult};

/// Corpus entry identifier.
pub type EntryId = u64;

/// One image in the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Stable identifier reported in results.
    pub id: EntryId,
    /// Display reference, typically an image URL.
    pub reference: String,
    /// Image embedding in the shared space.
    pub embedding: Embedding,
}

impl CorpusEntry {
    pub fn new(id: EntryId, reference: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            id,
            reference: reference.into(),
            embedding,
        }
    }
}

/// Immutable, validated corpus snapshot.
///
/// Entry order is load order and doubles as the tie-break order for equal
/// distances. A `Corpus` is never mutated once built; ingestion produces a
/// new snapshot via [`Corpus::extended`].
#[derive(Debug, Clone)]
pub struct Corpus {
    dimension: usize,
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Build a corpus, validating every embedding against `dimension`.
    ///
    /// # Errors
    ///
    /// - `EvokeError::InvalidConfig` if `dimension` is zero
    /// - `EvokeError::DimensionMismatch` if an entry has a different length
    /// - `EvokeError::NonFiniteValue` if an entry contains NaN or infinity
    pub fn new(dimension: usize, entries: Vec<CorpusEntry>) -> EvokeResult<Self> {
        if dimension == 0 {
            return Err(EvokeError::InvalidConfig(
                "corpus dimension must be > 0".to_string(),
            ));
        }
        for (pos, entry) in entries.iter().enumerate() {
            Self::validate_entry(dimension, pos, entry)?;
        }
        Ok(Self { dimension, entries })
    }

    /// Empty corpus of the given dimension.
    pub fn empty(dimension: usize) -> EvokeResult<Self> {
        Self::new(dimension, Vec::new())
    }

    fn validate_entry(dimension: usize, pos: usize, entry: &CorpusEntry) -> EvokeResult<()> {
        if entry.embedding.len() != dimension {
            return Err(EvokeError::dimension_mismatch(
                format!("corpus entry {} (id {})", pos, entry.id),
                dimension,
                entry.embedding.len(),
            ));
        }
        if let Some(index) = first_non_finite(&entry.embedding) {
            return Err(EvokeError::NonFiniteValue {
                context: format!("corpus entry {} (id {})", pos, entry.id),
                index,
            });
        }
        Ok(())
    }

    /// New snapshot with `more` appended after the existing entries.
    pub fn extended(&self, more: Vec<CorpusEntry>) -> EvokeResult<Self> {
        let offset = self.entries.len();
        for (i, entry) in more.iter().enumerate() {
            Self::validate_entry(self.dimension, offset + i, entry)?;
        }
        let mut entries = Vec::with_capacity(offset + more.len());
        entries.extend_from_slice(&self.entries);
        entries.extend(more);
        Ok(Self {
            dimension: self.dimension,
            entries,
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    #[inline]
    pub fn get(&self, pos: usize) -> Option<&CorpusEntry> {
        self.entries.get(pos)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
