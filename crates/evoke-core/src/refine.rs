//! Embedding refiner: steers an embedding along the mood axes.
//!
//! # Algorithm
//!
//! ```text
//! adjustment[i] = E[i]·(energy−0.5)·0.2  + V[i]·(valence−0.5)·0.2
//!               + T[i]·(tempo−0.5)·0.15  + X[i]·(texture−0.5)·0.15
//! refined[i]    = base[i] + adjustment[i]
//! refined       = refined / ||refined||      (skipped when the norm is 0)
//! ```
//!
//! A direction term contributes only for indices inside that direction
//! vector. The refiner is a pure function over in-memory data: it never
//! blocks, never fails and needs no synchronization.

use std::sync::Arc;

use tracing::trace;

use crate::config::constants::weights;
use crate::directions::DirectionTable;
use crate::similarity::normalize;
use crate::types::{Embedding, MoodAxis, MoodVector};

/// Weight applied to an axis offset.
#[inline]
pub fn axis_weight(axis: MoodAxis) -> f32 {
    match axis {
        MoodAxis::Energy => weights::ENERGY,
        MoodAxis::Valence => weights::VALENCE,
        MoodAxis::Tempo => weights::TEMPO,
        MoodAxis::Texture => weights::TEXTURE,
    }
}

/// Refine `base` toward `mood` using the given direction table.
///
/// Output has the same length as `base`. With every axis at 0.5 the result
/// is the L2-normalization of `base`.
pub fn refine_embedding(directions: &DirectionTable, base: &[f32], mood: &MoodVector) -> Embedding {
    let mut refined = base.to_vec();

    for (i, value) in refined.iter_mut().enumerate() {
        let mut adjustment = 0.0f32;
        for axis in MoodAxis::ALL {
            if let Some(d) = directions.get(axis).get(i) {
                adjustment += d * mood.offset(axis) * axis_weight(axis);
            }
        }
        *value += adjustment;
    }

    let normalized = normalize(&mut refined);
    trace!(dimension = refined.len(), normalized, "Refined embedding");
    refined
}

/// Refiner bound to a shared direction table.
///
/// Cheap to clone; every clone shares the same table.
#[derive(Debug, Clone)]
pub struct EmbeddingRefiner {
    directions: Arc<DirectionTable>,
}

impl EmbeddingRefiner {
    pub fn new(directions: Arc<DirectionTable>) -> Self {
        Self { directions }
    }

    #[inline]
    pub fn directions(&self) -> &DirectionTable {
        &self.directions
    }

    /// See [`refine_embedding`].
    #[inline]
    pub fn refine(&self, base: &[f32], mood: &MoodVector) -> Embedding {
        refine_embedding(&self.directions, base, mood)
    }
}
