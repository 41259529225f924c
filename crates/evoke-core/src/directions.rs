//! Direction table: per-axis steering vectors.
//!
//! One vector per mood axis, each pointing from the "low" pole of the axis to
//! its "high" pole in the shared embedding space. Loaded once at startup and
//! shared read-only by every request.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EvokeError, EvokeResult};
use crate::types::{first_non_finite, Embedding, MoodAxis};

/// Steering vectors for the four mood axes.
///
/// Vectors may be shorter than the embedding dimension; a short vector only
/// steers the dimensions it covers. Vectors longer than the configured
/// dimension are rejected at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionTable {
    pub energy: Embedding,
    pub valence: Embedding,
    pub tempo: Embedding,
    pub texture: Embedding,
}

impl DirectionTable {
    pub fn new(energy: Embedding, valence: Embedding, tempo: Embedding, texture: Embedding) -> Self {
        Self {
            energy,
            valence,
            tempo,
            texture,
        }
    }

    /// Table whose four vectors are all zero: refinement only normalizes.
    pub fn zeros(dimension: usize) -> Self {
        Self::new(
            vec![0.0; dimension],
            vec![0.0; dimension],
            vec![0.0; dimension],
            vec![0.0; dimension],
        )
    }

    /// Direction vector for one axis.
    #[inline]
    pub fn get(&self, axis: MoodAxis) -> &[f32] {
        match axis {
            MoodAxis::Energy => &self.energy,
            MoodAxis::Valence => &self.valence,
            MoodAxis::Tempo => &self.tempo,
            MoodAxis::Texture => &self.texture,
        }
    }

    /// Check the table against the configured embedding dimension.
    ///
    /// # Errors
    ///
    /// - `EvokeError::DimensionMismatch` if any vector is longer than `dimension`
    /// - `EvokeError::NonFiniteValue` if any component is NaN or infinite
    pub fn validate(&self, dimension: usize) -> EvokeResult<()> {
        for axis in MoodAxis::ALL {
            let v = self.get(axis);
            let context = format!("direction vector '{}'", axis);
            if v.len() > dimension {
                return Err(EvokeError::dimension_mismatch(context, dimension, v.len()));
            }
            if let Some(index) = first_non_finite(v) {
                return Err(EvokeError::NonFiniteValue { context, index });
            }
            if v.len() < dimension {
                warn!(
                    axis = %axis,
                    len = v.len(),
                    dimension,
                    "Direction vector shorter than embedding dimension; trailing dimensions are not steered"
                );
            }
        }
        debug!(dimension, "Direction table validated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_axis() {
        let table = DirectionTable::new(vec![1.0], vec![2.0], vec![3.0], vec![4.0]);
        assert_eq!(table.get(MoodAxis::Energy), &[1.0]);
        assert_eq!(table.get(MoodAxis::Valence), &[2.0]);
        assert_eq!(table.get(MoodAxis::Tempo), &[3.0]);
        assert_eq!(table.get(MoodAxis::Texture), &[4.0]);
    }

    #[test]
    fn test_zeros() {
        let table = DirectionTable::zeros(3);
        for axis in MoodAxis::ALL {
            assert_eq!(table.get(axis), &[0.0, 0.0, 0.0]);
        }
        assert!(table.validate(3).is_ok());
    }

    #[test]
    fn test_validate_accepts_shorter_vectors() {
        let table = DirectionTable::new(vec![1.0], vec![], vec![0.5, 0.5], vec![0.0; 4]);
        assert!(table.validate(4).is_ok());
    }

    #[test]
    fn test_validate_rejects_longer_vectors() {
        let table = DirectionTable::new(vec![0.0; 2], vec![0.0; 2], vec![0.0; 3], vec![0.0; 2]);
        match table.validate(2).unwrap_err() {
            EvokeError::DimensionMismatch {
                context,
                expected,
                actual,
            } => {
                assert!(context.contains("tempo"));
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let table = DirectionTable::new(vec![0.0, f32::NAN], vec![], vec![], vec![]);
        assert!(matches!(
            table.validate(2).unwrap_err(),
            EvokeError::NonFiniteValue { index: 1, .. }
        ));
    }

    #[test]
    fn test_deserialize_payload_shape() {
        let json = r#"{"energy":[1.0,0.0],"valence":[0.0,1.0],"tempo":[0.0,0.0],"texture":[0.5,0.5]}"#;
        let table: DirectionTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.texture, vec![0.5, 0.5]);
    }
}
