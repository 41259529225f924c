//! Mood vector: the four steering scalars behind the board sliders.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::constants::mood::NEUTRAL;
use crate::config::MoodRangePolicy;
use crate::error::{EvokeError, EvokeResult};

/// One of the four named mood axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodAxis {
    Energy,
    Valence,
    Tempo,
    Texture,
}

impl MoodAxis {
    /// All axes in canonical order.
    pub const ALL: [MoodAxis; 4] = [
        MoodAxis::Energy,
        MoodAxis::Valence,
        MoodAxis::Tempo,
        MoodAxis::Texture,
    ];

    /// Lowercase axis name as used in data files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Valence => "valence",
            Self::Tempo => "tempo",
            Self::Texture => "texture",
        }
    }
}

impl fmt::Display for MoodAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four mood scalars, each nominally in [0, 1] with 0.5 as neutral.
///
/// The serialized field names match the session and board payloads
/// (`mood_energy`, `mood_valence`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodVector {
    #[serde(rename = "mood_energy")]
    pub energy: f32,
    #[serde(rename = "mood_valence")]
    pub valence: f32,
    #[serde(rename = "mood_tempo")]
    pub tempo: f32,
    #[serde(rename = "mood_texture")]
    pub texture: f32,
}

impl Default for MoodVector {
    fn default() -> Self {
        Self::neutral()
    }
}

impl MoodVector {
    /// Create a mood vector from explicit scalars.
    pub fn new(energy: f32, valence: f32, tempo: f32, texture: f32) -> Self {
        Self {
            energy,
            valence,
            tempo,
            texture,
        }
    }

    /// All four axes at 0.5. Refinement with this mood only normalizes.
    pub fn neutral() -> Self {
        Self::new(NEUTRAL, NEUTRAL, NEUTRAL, NEUTRAL)
    }

    /// Scalar for one axis.
    #[inline]
    pub fn get(&self, axis: MoodAxis) -> f32 {
        match axis {
            MoodAxis::Energy => self.energy,
            MoodAxis::Valence => self.valence,
            MoodAxis::Tempo => self.tempo,
            MoodAxis::Texture => self.texture,
        }
    }

    fn get_mut(&mut self, axis: MoodAxis) -> &mut f32 {
        match axis {
            MoodAxis::Energy => &mut self.energy,
            MoodAxis::Valence => &mut self.valence,
            MoodAxis::Tempo => &mut self.tempo,
            MoodAxis::Texture => &mut self.texture,
        }
    }

    /// Signed offset of an axis from neutral.
    #[inline]
    pub fn offset(&self, axis: MoodAxis) -> f32 {
        self.get(axis) - NEUTRAL
    }

    /// True when every axis sits exactly at neutral.
    pub fn is_neutral(&self) -> bool {
        MoodAxis::ALL.iter().all(|&a| self.get(a) == NEUTRAL)
    }

    /// Apply the configured range policy.
    ///
    /// - `Permissive`: returned unchanged, out-of-range and non-finite
    ///   values included.
    /// - `Clamp`: each axis clamped into [0, 1]; non-finite values rejected.
    /// - `Reject`: any non-finite or out-of-range axis is an error.
    ///
    /// # Errors
    ///
    /// `EvokeError::InvalidMoodInput` naming the first offending axis.
    pub fn apply_policy(mut self, policy: MoodRangePolicy) -> EvokeResult<Self> {
        if policy == MoodRangePolicy::Permissive {
            return Ok(self);
        }
        for axis in MoodAxis::ALL {
            let value = self.get(axis);
            if !value.is_finite() {
                return Err(EvokeError::InvalidMoodInput { axis, value });
            }
            match policy {
                MoodRangePolicy::Clamp => *self.get_mut(axis) = value.clamp(0.0, 1.0),
                MoodRangePolicy::Reject if !(0.0..=1.0).contains(&value) => {
                    return Err(EvokeError::InvalidMoodInput { axis, value });
                }
                _ => {}
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_neutral() {
        let mood = MoodVector::default();
        assert!(mood.is_neutral());
        for axis in MoodAxis::ALL {
            assert_eq!(mood.get(axis), 0.5);
            assert_eq!(mood.offset(axis), 0.0);
        }
    }

    #[test]
    fn test_offset() {
        let mood = MoodVector::new(1.0, 0.0, 0.75, 0.5);
        assert_eq!(mood.offset(MoodAxis::Energy), 0.5);
        assert_eq!(mood.offset(MoodAxis::Valence), -0.5);
        assert_eq!(mood.offset(MoodAxis::Tempo), 0.25);
        assert_eq!(mood.offset(MoodAxis::Texture), 0.0);
        assert!(!mood.is_neutral());
    }

    #[test]
    fn test_permissive_keeps_out_of_range() {
        let mood = MoodVector::new(1.7, -0.3, 0.5, 0.5);
        let applied = mood.apply_policy(MoodRangePolicy::Permissive).unwrap();
        assert_eq!(applied, mood);
    }

    #[test]
    fn test_permissive_keeps_nan() {
        let mood = MoodVector::new(f32::NAN, 0.5, 0.5, 0.5);
        let applied = mood.apply_policy(MoodRangePolicy::Permissive).unwrap();
        assert!(applied.energy.is_nan());
    }

    #[test]
    fn test_clamp_policy() {
        let mood = MoodVector::new(1.7, -0.3, 0.25, 1.0);
        let applied = mood.apply_policy(MoodRangePolicy::Clamp).unwrap();
        assert_eq!(applied, MoodVector::new(1.0, 0.0, 0.25, 1.0));
    }

    #[test]
    fn test_clamp_policy_rejects_non_finite() {
        let mood = MoodVector::new(0.5, 0.5, f32::INFINITY, 0.5);
        let err = mood.apply_policy(MoodRangePolicy::Clamp).unwrap_err();
        assert!(matches!(
            err,
            EvokeError::InvalidMoodInput {
                axis: MoodAxis::Tempo,
                ..
            }
        ));
    }

    #[test]
    fn test_reject_policy() {
        let ok = MoodVector::new(0.0, 1.0, 0.5, 0.5);
        assert_eq!(ok.apply_policy(MoodRangePolicy::Reject).unwrap(), ok);

        let bad = MoodVector::new(0.5, 0.5, 0.5, 1.01);
        match bad.apply_policy(MoodRangePolicy::Reject) {
            Err(EvokeError::InvalidMoodInput { axis, value }) => {
                assert_eq!(axis, MoodAxis::Texture);
                assert_eq!(value, 1.01);
            }
            other => panic!("expected InvalidMoodInput, got {:?}", other),
        }
    }

    #[test]
    fn test_serde_field_names() {
        let mood = MoodVector::new(0.1, 0.2, 0.3, 0.4);
        let json = serde_json::to_value(mood).unwrap();
        assert_eq!(json["mood_energy"].as_f64().unwrap() as f32, 0.1);
        assert_eq!(json["mood_texture"].as_f64().unwrap() as f32, 0.4);
    }

    #[test]
    fn test_axis_display() {
        assert_eq!(MoodAxis::Energy.to_string(), "energy");
        assert_eq!(MoodAxis::Texture.as_str(), "texture");
    }
}
