//! Deterministic audio analyzer.
//!
//! The clip bytes are hashed with xxHash64 and the hash seeds a ChaCha8 RNG,
//! which draws a unit-norm embedding and four mood scalars in [0, 1). The
//! same clip always yields the same output; different clips almost surely
//! differ.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

use crate::analyzer::{AnalysisOutput, AudioAnalyzer};
use crate::error::{EvokeError, EvokeResult};
use crate::similarity::normalize;
use crate::types::MoodVector;

/// Hash-seeded analyzer for offline runs and tests.
#[derive(Debug)]
pub struct StubAudioAnalyzer {
    dimension: usize,
    seed: u64,
    available: AtomicBool,
}

impl StubAudioAnalyzer {
    pub fn new(dimension: usize) -> Self {
        Self::with_seed(dimension, 0)
    }

    /// Analyzer whose outputs are additionally keyed by `seed`.
    pub fn with_seed(dimension: usize, seed: u64) -> Self {
        Self {
            dimension,
            seed,
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the model service going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> EvokeResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EvokeError::AnalysisFailed("analyzer unreachable".to_string()))
        }
    }
}

#[async_trait]
impl AudioAnalyzer for StubAudioAnalyzer {
    async fn analyze(&self, audio: &[u8]) -> EvokeResult<AnalysisOutput> {
        self.check_available()?;
        if audio.is_empty() {
            return Err(EvokeError::AnalysisFailed("empty audio payload".to_string()));
        }

        let hash = xxh64(audio, self.seed);
        let mut rng = ChaCha8Rng::seed_from_u64(hash);

        let mut embedding: Vec<f32> = (0..self.dimension).map(|_| rng.gen_range(-1.0..1.0)).collect();
        normalize(&mut embedding);
        let mood = MoodVector::new(rng.gen(), rng.gen(), rng.gen(), rng.gen());

        debug!(bytes = audio.len(), hash, "Stub analysis complete");
        Ok(AnalysisOutput { embedding, mood })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn ping(&self) -> EvokeResult<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::l2_norm;

    #[tokio::test]
    async fn test_deterministic_output() {
        let analyzer = StubAudioAnalyzer::new(16);
        let a = analyzer.analyze(b"RIFF....WAVEfmt ").await.unwrap();
        let b = analyzer.analyze(b"RIFF....WAVEfmt ").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.embedding.len(), 16);
        assert!((l2_norm(&a.embedding) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_different_clips_differ() {
        let analyzer = StubAudioAnalyzer::new(8);
        let a = analyzer.analyze(b"clip-a").await.unwrap();
        let b = analyzer.analyze(b"clip-b").await.unwrap();
        assert_ne!(a.embedding, b.embedding);
    }

    #[tokio::test]
    async fn test_mood_in_unit_range() {
        let analyzer = StubAudioAnalyzer::new(4);
        let out = analyzer.analyze(&[1, 2, 3, 4, 5]).await.unwrap();
        for axis in crate::types::MoodAxis::ALL {
            let v = out.mood.get(axis);
            assert!((0.0..1.0).contains(&v), "{} = {}", axis, v);
        }
    }

    #[tokio::test]
    async fn test_empty_audio_rejected() {
        let analyzer = StubAudioAnalyzer::new(4);
        let err = analyzer.analyze(&[]).await.unwrap_err();
        assert!(matches!(err, EvokeError::AnalysisFailed(_)));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let analyzer = StubAudioAnalyzer::new(4);
        analyzer.set_available(false);
        assert!(analyzer.ping().await.is_err());
        assert!(analyzer.analyze(b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_seed_changes_output() {
        let a = StubAudioAnalyzer::with_seed(8, 1).analyze(b"same").await.unwrap();
        let b = StubAudioAnalyzer::with_seed(8, 2).analyze(b"same").await.unwrap();
        assert_ne!(a.embedding, b.embedding);
    }
}
