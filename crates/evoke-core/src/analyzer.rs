//! Audio analyzer boundary.
//!
//! Turns raw audio into an embedding in the shared space plus the initial
//! mood estimate. Real analysis lives in an external model service; the
//! engine only sees this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EvokeResult;
use crate::types::{Embedding, MoodVector};

/// Result of analyzing one audio clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Clip embedding in the shared audio/image space.
    pub embedding: Embedding,
    /// Estimated mood; becomes the session's initial slider positions.
    #[serde(flatten)]
    pub mood: MoodVector,
}

/// Audio-to-embedding analysis.
#[async_trait]
pub trait AudioAnalyzer: Send + Sync {
    /// Analyze an encoded audio clip.
    ///
    /// # Errors
    ///
    /// - `EvokeError::AnalysisFailed` if the clip cannot be analyzed
    async fn analyze(&self, audio: &[u8]) -> EvokeResult<AnalysisOutput>;

    /// Embedding dimension this analyzer produces.
    fn dimension(&self) -> usize;

    /// Check that the analyzer is reachable.
    async fn ping(&self) -> EvokeResult<()>;
}
