//! Error types for mood retrieval and steering.
//!
//! One error enum covers the whole engine: static data loading, index
//! backends, refinement input validation, session orchestration and
//! configuration. Startup-time failures (bad data, bad config) are fatal and
//! must halt process start; request-time failures are surfaced to the caller
//! untouched. The engine never retries and never substitutes stale results.

use thiserror::Error;

use crate::types::MoodAxis;

/// Result type alias for engine operations.
pub type EvokeResult<T> = Result<T, EvokeError>;

/// Error type for all engine operations.
#[derive(Error, Debug)]
pub enum EvokeError {
    // ========== Index Errors ==========
    /// Backing index unreachable or not loaded.
    ///
    /// Never answered with stale or partial data.
    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// Search was abandoned because the caller cancelled the request.
    #[error("Search cancelled by caller")]
    Cancelled,

    /// Search exceeded the request-scoped deadline.
    #[error("Search timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Dimension mismatch between configured dimension and supplied vector.
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Index could not be built from the supplied corpus.
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    // ========== Input Errors ==========
    /// Mood scalar rejected by the configured range policy.
    #[error("Invalid mood input: {axis} = {value} (must be finite and in [0.0, 1.0])")]
    InvalidMoodInput { axis: MoodAxis, value: f32 },

    /// Embedding contained NaN or infinite components.
    #[error("Non-finite value in {context} at index {index}")]
    NonFiniteValue { context: String, index: usize },

    // ========== Session Errors ==========
    /// No live session exists for the identifier (missing or expired).
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session exists but no audio has been analyzed for it yet.
    #[error("No audio analyzed for session {0}")]
    NoEmbedding(String),

    /// Session store failed.
    #[error("Session store error: {0}")]
    SessionStore(String),

    /// Audio analysis failed.
    #[error("Audio analysis failed: {0}")]
    AnalysisFailed(String),

    /// Demo payload was not configured.
    #[error("Demo payload not loaded")]
    DemoUnavailable,

    // ========== Configuration Errors ==========
    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========== Data Errors ==========
    /// Static data file could not be parsed.
    #[error("Failed to parse {location}: {details}")]
    DataParse { location: String, details: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ========== I/O Errors ==========
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EvokeError {
    /// Build a [`EvokeError::DimensionMismatch`] for the named context.
    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Whether a caller may reasonably retry the same request later.
    ///
    /// Retry policy belongs to the caller; the engine itself never retries.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CorpusUnavailable(_)
                | Self::Cancelled
                | Self::Timeout { .. }
                | Self::SessionStore(_)
                | Self::AnalysisFailed(_)
        )
    }

    /// Whether this error must halt process start when raised during loading.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::InvalidConfig(_)
                | Self::DataParse { .. }
                | Self::NonFiniteValue { .. }
                | Self::IndexBuild(_)
                | Self::Io(_)
        )
    }
}

impl From<serde_json::Error> for EvokeError {
    fn from(err: serde_json::Error) -> Self {
        EvokeError::Serialization(err.to_string())
    }
}
