//! Named constants for refinement and retrieval.
//!
//! The refinement weights are the historically validated values. Boards
//! produced by earlier deployments must be reproduced exactly.

/// Mood scalar constants.
pub mod mood {
    /// Neutral slider position. A mood at neutral contributes no adjustment.
    pub const NEUTRAL: f32 = 0.5;
}

/// Per-axis refinement weights.
///
/// ```text
/// adjustment[i] = E[i]·(energy−0.5)·W_E + V[i]·(valence−0.5)·W_V
///               + T[i]·(tempo−0.5)·W_T  + X[i]·(texture−0.5)·W_X
/// ```
pub mod weights {
    /// Energy axis weight (W_E).
    pub const ENERGY: f32 = 0.2;

    /// Valence axis weight (W_V).
    pub const VALENCE: f32 = 0.2;

    /// Tempo axis weight (W_T).
    pub const TEMPO: f32 = 0.15;

    /// Texture axis weight (W_X).
    pub const TEXTURE: f32 = 0.15;
}

/// Retrieval defaults.
pub mod retrieval {
    /// Images returned per board.
    pub const DEFAULT_TOP_K: usize = 20;

    /// Inverted lists for the IVF backend.
    pub const DEFAULT_NLIST: usize = 128;

    /// Lists probed per IVF query.
    pub const DEFAULT_NPROBE: usize = 16;

    /// Lloyd iterations when training IVF centroids.
    pub const DEFAULT_KMEANS_ITERATIONS: usize = 25;

    /// Default per-search deadline in milliseconds.
    pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 5_000;
}

/// Session defaults.
pub mod session {
    /// Session time-to-live: one hour.
    pub const DEFAULT_TTL_SECS: u64 = 3_600;
}
