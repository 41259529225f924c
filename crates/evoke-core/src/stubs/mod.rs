//! In-process stand-ins for the external services.
//!
//! - [`StubAudioAnalyzer`]: deterministic, hash-seeded analysis output
//! - [`InMemoryVectorDbClient`]: a vector database collection held in memory
//!
//! Both implement the real traits with real behavior and are used by the CLI
//! for offline runs and by tests. Neither talks to the network.

mod audio_analyzer;
mod vector_db;

pub use audio_analyzer::StubAudioAnalyzer;
pub use vector_db::InMemoryVectorDbClient;
