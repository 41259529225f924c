//! Evoke Core Library
//!
//! Retrieval and steering engine behind the Evoke mood board: given an audio
//! embedding, find the images nearest to it in a shared embedding space, and
//! let four mood sliders (energy, valence, tempo, texture) steer that
//! embedding before searching again.
//!
//! # Architecture
//!
//! - [`index`]: top-K search over the image corpus (brute force, IVF, remote)
//! - [`refine`]: pure mood steering along per-axis direction vectors
//! - [`engine`]: `retrieve_for_embedding` / `refine_and_retrieve` under a
//!   request deadline and cancellation token
//! - [`board`]: session-facing orchestration (analyze, board, refine, demo,
//!   health)
//! - [`data`], [`config`], [`session`], [`analyzer`], [`stubs`]: loading,
//!   settings and collaborator boundaries
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use evoke_core::config::{DimensionPolicy, EngineConfig};
//! use evoke_core::directions::DirectionTable;
//! use evoke_core::engine::{MoodRetrievalEngine, RequestContext};
//! use evoke_core::index::BruteForceIndex;
//! use evoke_core::refine::EmbeddingRefiner;
//! use evoke_core::types::{Corpus, CorpusEntry, MoodVector};
//!
//! # tokio_test_block(async {
//! let corpus = Corpus::new(2, vec![
//!     CorpusEntry::new(0, "img/0.jpg", vec![1.0, 0.0]),
//!     CorpusEntry::new(1, "img/1.jpg", vec![0.0, 1.0]),
//! ]).unwrap();
//! let directions = DirectionTable::new(vec![1.0, 0.0], vec![0.0; 2], vec![0.0; 2], vec![0.0; 2]);
//! let engine = MoodRetrievalEngine::new(
//!     EmbeddingRefiner::new(Arc::new(directions)),
//!     Arc::new(BruteForceIndex::new(corpus, DimensionPolicy::Truncate)),
//!     EngineConfig::default(),
//! );
//!
//! let out = engine
//!     .refine_and_retrieve(&RequestContext::unbounded(), &[0.0, 0.0], &MoodVector::new(1.0, 0.5, 0.5, 0.5), 1)
//!     .await
//!     .unwrap();
//! assert_eq!(out.results[0].id, 0);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod analyzer;
pub mod board;
pub mod config;
pub mod data;
pub mod directions;
pub mod engine;
pub mod error;
pub mod index;
pub mod refine;
pub mod session;
pub mod similarity;
pub mod stubs;
pub mod types;

// Re-exports for convenience
pub use board::{BoardView, HealthReport, HealthStatus, MoodBoardService};
pub use config::EvokeConfig;
pub use engine::{MoodRetrievalEngine, RefinedRetrieval, RequestContext};
pub use error::{EvokeError, EvokeResult};
pub use index::{build_index, CorpusIndex};
