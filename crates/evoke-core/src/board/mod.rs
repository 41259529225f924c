//! Mood board service: the session-facing orchestration layer.
//!
//! Owns the session lifecycle on top of the stateless
//! [`MoodRetrievalEngine`]:
//!
//! ```text
//! create_session ──► analyze(audio) ──► get_board / refine(mood) ...
//!        demo() ───────────────────────► get_board / refine(mood) ...
//! ```
//!
//! Refinement always starts from the session's base embedding, so moving the
//! sliders back to where they were reproduces the earlier board.

mod health;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use health::{HealthReport, HealthStatus};

use crate::analyzer::AudioAnalyzer;
use crate::data::DemoPayload;
use crate::engine::{MoodRetrievalEngine, RequestContext};
use crate::error::{EvokeError, EvokeResult};
use crate::session::{SessionState, SessionStore};
use crate::types::{MoodVector, RetrievalResult};

/// Deadline for each component probe in [`MoodBoardService::health`].
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One rendered board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub session_id: String,
    #[serde(flatten)]
    pub mood: MoodVector,
    pub images: Vec<RetrievalResult>,
}

/// Session-aware board operations.
pub struct MoodBoardService {
    engine: MoodRetrievalEngine,
    sessions: Arc<dyn SessionStore>,
    analyzer: Arc<dyn AudioAnalyzer>,
    demo: Option<Arc<DemoPayload>>,
    session_ttl: Duration,
}

impl MoodBoardService {
    /// Wire the service together.
    ///
    /// # Errors
    ///
    /// - `EvokeError::DimensionMismatch` if the analyzer's output dimension
    ///   differs from the corpus dimension
    pub fn new(
        engine: MoodRetrievalEngine,
        sessions: Arc<dyn SessionStore>,
        analyzer: Arc<dyn AudioAnalyzer>,
        demo: Option<DemoPayload>,
        session_ttl: Duration,
    ) -> EvokeResult<Self> {
        let dimension = engine.index().dimension();
        if analyzer.dimension() != dimension {
            return Err(EvokeError::dimension_mismatch(
                "analyzer",
                dimension,
                analyzer.dimension(),
            ));
        }
        Ok(Self {
            engine,
            sessions,
            analyzer,
            demo: demo.map(Arc::new),
            session_ttl,
        })
    }

    #[inline]
    pub fn engine(&self) -> &MoodRetrievalEngine {
        &self.engine
    }

    fn top_k(&self, k: Option<usize>) -> usize {
        k.unwrap_or(self.engine.config().default_top_k)
    }

    async fn load(&self, session_id: &str) -> EvokeResult<SessionState> {
        self.sessions
            .get(session_id)
            .await?
            .ok_or_else(|| EvokeError::SessionNotFound(session_id.to_string()))
    }

    /// Start a session with neutral mood and no embedding.
    pub async fn create_session(&self) -> EvokeResult<String> {
        let state = SessionState::create();
        let session_id = state.session_id.clone();
        self.sessions.put(state, self.session_ttl).await?;
        info!(session_id = %session_id, "Created session");
        Ok(session_id)
    }

    /// Analyze a clip for an existing session and render its first board.
    ///
    /// Replaces any earlier base embedding and clears the refined one.
    ///
    /// # Errors
    ///
    /// - `EvokeError::SessionNotFound` if the session is missing or expired
    /// - `EvokeError::AnalysisFailed` from the analyzer
    /// - `EvokeError::DimensionMismatch` if an analysis does not match the
    ///   dimension the analyzer declared at startup
    pub async fn analyze(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        audio: &[u8],
        k: Option<usize>,
    ) -> EvokeResult<BoardView> {
        let mut state = self.load(session_id).await?;
        let output = self.analyzer.analyze(audio).await?;

        let dimension = self.engine.index().dimension();
        if output.embedding.len() != dimension {
            return Err(EvokeError::dimension_mismatch(
                "analyzer output",
                dimension,
                output.embedding.len(),
            ));
        }

        let embedding = output.embedding;
        state.base_embedding = Some(embedding.clone());
        state.refined_embedding = None;
        state.mood = output.mood;
        self.sessions.put(state.clone(), self.session_ttl).await?;

        let images = self
            .engine
            .retrieve_for_embedding(ctx, &embedding, self.top_k(k))
            .await?;
        info!(session_id, images = images.len(), "Analyzed audio");
        Ok(BoardView {
            session_id: state.session_id,
            mood: state.mood,
            images,
        })
    }

    /// Render the board for the session's current embedding.
    ///
    /// # Errors
    ///
    /// - `EvokeError::SessionNotFound` if the session is missing or expired
    /// - `EvokeError::NoEmbedding` if no audio has been analyzed yet
    pub async fn get_board(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        k: Option<usize>,
    ) -> EvokeResult<BoardView> {
        let state = self.load(session_id).await?;
        let embedding = state
            .current_embedding()
            .ok_or_else(|| EvokeError::NoEmbedding(session_id.to_string()))?;
        let images = self
            .engine
            .retrieve_for_embedding(ctx, embedding, self.top_k(k))
            .await?;
        debug!(session_id, images = images.len(), "Rendered board");
        Ok(BoardView {
            session_id: state.session_id,
            mood: state.mood,
            images,
        })
    }

    /// Move the sliders: refine from the base embedding, persist, re-render.
    ///
    /// # Errors
    ///
    /// - `EvokeError::SessionNotFound` / `EvokeError::NoEmbedding` as for
    ///   [`Self::get_board`]
    /// - `EvokeError::InvalidMoodInput` if the mood policy rejects a scalar
    pub async fn refine(
        &self,
        ctx: &RequestContext,
        session_id: &str,
        mood: MoodVector,
        k: Option<usize>,
    ) -> EvokeResult<BoardView> {
        let mut state = self.load(session_id).await?;
        let base = state
            .base_embedding
            .as_deref()
            .ok_or_else(|| EvokeError::NoEmbedding(session_id.to_string()))?;

        let refined = self
            .engine
            .refine_and_retrieve(ctx, base, &mood, self.top_k(k))
            .await?;

        state.refined_embedding = Some(refined.embedding);
        state.mood = refined.mood;
        self.sessions.put(state.clone(), self.session_ttl).await?;

        debug!(session_id, images = refined.results.len(), "Refined board");
        Ok(BoardView {
            session_id: state.session_id,
            mood: state.mood,
            images: refined.results,
        })
    }

    /// Start a session seeded from the demo payload and return its
    /// precomputed board. Warms the analyzer in the background.
    ///
    /// # Errors
    ///
    /// - `EvokeError::DemoUnavailable` if no demo payload was loaded
    pub async fn demo(&self) -> EvokeResult<BoardView> {
        let demo = self.demo.as_ref().ok_or(EvokeError::DemoUnavailable)?;

        let mut state = SessionState::create();
        state.base_embedding = Some(demo.embedding.clone());
        state.mood = demo.mood;
        let session_id = state.session_id.clone();
        self.sessions.put(state, self.session_ttl).await?;

        let analyzer = Arc::clone(&self.analyzer);
        tokio::spawn(async move {
            if let Err(e) = analyzer.ping().await {
                debug!(error = %e, "Analyzer warm-up failed");
            }
        });

        info!(session_id = %session_id, "Started demo session");
        Ok(BoardView {
            session_id,
            mood: demo.mood,
            images: demo.images.clone(),
        })
    }

    /// Probe every component.
    pub async fn health(&self) -> HealthReport {
        let mut report = HealthReport::new();
        let index = self.engine.index();

        let index_status = match health::probe(HEALTH_PROBE_TIMEOUT, index.ping()).await {
            Ok(()) => health::probe(HEALTH_PROBE_TIMEOUT, index.count())
                .await
                .map(|n| format!("ok ({}, {} images)", index.backend(), n)),
            Err(e) => Err(e),
        };
        report.record("index", index_status);

        report.record(
            "sessions",
            health::probe(HEALTH_PROBE_TIMEOUT, self.sessions.ping())
                .await
                .map(|()| "ok".to_string()),
        );
        report.record(
            "analyzer",
            health::probe(HEALTH_PROBE_TIMEOUT, self.analyzer.ping())
                .await
                .map(|()| "ok".to_string()),
        );

        debug!(status = %report.status, "Health check");
        report
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::analyzer::AnalysisOutput;
    use crate::config::{DimensionPolicy, EngineConfig, MoodRangePolicy};
    use crate::directions::DirectionTable;
    use crate::index::BruteForceIndex;
    use crate::refine::EmbeddingRefiner;
    use crate::session::InMemorySessionStore;
    use crate::stubs::StubAudioAnalyzer;
    use crate::types::{Corpus, CorpusEntry};

    const TTL: Duration = Duration::from_secs(3600);

    fn service_with(config: EngineConfig, demo: Option<DemoPayload>) -> (MoodBoardService, Arc<StubAudioAnalyzer>) {
        let corpus = Corpus::new(
            2,
            vec![
                CorpusEntry::new(0, "img/0.jpg", vec![1.0, 0.0]),
                CorpusEntry::new(1, "img/1.jpg", vec![0.0, 1.0]),
                CorpusEntry::new(2, "img/2.jpg", vec![0.9, 0.1]),
            ],
        )
        .unwrap();
        let table = DirectionTable::new(vec![1.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0]);
        let engine = MoodRetrievalEngine::new(
            EmbeddingRefiner::new(Arc::new(table)),
            Arc::new(BruteForceIndex::new(corpus, DimensionPolicy::Truncate)),
            config,
        );
        let analyzer = Arc::new(StubAudioAnalyzer::new(2));
        let service = MoodBoardService::new(
            engine,
            Arc::new(InMemorySessionStore::new()),
            analyzer.clone(),
            demo,
            TTL,
        )
        .unwrap();
        (service, analyzer)
    }

    fn service() -> MoodBoardService {
        service_with(EngineConfig::default(), None).0
    }

    fn demo_payload() -> DemoPayload {
        DemoPayload {
            embedding: vec![0.0, 1.0],
            mood: MoodVector::new(0.5, 0.5, 0.5, 0.5),
            images: vec![RetrievalResult::new(1, "img/1.jpg", 0.0)],
        }
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let service = service();
        let ctx = RequestContext::unbounded();
        let err = service.get_board(&ctx, "nope", None).await.unwrap_err();
        assert!(matches!(err, EvokeError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_board_before_analysis() {
        let service = service();
        let ctx = RequestContext::unbounded();
        let id = service.create_session().await.unwrap();
        assert!(matches!(
            service.get_board(&ctx, &id, None).await.unwrap_err(),
            EvokeError::NoEmbedding(_)
        ));
        assert!(matches!(
            service.refine(&ctx, &id, MoodVector::neutral(), None).await.unwrap_err(),
            EvokeError::NoEmbedding(_)
        ));
    }

    #[tokio::test]
    async fn test_analyze_then_board() {
        let service = service();
        let ctx = RequestContext::unbounded();
        let id = service.create_session().await.unwrap();

        let analyzed = service.analyze(&ctx, &id, b"clip", None).await.unwrap();
        assert_eq!(analyzed.session_id, id);
        assert_eq!(analyzed.images.len(), 3);

        let board = service.get_board(&ctx, &id, Some(2)).await.unwrap();
        assert_eq!(board.images, analyzed.images[..2].to_vec());
        assert_eq!(board.mood, analyzed.mood);
    }

    #[tokio::test]
    async fn test_refine_starts_from_base_each_time() {
        let (service, _) = service_with(EngineConfig::default(), Some(demo_payload()));
        let ctx = RequestContext::unbounded();
        let demo = service.demo().await.unwrap();
        let id = demo.session_id;

        let high = MoodVector::new(1.0, 0.5, 0.5, 0.5);
        let first = service.refine(&ctx, &id, high, None).await.unwrap();
        let second = service.refine(&ctx, &id, high, None).await.unwrap();
        assert_eq!(first.images, second.images);
        assert_eq!(second.mood, high);

        // Board now reflects the refined embedding.
        let board = service.get_board(&ctx, &id, None).await.unwrap();
        assert_eq!(board.images, second.images);
    }

    #[tokio::test]
    async fn test_refine_clamp_policy_persists_clamped_mood() {
        let config = EngineConfig {
            mood_range: MoodRangePolicy::Clamp,
            ..EngineConfig::default()
        };
        let (service, _) = service_with(config, Some(demo_payload()));
        let ctx = RequestContext::unbounded();
        let id = service.demo().await.unwrap().session_id;

        let view = service
            .refine(&ctx, &id, MoodVector::new(1.7, -0.2, 0.5, 0.5), None)
            .await
            .unwrap();
        assert_eq!(view.mood, MoodVector::new(1.0, 0.0, 0.5, 0.5));
    }

    #[tokio::test]
    async fn test_demo_unavailable() {
        let service = service();
        assert!(matches!(service.demo().await.unwrap_err(), EvokeError::DemoUnavailable));
    }

    #[tokio::test]
    async fn test_demo_returns_precomputed_images() {
        let (service, _) = service_with(EngineConfig::default(), Some(demo_payload()));
        let view = service.demo().await.unwrap();
        assert_eq!(view.images, demo_payload().images);
        assert!(view.mood.is_neutral());
    }

    #[tokio::test]
    async fn test_health_reports_degraded_analyzer() {
        let (service, analyzer) = service_with(EngineConfig::default(), None);
        let report = service.health().await;
        assert!(report.is_ok());
        assert_eq!(report.services["index"], "ok (brute_force, 3 images)");

        analyzer.set_available(false);
        let report = service.health().await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(report.services["analyzer"].starts_with("error:"));
        assert_eq!(report.services["sessions"], "ok");
    }

    #[test]
    fn test_board_view_payload_shape() {
        let view = BoardView {
            session_id: "s".to_string(),
            mood: MoodVector::neutral(),
            images: vec![RetrievalResult::new(3, "img/3.jpg", 0.5)],
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["mood_valence"].as_f64().unwrap(), 0.5);
        assert_eq!(json["images"][0]["image_url"], "img/3.jpg");
    }

    fn brute_force_engine() -> MoodRetrievalEngine {
        let corpus = Corpus::new(2, vec![CorpusEntry::new(0, "img/0.jpg", vec![1.0, 0.0])]).unwrap();
        MoodRetrievalEngine::new(
            EmbeddingRefiner::new(Arc::new(DirectionTable::zeros(2))),
            Arc::new(BruteForceIndex::new(corpus, DimensionPolicy::Truncate)),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_analyzer_dimension_checked_at_construction() {
        let err = MoodBoardService::new(
            brute_force_engine(),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(StubAudioAnalyzer::new(512)),
            None,
            TTL,
        )
        .err()
        .unwrap();
        assert!(err.is_startup_fatal());
        match err {
            EvokeError::DimensionMismatch { expected, actual, .. } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 512);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    /// Declares one dimension, emits another.
    struct MisreportingAnalyzer;

    #[async_trait]
    impl AudioAnalyzer for MisreportingAnalyzer {
        async fn analyze(&self, _audio: &[u8]) -> EvokeResult<AnalysisOutput> {
            Ok(AnalysisOutput {
                embedding: vec![0.5; 3],
                mood: MoodVector::neutral(),
            })
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn ping(&self) -> EvokeResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_analysis_output_length_still_checked_per_request() {
        let service = MoodBoardService::new(
            brute_force_engine(),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(MisreportingAnalyzer),
            None,
            TTL,
        )
        .unwrap();
        let ctx = RequestContext::unbounded();
        let id = service.create_session().await.unwrap();
        let err = service.analyze(&ctx, &id, b"clip", None).await.unwrap_err();
        assert!(matches!(err, EvokeError::DimensionMismatch { .. }));
    }
}
