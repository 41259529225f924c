//! Static data payloads loaded once at startup.
//!
//! | File | Shape |
//! |------|-------|
//! | corpus | `[{"url": "..", "embedding": [..], "id": 7?}, ..]` |
//! | directions | `{"energy": [..], "valence": [..], "tempo": [..], "texture": [..]}` |
//! | demo | `{"embedding": [..], "mood_energy": .., .., "images": [{"id", "image_url", "score"}]}` |
//!
//! Every payload is validated against the configured dimension before
//! serving begins. Any failure here is fatal.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DataConfig;
use crate::directions::DirectionTable;
use crate::error::{EvokeError, EvokeResult};
use crate::types::{first_non_finite, Corpus, CorpusEntry, Embedding, EntryId, MoodVector, RetrievalResult};

/// Corpus record as stored on disk.
#[derive(Debug, Deserialize)]
struct CorpusRecord {
    url: String,
    embedding: Embedding,
    #[serde(default)]
    id: Option<EntryId>,
}

/// Precanned board for the zero-setup walkthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoPayload {
    /// Base embedding of the demo clip.
    pub embedding: Embedding,
    /// Initial slider positions.
    #[serde(flatten)]
    pub mood: MoodVector,
    /// Precomputed results for `embedding`.
    pub images: Vec<RetrievalResult>,
}

impl DemoPayload {
    /// Check the embedding against the configured dimension.
    pub fn validate(&self, dimension: usize) -> EvokeResult<()> {
        if self.embedding.len() != dimension {
            return Err(EvokeError::dimension_mismatch(
                "demo embedding",
                dimension,
                self.embedding.len(),
            ));
        }
        if let Some(index) = first_non_finite(&self.embedding) {
            return Err(EvokeError::NonFiniteValue {
                context: "demo embedding".to_string(),
                index,
            });
        }
        Ok(())
    }
}

fn read(path: &Path) -> EvokeResult<String> {
    std::fs::read_to_string(path).map_err(|e| EvokeError::DataParse {
        location: path.display().to_string(),
        details: format!("cannot read file: {}", e),
    })
}

fn parse<'a, T: Deserialize<'a>>(json: &'a str, location: &str) -> EvokeResult<T> {
    serde_json::from_str(json).map_err(|e| EvokeError::DataParse {
        location: location.to_string(),
        details: e.to_string(),
    })
}

/// Parse a corpus payload. Entries without an `id` get their load position.
pub fn parse_corpus(json: &str, location: &str, dimension: usize) -> EvokeResult<Corpus> {
    let records: Vec<CorpusRecord> = parse(json, location)?;
    let entries = records
        .into_iter()
        .enumerate()
        .map(|(pos, r)| CorpusEntry::new(r.id.unwrap_or(pos as EntryId), r.url, r.embedding))
        .collect();
    Corpus::new(dimension, entries)
}

/// Load and validate the corpus file.
pub fn load_corpus(path: impl AsRef<Path>, dimension: usize) -> EvokeResult<Corpus> {
    let path = path.as_ref();
    parse_corpus(&read(path)?, &path.display().to_string(), dimension)
}

/// Parse and validate a direction table payload.
pub fn parse_directions(json: &str, location: &str, dimension: usize) -> EvokeResult<DirectionTable> {
    let table: DirectionTable = parse(json, location)?;
    table.validate(dimension)?;
    Ok(table)
}

/// Load and validate the direction table file.
pub fn load_directions(path: impl AsRef<Path>, dimension: usize) -> EvokeResult<DirectionTable> {
    let path = path.as_ref();
    parse_directions(&read(path)?, &path.display().to_string(), dimension)
}

/// Parse and validate a demo payload.
pub fn parse_demo(json: &str, location: &str, dimension: usize) -> EvokeResult<DemoPayload> {
    let demo: DemoPayload = parse(json, location)?;
    demo.validate(dimension)?;
    Ok(demo)
}

/// Load and validate the demo file.
pub fn load_demo(path: impl AsRef<Path>, dimension: usize) -> EvokeResult<DemoPayload> {
    let path = path.as_ref();
    parse_demo(&read(path)?, &path.display().to_string(), dimension)
}

/// Everything loaded from disk at startup.
#[derive(Debug, Clone)]
pub struct StaticData {
    pub corpus: Corpus,
    pub directions: DirectionTable,
    pub demo: Option<DemoPayload>,
}

impl StaticData {
    /// Load all payloads named in `config`.
    ///
    /// A configured demo file that does not exist is skipped with a warning;
    /// one that exists but is malformed is an error.
    ///
    /// # Errors
    ///
    /// - `EvokeError::DataParse` if a file is unreadable or malformed
    /// - `EvokeError::DimensionMismatch` / `EvokeError::NonFiniteValue` if a
    ///   payload does not fit `dimension`
    pub fn load(config: &DataConfig, dimension: usize) -> EvokeResult<Self> {
        let start = Instant::now();
        let corpus = load_corpus(&config.corpus_path, dimension)?;
        let directions = load_directions(&config.directions_path, dimension)?;

        let demo = match &config.demo_path {
            Some(path) if path.exists() => Some(load_demo(path, dimension)?),
            Some(path) => {
                warn!(path = %path.display(), "Demo payload not found; demo disabled");
                None
            }
            None => None,
        };

        info!(
            entries = corpus.len(),
            dimension,
            demo = demo.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Static data loaded"
        );
        Ok(Self {
            corpus,
            directions,
            demo,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const CORPUS: &str = r#"[
        {"url": "https://img/a.jpg", "embedding": [1.0, 0.0]},
        {"url": "https://img/b.jpg", "embedding": [0.0, 1.0]},
        {"url": "https://img/c.jpg", "embedding": [0.9, 0.1], "id": 42}
    ]"#;

    const DIRECTIONS: &str = r#"{"energy":[1.0,0.0],"valence":[0.0,1.0],"tempo":[0.0,0.0],"texture":[0.0,0.0]}"#;

    const DEMO: &str = r#"{
        "embedding": [0.6, 0.8],
        "mood_energy": 0.7, "mood_valence": 0.4, "mood_tempo": 0.5, "mood_texture": 0.2,
        "images": [{"id": 0, "image_url": "https://img/a.jpg", "score": 0.89}]
    }"#;

    #[test]
    fn test_parse_corpus_assigns_positional_ids() {
        let corpus = parse_corpus(CORPUS, "images.json", 2).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.entries()[0].id, 0);
        assert_eq!(corpus.entries()[1].id, 1);
        assert_eq!(corpus.entries()[2].id, 42);
        assert_eq!(corpus.entries()[1].reference, "https://img/b.jpg");
    }

    #[test]
    fn test_parse_corpus_dimension_mismatch_is_fatal() {
        let err = parse_corpus(CORPUS, "images.json", 3).unwrap_err();
        assert!(err.is_startup_fatal());
        assert!(matches!(err, EvokeError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_parse_corpus_malformed() {
        let err = parse_corpus(r#"[{"url": 5}]"#, "images.json", 2).unwrap_err();
        match err {
            EvokeError::DataParse { location, .. } => assert_eq!(location, "images.json"),
            other => panic!("expected DataParse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_directions_long_vector_rejected() {
        assert!(parse_directions(DIRECTIONS, "directions.json", 2).is_ok());
        let err = parse_directions(DIRECTIONS, "directions.json", 1).unwrap_err();
        assert!(matches!(err, EvokeError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_parse_demo() {
        let demo = parse_demo(DEMO, "demo.json", 2).unwrap();
        assert_eq!(demo.mood, MoodVector::new(0.7, 0.4, 0.5, 0.2));
        assert_eq!(demo.images.len(), 1);
        assert_eq!(demo.images[0].reference, "https://img/a.jpg");
        assert!(parse_demo(DEMO, "demo.json", 3).is_err());
    }

    fn write_fixture(dir: &TempDir, with_demo: bool) -> DataConfig {
        let corpus_path = dir.path().join("images.json");
        let directions_path = dir.path().join("directions.json");
        let demo_path = dir.path().join("demo.json");
        fs::write(&corpus_path, CORPUS).unwrap();
        fs::write(&directions_path, DIRECTIONS).unwrap();
        if with_demo {
            fs::write(&demo_path, DEMO).unwrap();
        }
        DataConfig {
            corpus_path,
            directions_path,
            demo_path: Some(demo_path),
        }
    }

    #[test]
    fn test_static_data_load() {
        let dir = TempDir::new().unwrap();
        let config = write_fixture(&dir, true);
        let data = StaticData::load(&config, 2).unwrap();
        assert_eq!(data.corpus.len(), 3);
        assert_eq!(data.directions.energy, vec![1.0, 0.0]);
        assert!(data.demo.is_some());
    }

    #[test]
    fn test_static_data_missing_demo_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = write_fixture(&dir, false);
        let data = StaticData::load(&config, 2).unwrap();
        assert!(data.demo.is_none());
    }

    #[test]
    fn test_static_data_missing_corpus_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = write_fixture(&dir, true);
        config.corpus_path = dir.path().join("nope.json");
        let err = StaticData::load(&config, 2).unwrap_err();
        assert!(matches!(err, EvokeError::DataParse { .. }));
        assert!(err.to_string().contains("nope.json"));
    }
}
