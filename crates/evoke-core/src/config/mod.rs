//! Configuration for the retrieval engine and its collaborators.
//!
//! Sections:
//! - `[index]`: backend selection, dimension, IVF parameters, dimension policy
//! - `[data]`: paths to the static corpus, direction and demo payloads
//! - `[engine]`: default top-K, search deadline, mood range policy
//! - `[session]`: session time-to-live
//! - `[remote]`: remote vector database connection
//!
//! Loaded from TOML, then overridden by `EVOKE_*` environment variables,
//! then validated once at startup. Any invalid value is fatal.

pub mod constants;

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EvokeError, EvokeResult};
use crate::index::RemoteMetric;
use crate::types::DEFAULT_EMBEDDING_DIM;
use constants::{retrieval, session};

/// Which corpus index implementation answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    /// In-process exact linear scan. Reference implementation.
    BruteForce,
    /// In-process approximate inverted-file index over k-means clusters.
    Ivf,
    /// External vector database reached through a client.
    Remote,
}

impl fmt::Display for IndexBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BruteForce => write!(f, "brute_force"),
            Self::Ivf => write!(f, "ivf"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for IndexBackend {
    type Err = EvokeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brute_force" | "brute-force" | "bruteforce" => Ok(Self::BruteForce),
            "ivf" => Ok(Self::Ivf),
            "remote" => Ok(Self::Remote),
            other => Err(EvokeError::InvalidConfig(format!(
                "unknown index backend '{}'",
                other
            ))),
        }
    }
}

/// How a query whose length differs from the corpus dimension is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionPolicy {
    /// Compare over the shared prefix only. Historical behavior.
    #[default]
    Truncate,
    /// Fail the query with `DimensionMismatch`.
    Reject,
}

/// How mood scalars outside [0, 1] are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodRangePolicy {
    /// Accept any value. Historical behavior.
    #[default]
    Permissive,
    /// Clamp into [0, 1]; reject non-finite values.
    Clamp,
    /// Reject any non-finite or out-of-range value.
    Reject,
}

/// Corpus index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Embedding dimension (must match the analyzer output and the corpus)
    pub dimension: usize,
    /// Backend selected at startup
    pub backend: IndexBackend,
    /// Number of inverted lists (IVF only)
    pub nlist: usize,
    /// Lists probed per query (IVF / remote). Recall/latency trade-off:
    /// `nprobe == nlist` is an exact search.
    pub nprobe: usize,
    /// Lloyd iterations for centroid training (IVF only)
    pub max_iterations: usize,
    /// Query-time dimension mismatch handling
    pub dimension_policy: DimensionPolicy,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_EMBEDDING_DIM,
            backend: IndexBackend::BruteForce,
            nlist: retrieval::DEFAULT_NLIST,
            nprobe: retrieval::DEFAULT_NPROBE,
            max_iterations: retrieval::DEFAULT_KMEANS_ITERATIONS,
            dimension_policy: DimensionPolicy::Truncate,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.dimension == 0 {
            return Err("dimension must be > 0".to_string());
        }
        if self.nlist == 0 {
            return Err("nlist must be > 0".to_string());
        }
        if self.nprobe == 0 {
            return Err("nprobe must be > 0".to_string());
        }
        if self.nprobe > self.nlist {
            return Err(format!(
                "nprobe ({}) must not exceed nlist ({})",
                self.nprobe, self.nlist
            ));
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0".to_string());
        }
        Ok(())
    }
}

/// Static data payload locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Corpus entries: `[{"url": .., "embedding": [..]}, ..]`
    pub corpus_path: PathBuf,
    /// Direction vectors: `{"energy": [..], "valence": [..], ..}`
    pub directions_path: PathBuf,
    /// Optional precanned demo board
    pub demo_path: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("data/images.json"),
            directions_path: PathBuf::from("data/directions.json"),
            demo_path: Some(PathBuf::from("data/demo.json")),
        }
    }
}

impl DataConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.corpus_path.as_os_str().is_empty() {
            return Err("corpus_path must not be empty".to_string());
        }
        if self.directions_path.as_os_str().is_empty() {
            return Err("directions_path must not be empty".to_string());
        }
        Ok(())
    }
}

/// Request-path engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Results per board when the caller does not ask for a count
    pub default_top_k: usize,
    /// Per-search deadline in milliseconds (0 disables)
    pub search_timeout_ms: u64,
    /// Mood scalar range handling
    pub mood_range: MoodRangePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_top_k: retrieval::DEFAULT_TOP_K,
            search_timeout_ms: retrieval::DEFAULT_SEARCH_TIMEOUT_MS,
            mood_range: MoodRangePolicy::Permissive,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.default_top_k == 0 {
            return Err("default_top_k must be > 0".to_string());
        }
        Ok(())
    }

    /// Search deadline, `None` when disabled.
    pub fn search_timeout(&self) -> Option<Duration> {
        (self.search_timeout_ms > 0).then(|| Duration::from_millis(self.search_timeout_ms))
    }
}

/// Session store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Time-to-live for session state, in seconds
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: session::DEFAULT_TTL_SECS,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.ttl_secs == 0 {
            return Err("ttl_secs must be > 0".to_string());
        }
        Ok(())
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Remote vector database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Address of the vector database
    pub endpoint: String,
    /// Collection holding image embeddings
    pub collection: String,
    /// Metric the database reports scores in
    pub metric: RemoteMetric,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:19530".to_string(),
            collection: "image_embeddings".to_string(),
            metric: RemoteMetric::L2,
        }
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if self.collection.trim().is_empty() {
            return Err("collection must not be empty".to_string());
        }
        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvokeConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl EvokeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// - `EvokeError::InvalidConfig` if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> EvokeResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EvokeError::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&contents).map_err(|e| {
            EvokeError::InvalidConfig(format!(
                "Failed to parse TOML in '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> EvokeResult<Self> {
        toml::from_str(toml)
            .map_err(|e| EvokeError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml_string(&self) -> EvokeResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| EvokeError::InvalidConfig(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Validate every section, returning the first error found.
    pub fn validate(&self) -> EvokeResult<()> {
        self.index
            .validate()
            .map_err(|e| EvokeError::InvalidConfig(format!("[index] {}", e)))?;
        self.data
            .validate()
            .map_err(|e| EvokeError::InvalidConfig(format!("[data] {}", e)))?;
        self.engine
            .validate()
            .map_err(|e| EvokeError::InvalidConfig(format!("[engine] {}", e)))?;
        self.session
            .validate()
            .map_err(|e| EvokeError::InvalidConfig(format!("[session] {}", e)))?;
        if self.index.backend == IndexBackend::Remote {
            self.remote
                .validate()
                .map_err(|e| EvokeError::InvalidConfig(format!("[remote] {}", e)))?;
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    ///
    /// | Variable | Config Path |
    /// |----------|-------------|
    /// | `EVOKE_INDEX_BACKEND` | `index.backend` |
    /// | `EVOKE_INDEX_DIMENSION` | `index.dimension` |
    /// | `EVOKE_INDEX_NLIST` | `index.nlist` |
    /// | `EVOKE_INDEX_NPROBE` | `index.nprobe` |
    /// | `EVOKE_CORPUS_PATH` | `data.corpus_path` |
    /// | `EVOKE_DIRECTIONS_PATH` | `data.directions_path` |
    /// | `EVOKE_DEMO_PATH` | `data.demo_path` (empty disables) |
    /// | `EVOKE_TOP_K` | `engine.default_top_k` |
    /// | `EVOKE_SEARCH_TIMEOUT_MS` | `engine.search_timeout_ms` |
    /// | `EVOKE_SESSION_TTL_SECS` | `session.ttl_secs` |
    /// | `EVOKE_REMOTE_ENDPOINT` | `remote.endpoint` |
    ///
    /// Unparseable numeric values are ignored and leave the field unchanged.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = env::var("EVOKE_INDEX_BACKEND") {
            if let Ok(backend) = val.parse::<IndexBackend>() {
                self.index.backend = backend;
            }
        }
        if let Some(n) = env_parse::<usize>("EVOKE_INDEX_DIMENSION") {
            self.index.dimension = n;
        }
        if let Some(n) = env_parse::<usize>("EVOKE_INDEX_NLIST") {
            self.index.nlist = n;
        }
        if let Some(n) = env_parse::<usize>("EVOKE_INDEX_NPROBE") {
            self.index.nprobe = n;
        }
        if let Ok(val) = env::var("EVOKE_CORPUS_PATH") {
            self.data.corpus_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("EVOKE_DIRECTIONS_PATH") {
            self.data.directions_path = PathBuf::from(val);
        }
        if let Ok(val) = env::var("EVOKE_DEMO_PATH") {
            self.data.demo_path = (!val.is_empty()).then(|| PathBuf::from(val));
        }
        if let Some(n) = env_parse::<usize>("EVOKE_TOP_K") {
            self.engine.default_top_k = n;
        }
        if let Some(n) = env_parse::<u64>("EVOKE_SEARCH_TIMEOUT_MS") {
            self.engine.search_timeout_ms = n;
        }
        if let Some(n) = env_parse::<u64>("EVOKE_SESSION_TTL_SECS") {
            self.session.ttl_secs = n;
        }
        if let Ok(val) = env::var("EVOKE_REMOTE_ENDPOINT") {
            self.remote.endpoint = val;
        }
        self
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
