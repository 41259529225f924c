//! CLI command implementations.
//!
//! Every command builds the same in-process stack from the configuration:
//! static data, index, refiner, engine, and a board service backed by the
//! in-memory session store and the deterministic stub analyzer.

pub mod demo;
pub mod info;
pub mod refine;
pub mod search;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, error, info};

use evoke_core::config::EvokeConfig;
use evoke_core::data::StaticData;
use evoke_core::refine::EmbeddingRefiner;
use evoke_core::session::InMemorySessionStore;
use evoke_core::stubs::StubAudioAnalyzer;
use evoke_core::types::Embedding;
use evoke_core::{build_index, MoodBoardService, MoodRetrievalEngine};

use crate::error::{exit_code_for_error, CliExitCode};

/// Everything a command needs after startup.
pub struct Runtime {
    pub config: EvokeConfig,
    pub service: MoodBoardService,
    pub has_demo: bool,
}

impl Runtime {
    #[inline]
    pub fn engine(&self) -> &MoodRetrievalEngine {
        self.service.engine()
    }
}

/// Resolve the configuration: file (or defaults), then `EVOKE_*` overrides,
/// then validation.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EvokeConfig> {
    let config = match path {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            EvokeConfig::from_file(path)?
        }
        None => EvokeConfig::default(),
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Load static data and assemble the service.
///
/// Any failure here is a startup failure: the data or configuration is
/// unusable and no command can run.
pub fn load_runtime(path: Option<&Path>) -> anyhow::Result<Runtime> {
    let config = load_config(path).context("configuration")?;
    let dimension = config.index.dimension;

    let data = StaticData::load(&config.data, dimension).context("static data")?;
    let has_demo = data.demo.is_some();

    // No remote client is wired into the CLI; the remote backend fails here.
    let index = build_index(&config, data.corpus, None).context("index")?;
    info!(
        backend = %index.backend(),
        dimension,
        "Index ready"
    );

    let engine = MoodRetrievalEngine::new(
        EmbeddingRefiner::new(Arc::new(data.directions)),
        index,
        config.engine.clone(),
    );
    let service = MoodBoardService::new(
        engine,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(StubAudioAnalyzer::new(dimension)),
        data.demo,
        config.session.ttl(),
    )
    .context("board service")?;

    Ok(Runtime {
        config,
        service,
        has_demo,
    })
}

/// Read a JSON array of floats from `path`.
pub fn read_embedding(path: &Path) -> anyhow::Result<Embedding> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read embedding file '{}'", path.display()))?;
    let embedding: Embedding = serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a JSON array of numbers", path.display()))?;
    if embedding.is_empty() {
        anyhow::bail!("embedding file '{}' is empty", path.display());
    }
    Ok(embedding)
}

/// Print `value` as pretty JSON on stdout, or log the error on stderr, and
/// return the process exit code.
pub fn emit<T: Serialize>(command: &str, outcome: anyhow::Result<T>) -> i32 {
    let value = match outcome {
        Ok(value) => value,
        Err(e) => {
            let code = exit_code_for_error(&e);
            error!("{} failed: {:#}", command, e);
            eprintln!("Error: {:#}", e);
            return code.into();
        }
    };
    match serde_json::to_string_pretty(&value) {
        Ok(json) => {
            println!("{}", json);
            CliExitCode::Success.into()
        }
        Err(e) => {
            error!("{}: failed to serialize output: {}", command, e);
            eprintln!("Error: failed to serialize output: {}", e);
            CliExitCode::Failure.into()
        }
    }
}
