//! `evoke search`

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{debug, info};

use evoke_core::types::RetrievalResult;

use super::{emit, load_runtime, read_embedding};

/// Arguments for `search`
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// JSON file holding the query embedding (array of numbers)
    #[arg(long)]
    pub embedding: PathBuf,

    /// Number of results (defaults to `engine.default_top_k`)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

pub async fn search_command(config: Option<&Path>, args: SearchArgs) -> i32 {
    debug!("search_command: args={:?}", args);
    emit("search", run(config, args).await)
}

async fn run(config: Option<&Path>, args: SearchArgs) -> anyhow::Result<Vec<RetrievalResult>> {
    let runtime = load_runtime(config)?;
    let query = read_embedding(&args.embedding)?;
    let engine = runtime.engine();
    let k = args.top_k.unwrap_or(engine.config().default_top_k);

    let results = engine
        .retrieve_for_embedding(&engine.default_context(), &query, k)
        .await?;
    info!(k, returned = results.len(), "search complete");
    Ok(results)
}
