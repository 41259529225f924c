//! `evoke info`

use std::path::Path;

use clap::Args;
use serde::Serialize;
use tracing::debug;

use evoke_core::config::{DimensionPolicy, IndexBackend};
use evoke_core::HealthReport;

use super::{emit, load_runtime};

/// Arguments for `info`
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Also probe every component and include the health report
    #[arg(long)]
    pub health: bool,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    backend: IndexBackend,
    dimension: usize,
    corpus_size: usize,
    dimension_policy: DimensionPolicy,
    default_top_k: usize,
    demo_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<HealthReport>,
}

pub async fn info_command(config: Option<&Path>, args: InfoArgs) -> i32 {
    debug!("info_command: args={:?}", args);
    emit("info", run(config, args).await)
}

async fn run(config: Option<&Path>, args: InfoArgs) -> anyhow::Result<InfoOutput> {
    let runtime = load_runtime(config)?;
    let index = runtime.engine().index();
    let corpus_size = index.count().await?;
    let health = if args.health {
        Some(runtime.service.health().await)
    } else {
        None
    };

    Ok(InfoOutput {
        backend: index.backend(),
        dimension: index.dimension(),
        corpus_size,
        dimension_policy: runtime.config.index.dimension_policy,
        default_top_k: runtime.config.engine.default_top_k,
        demo_loaded: runtime.has_demo,
        health,
    })
}
