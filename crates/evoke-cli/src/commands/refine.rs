//! `evoke refine`

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{debug, info};

use evoke_core::config::constants::mood::NEUTRAL as NEUTRAL_MOOD;
use evoke_core::types::MoodVector;
use evoke_core::RefinedRetrieval;

use super::{emit, load_runtime, read_embedding};

/// Arguments for `refine`
#[derive(Args, Debug)]
pub struct RefineArgs {
    /// JSON file holding the base embedding (array of numbers)
    #[arg(long)]
    pub embedding: PathBuf,

    /// Energy slider
    #[arg(long, default_value_t = NEUTRAL_MOOD, allow_negative_numbers = true)]
    pub energy: f32,

    /// Valence slider
    #[arg(long, default_value_t = NEUTRAL_MOOD, allow_negative_numbers = true)]
    pub valence: f32,

    /// Tempo slider
    #[arg(long, default_value_t = NEUTRAL_MOOD, allow_negative_numbers = true)]
    pub tempo: f32,

    /// Texture slider
    #[arg(long, default_value_t = NEUTRAL_MOOD, allow_negative_numbers = true)]
    pub texture: f32,

    /// Number of results (defaults to `engine.default_top_k`)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

impl RefineArgs {
    fn mood(&self) -> MoodVector {
        MoodVector::new(self.energy, self.valence, self.tempo, self.texture)
    }
}

pub async fn refine_command(config: Option<&Path>, args: RefineArgs) -> i32 {
    debug!("refine_command: args={:?}", args);
    emit("refine", run(config, args).await)
}

async fn run(config: Option<&Path>, args: RefineArgs) -> anyhow::Result<RefinedRetrieval> {
    let runtime = load_runtime(config)?;
    let base = read_embedding(&args.embedding)?;
    let engine = runtime.engine();
    let k = args.top_k.unwrap_or(engine.config().default_top_k);
    let mood = args.mood();

    let out = engine
        .refine_and_retrieve(&engine.default_context(), &base, &mood, k)
        .await?;
    info!(k, returned = out.results.len(), "refine complete");
    Ok(out)
}
