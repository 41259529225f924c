//! `evoke demo`
//!
//! Starts the demo session, prints its precomputed board and, when
//! `--refine` is given, moves the sliders once and prints the live board.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::{debug, info};

use evoke_core::types::MoodVector;
use evoke_core::BoardView;

use super::{emit, load_runtime};

/// Arguments for `demo`
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Slider positions as `energy,valence,tempo,texture`
    #[arg(long, value_parser = parse_mood, allow_hyphen_values = true)]
    pub refine: Option<MoodVector>,

    /// Number of results for the refined board
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
struct DemoOutput {
    demo: BoardView,
    #[serde(skip_serializing_if = "Option::is_none")]
    refined: Option<BoardView>,
}

pub async fn demo_command(config: Option<&Path>, args: DemoArgs) -> i32 {
    debug!("demo_command: args={:?}", args);
    emit("demo", run(config, args).await)
}

async fn run(config: Option<&Path>, args: DemoArgs) -> anyhow::Result<DemoOutput> {
    let runtime = load_runtime(config)?;
    let service = &runtime.service;

    let demo = service.demo().await?;
    info!(session_id = %demo.session_id, "demo session started");

    let refined = match args.refine {
        Some(mood) => {
            let ctx = service.engine().default_context();
            let view = service
                .refine(&ctx, &demo.session_id, mood, args.top_k)
                .await
                .context("refining demo session")?;
            Some(view)
        }
        None => None,
    };

    Ok(DemoOutput { demo, refined })
}

/// Parse `energy,valence,tempo,texture`.
fn parse_mood(raw: &str) -> Result<MoodVector, String> {
    let values = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| format!("'{}': {}", part.trim(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [energy, valence, tempo, texture] => {
            Ok(MoodVector::new(*energy, *valence, *tempo, *texture))
        }
        _ => Err(format!(
            "expected 4 comma-separated values (energy,valence,tempo,texture), got {}",
            values.len()
        )),
    }
}
