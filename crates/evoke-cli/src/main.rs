//! Evoke CLI
//!
//! Offline front end for the mood retrieval engine. Every command loads the
//! configured static data, builds the selected index and runs against it in
//! process.
//!
//! # Commands
//!
//! - `info`: backend, dimension, corpus size, demo presence
//! - `search`: top-K images for an embedding file
//! - `refine`: steer an embedding by mood, then search
//! - `demo`: walk through the precanned demo session
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod error;

/// Evoke - mood board retrieval and steering
#[derive(Parser)]
#[command(name = "evoke")]
#[command(author = "Evoke Team")]
#[command(version)]
#[command(about = "Retrieve and steer mood board images from audio embeddings")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a TOML configuration file (defaults are used when omitted)
    #[arg(long, global = true, env = "EVOKE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the loaded index and data
    Info(commands::info::InfoArgs),
    /// Search the corpus with an embedding
    Search(commands::search::SearchArgs),
    /// Refine an embedding by mood, then search
    Refine(commands::refine::RefineArgs),
    /// Run the demo session
    Demo(commands::demo::DemoArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let exit_code = match cli.command {
        Commands::Info(args) => commands::info::info_command(config, args).await,
        Commands::Search(args) => commands::search::search_command(config, args).await,
        Commands::Refine(args) => commands::refine::refine_command(config, args).await,
        Commands::Demo(args) => commands::demo::demo_command(config, args).await,
    };

    std::process::exit(exit_code);
}
