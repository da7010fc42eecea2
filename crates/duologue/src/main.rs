//! Duologue - two language-model personas talk, and the conversation is remembered.
//!
//! Main entry point for the duologue CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod wiring;

use commands::{recent, run, search};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Duologue - scripted two-agent dialogue with summary memory
#[derive(Parser)]
#[command(name = "duologue")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file to use instead of the discovered ones
    #[arg(short, long, global = true, env = "DUOLOGUE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a theme, hold a dialogue, then summarize and store it
    Run(run::RunArgs),

    /// Show the most recent summaries
    Recent(recent::RecentArgs),

    /// Find summaries similar to a query
    Search(search::SearchArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, warnings, sources) = match cli.config {
        Some(ref path) => (duologue_config::load_config_file(path)?, Vec::new(), vec![path.clone()]),
        None => {
            let loaded = duologue_config::load_config(None)?;
            let sources = loaded.loaded_from().iter().map(|p| p.to_path_buf()).collect();
            (loaded.config, loaded.warnings, sources)
        }
    };

    let _guard = logging::init(cli.verbose, &config.logging());

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    for source in &sources {
        tracing::debug!(path = %source.display(), "Loaded config");
    }

    let ctx = commands::Context {
        config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Run(args) => run::run(args, &ctx).await,
        Commands::Recent(args) => recent::run(args, &ctx).await,
        Commands::Search(args) => search::run(args, &ctx).await,
    }
}
