//! Search command - find stored summaries similar to a query.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::Style;

use super::{Context, print_scored, scored_json};
use crate::wiring;

/// Arguments for the search command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Maximum results to return (default: dialogue.similar_limit)
    #[arg(short = 'k', long)]
    pub limit: Option<usize>,

    /// Database file (default: storage.path)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let limit = args.limit.unwrap_or(ctx.config.dialogue().similar_limit);
    let embedder = wiring::create_embedder(&ctx.config.embedding())?;
    let store = wiring::open_store(
        &ctx.config.storage(),
        args.db.as_deref(),
        embedder.dimensions(),
    )?;

    if ctx.verbose && !ctx.json_output {
        let dim = Style::new().dim();
        println!(
            "{}",
            dim.apply_to(format!("Searching: \"{}\" (limit: {})", args.query, limit))
        );
        println!();
    }

    let query = embedder.encode_query(&args.query).await?;
    let results = store.top_k_similar(&query, limit)?;
    store.close()?;

    if ctx.json_output {
        let values: Vec<_> = results.iter().map(scored_json).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        print_scored("Similar Summaries", &results);
    }
    Ok(())
}
