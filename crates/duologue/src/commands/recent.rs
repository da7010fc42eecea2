//! Recent command - list the newest stored summaries.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::{Context, print_records, record_json};
use crate::wiring;

/// Arguments for the recent command.
#[derive(Args, Debug)]
pub struct RecentArgs {
    /// Number of summaries to show (default: dialogue.recent_limit)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Database file (default: storage.path)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

/// Run the recent command.
pub async fn run(args: RecentArgs, ctx: &Context) -> Result<()> {
    let limit = args.limit.unwrap_or(ctx.config.dialogue().recent_limit);
    let dimensions = ctx.config.embedding().effective_dimensions();

    let store = wiring::open_store(&ctx.config.storage(), args.db.as_deref(), dimensions)?;
    let records = store.recent(limit)?;
    store.close()?;

    if ctx.json_output {
        let values: Vec<_> = records.iter().map(record_json).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        print_records("Recent Summaries", &records);
    }
    Ok(())
}
