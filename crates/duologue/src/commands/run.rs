//! Run command - hold one dialogue and remember it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use duologue_agent::{
    DialoguePersona, Pipeline, PipelineEvent, PipelineReport, SummaryGenerator, ThemeGenerator,
};
use duologue_config::{SPEAKER_AGENT, SUMMARIZER_AGENT, THEME_AGENT};

use super::{Context, print_records, print_scored, scored_json};
use crate::wiring;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Rounds of conversation (default: dialogue.num_turns)
    #[arg(short, long)]
    pub turns: Option<u32>,

    /// Database file (default: storage.path)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Skip the recent-summaries preview
    #[arg(long)]
    pub no_preview: bool,
}

/// Run the dialogue pipeline once.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    let mut dialogue = config.dialogue();
    if let Some(turns) = args.turns {
        dialogue.num_turns = turns;
    }
    config.validate()?;
    dialogue.validate()?;

    let embedder = wiring::create_embedder(&config.embedding())?;
    let store = Arc::new(wiring::open_store(
        &config.storage(),
        args.db.as_deref(),
        embedder.dimensions(),
    )?);

    if !ctx.json_output && !args.no_preview {
        print_records("Recent Summaries", &store.recent(dialogue.recent_limit)?);
    }

    let speaker_llm = config.resolve_llm(SPEAKER_AGENT)?;
    let theme_llm = config.resolve_llm(THEME_AGENT)?;
    let summary_llm = config.resolve_llm(SUMMARIZER_AGENT)?;

    let speaker_agent = config.agent(SPEAKER_AGENT);
    let persona_prompt = speaker_agent
        .system_prompt
        .clone()
        .unwrap_or_else(|| dialogue.persona_prompt.clone());
    let persona = |name: &str| {
        DialoguePersona::new(name, persona_prompt.clone(), speaker_llm.effective_model())
    };

    let theme_agent = config.agent(THEME_AGENT);
    let theme = ThemeGenerator::new(
        wiring::create_client(&theme_llm)?,
        theme_agent
            .system_prompt
            .unwrap_or_else(|| dialogue.persona_prompt.clone()),
    )
    .with_temperature(theme_agent.temperature.unwrap_or(dialogue.theme_temperature));

    let mut summarizer = SummaryGenerator::new(wiring::create_client(&summary_llm)?);
    if let Some(prompt) = config.agent(SUMMARIZER_AGENT).system_prompt {
        summarizer = summarizer.with_system_prompt(prompt);
    }

    tracing::info!(
        speaker = %speaker_llm.effective_model(),
        summarizer = %summary_llm.effective_model(),
        turns = dialogue.num_turns,
        "Starting dialogue"
    );

    let mut builder = Pipeline::builder()
        .with_personas(
            persona(&dialogue.personas[0]),
            persona(&dialogue.personas[1]),
        )
        .with_speaker_backend(wiring::create_backend(&speaker_llm)?)
        .with_speaker_temperature(speaker_agent.temperature)
        .with_theme_generator(theme)
        .with_summary_generator(summarizer)
        .with_embedder(embedder)
        .with_store(store.clone())
        .with_num_turns(dialogue.num_turns)
        .with_similar_limit(dialogue.similar_limit);
    if !ctx.json_output {
        builder = builder.with_event_handler(Arc::new(print_event));
    }
    let pipeline = builder.build()?;

    let report = pipeline.run().await?;
    drop(pipeline);

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print_scored("Similar Summaries", &report.similar);
    }

    match Arc::try_unwrap(store) {
        Ok(store) => store.close()?,
        Err(_) => tracing::debug!("Store still shared, closing on drop"),
    }
    Ok(())
}

/// Live console output while the pipeline runs.
fn print_event(event: &PipelineEvent) {
    let dim = Style::new().dim();
    match event {
        PipelineEvent::ThemeGenerated { theme } => {
            println!("{} {}", style("Theme:").bold(), style(theme).cyan());
            println!();
        }
        PipelineEvent::RoundStarted { round } => {
            println!("{}", dim.apply_to(format!("Turn {}:", round)));
        }
        PipelineEvent::Turn(turn) => {
            println!("{}: {}", style(&turn.speaker).green().bold(), turn.text.trim());
        }
        PipelineEvent::ConversationFinished { turns } => {
            println!();
            println!("{}", dim.apply_to(format!("Conversation finished ({} turns)", turns)));
            println!();
        }
        PipelineEvent::SummaryGenerated(summary) => {
            println!("{}", style("Summary").bold());
            println!("{}", dim.apply_to("─".repeat(50)));
            println!("{}", summary.text);
            if !summary.marker_found {
                println!("{}", dim.apply_to("(summary marker missing, raw reply used)"));
            }
            println!();
        }
        PipelineEvent::SummaryStored { id } => {
            println!("{}", dim.apply_to(format!("Stored summary {}", id)));
            println!();
        }
        PipelineEvent::StoreFailed { error, .. } => {
            let red = Style::new().red();
            eprintln!("{} {}", red.apply_to("Error storing summary:"), error);
            println!();
        }
    }
}

fn report_json(report: &PipelineReport) -> serde_json::Value {
    serde_json::json!({
        "theme": report.theme,
        "turns": report.transcript,
        "summary": report.summary.text,
        "summary_marker_found": report.summary.marker_found,
        "id": report.record.id.to_string(),
        "asctime": report.record.asctime(),
        "stored": report.stored,
        "similar": report.similar.iter().map(scored_json).collect::<Vec<_>>(),
    })
}
