//! Tracing setup: console layer plus an optional daily-rotated JSON file.

use std::path::PathBuf;

use duologue_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const CONSOLE_FILTER: &str = "duologue=info,duologue_agent=info,duologue_llm=info,duologue_memory=info,duologue_config=info,warn";
const VERBOSE_FILTER: &str = "duologue=debug,duologue_agent=debug,duologue_llm=debug,duologue_memory=debug,duologue_config=debug,info";
const FILE_FILTER: &str = "duologue=trace,duologue_agent=trace,duologue_llm=trace,duologue_memory=trace,duologue_config=trace,info";

/// Install the global subscriber.
///
/// `RUST_LOG` replaces the console filter when set. The returned guard
/// flushes the file writer on drop and must live until exit.
pub fn init(verbose: bool, config: &LoggingConfig) -> Option<WorkerGuard> {
    let console_filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { VERBOSE_FILTER } else { CONSOLE_FILTER }));

    let console = tracing_subscriber::fmt::layer()
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file, guard) = if config.file {
        let dir = log_dir(config);
        let appender = tracing_appender::rolling::daily(&dir, "duologue.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(EnvFilter::new(FILE_FILTER));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}

/// Configured directory, else `<config dir>/logs`, else `./logs`.
fn log_dir(config: &LoggingConfig) -> PathBuf {
    config
        .dir
        .clone()
        .or_else(|| duologue_config::user_config_dir().map(|d| d.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"))
}
