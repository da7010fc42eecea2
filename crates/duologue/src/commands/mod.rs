//! CLI command handlers.

pub mod recent;
pub mod run;
pub mod search;

use console::{Style, style};
use duologue_config::DuologueConfig;
use duologue_memory::{ScoredSummary, SummaryRecord};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration.
    pub config: DuologueConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Print stored summaries newest first, or a placeholder when there are none.
pub(crate) fn print_records(title: &str, records: &[SummaryRecord]) {
    let dim = Style::new().dim();
    println!("{}", style(title).bold());
    println!("{}", dim.apply_to("─".repeat(50)));

    if records.is_empty() {
        println!("{}", dim.apply_to("No summaries yet"));
        println!();
        return;
    }

    for record in records {
        println!(
            "{}  {}",
            dim.apply_to(record.timestamp.format("%Y-%m-%d %H:%M:%S")),
            truncate(&record.content, 70)
        );
    }
    println!();
}

/// Print similarity results best first.
pub(crate) fn print_scored(title: &str, results: &[ScoredSummary]) {
    let dim = Style::new().dim();
    println!("{}", style(title).bold());
    println!("{}", dim.apply_to("─".repeat(50)));

    if results.is_empty() {
        println!("{}", dim.apply_to("No summaries yet"));
        println!();
        return;
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. {}",
            style(i + 1).cyan(),
            truncate(&result.record.content, 70)
        );
        println!(
            "   {}",
            dim.apply_to(format!(
                "(score: {:.3}, {})",
                result.score,
                result.record.timestamp.format("%Y-%m-%d %H:%M:%S")
            ))
        );
    }
    println!();
}

/// JSON view of a record without its embedding.
pub(crate) fn record_json(record: &SummaryRecord) -> serde_json::Value {
    serde_json::json!({
        "asctime": record.asctime(),
        "id": record.id.to_string(),
        "content": record.content,
    })
}

/// JSON view of a scored record without its embedding.
pub(crate) fn scored_json(result: &ScoredSummary) -> serde_json::Value {
    let mut value = record_json(&result.record);
    value["score"] = serde_json::json!(result.score);
    value
}

/// Collapse newlines and cut to `max_chars` characters.
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_and_long() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 100), "line one line two");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("月面でのお茶会の話", 6), "月面で...");
    }

    #[test]
    fn test_json_views_omit_embedding() {
        let record = SummaryRecord::new("tea", vec![1.0, 2.0]);
        let value = record_json(&record);
        assert_eq!(value["content"], "tea");
        assert!(value.get("embedding").is_none());

        let scored = scored_json(&ScoredSummary {
            record,
            score: 0.5,
        });
        assert_eq!(scored["score"], 0.5);
    }
}
