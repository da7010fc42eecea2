//! Stored record types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Unique identifier of a stored summary (random v4 UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryId(pub Uuid);

impl SummaryId {
    /// Generate a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its string form.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SummaryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SummaryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One persisted conversation summary.
///
/// Created once per run and never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Insertion time (UTC).
    pub timestamp: DateTime<Utc>,
    pub id: SummaryId,
    /// Summary text.
    pub content: String,
    /// Document embedding of `content`.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl SummaryRecord {
    /// Create a record stamped with the current time and a fresh id.
    pub fn new(content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            timestamp: Utc::now(),
            id: SummaryId::new(),
            content: content.into(),
            embedding,
        }
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Timestamp in the stored text form (RFC 3339, microseconds, `Z`).
    pub fn asctime(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// A summary together with its cosine similarity to a query vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSummary {
    #[serde(flatten)]
    pub record: SummaryRecord,
    /// Cosine similarity in `[-1, 1]`; higher is more similar.
    pub score: f32,
}

/// Format a timestamp for storage. The fixed width keeps text ordering
/// identical to chronological ordering.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| crate::MemoryError::InvalidData(format!("bad timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_summary_ids_are_unique_v4() {
        let a = SummaryId::new();
        let b = SummaryId::new();
        assert_ne!(a, b);
        assert_eq!(a.0.get_version_num(), 4);
        assert_eq!(SummaryId::parse(&a.to_string()).unwrap(), a);
        assert!(SummaryId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let s = format_timestamp(&ts);
        assert_eq!(s, "2026-01-02T03:04:05.000000Z");
        assert_eq!(parse_timestamp(&s).unwrap(), ts);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_record_new_and_asctime() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let record = SummaryRecord::new("a chat about rain", vec![0.5; 4]).with_timestamp(ts);
        assert_eq!(record.content, "a chat about rain");
        assert_eq!(record.embedding.len(), 4);
        assert_eq!(record.asctime(), "2026-10-18T09:30:00.000000Z");
    }
}
