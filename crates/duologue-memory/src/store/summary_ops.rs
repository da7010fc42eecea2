//! Summary insert and query operations.

use rusqlite::{Row, params};
use tracing::debug;

use crate::error::Result;
use crate::types::{ScoredSummary, SummaryId, SummaryRecord, parse_timestamp};
use crate::validation::{validate_embedding, validate_record};
use crate::vector::{blob_to_embedding, embedding_as_blob};

use super::SummaryStore;

impl SummaryStore {
    /// Append one summary record.
    ///
    /// # Errors
    ///
    /// Fails on empty content, a wrong-length or non-finite embedding, or a
    /// database error. Nothing is written on failure.
    pub fn insert(&self, record: &SummaryRecord) -> Result<()> {
        validate_record(record, self.dimensions)?;

        let conn = self.conn.lock();
        conn.execute(
            &format!(
                "INSERT INTO {} (asctime, id, content, embedding) VALUES (?1, ?2, ?3, ?4)",
                self.table
            ),
            params![
                record.asctime(),
                record.id.to_string(),
                record.content,
                embedding_as_blob(&record.embedding),
            ],
        )?;

        debug!(id = %record.id, table = %self.table, "Inserted summary");
        Ok(())
    }

    /// The `k` stored summaries most similar to `query` by cosine similarity.
    ///
    /// Ordered by descending score; equal scores keep insertion order.
    /// Returns fewer than `k` rows when the table holds fewer. A zero-norm
    /// vector on either side scores 0.0.
    pub fn top_k_similar(&self, query: &[f32], k: usize) -> Result<Vec<ScoredSummary>> {
        validate_embedding(query, self.dimensions)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT asctime, id, content, embedding, \
                    COALESCE(1.0 - vec_distance_cosine(embedding, ?1), 0.0) AS score \
             FROM {} \
             ORDER BY score DESC, rowid ASC \
             LIMIT ?2",
            self.table
        ))?;

        let rows = stmt.query_map(params![embedding_as_blob(query), sql_limit(k)], |row| {
            let score: Option<f64> = row.get(4)?;
            Ok((RawRow::from_row(row)?, score.unwrap_or(0.0)))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (raw, score) = row?;
            results.push(ScoredSummary {
                record: raw.into_record()?,
                score: score as f32,
            });
        }

        debug!(k, found = results.len(), "Similarity search complete");
        Ok(results)
    }

    /// The `n` most recent summaries, newest first.
    pub fn recent(&self, n: usize) -> Result<Vec<SummaryRecord>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT asctime, id, content, embedding FROM {} \
             ORDER BY asctime DESC, rowid DESC \
             LIMIT ?1",
            self.table
        ))?;

        let rows = stmt.query_map(params![sql_limit(n)], RawRow::from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    /// Number of stored summaries.
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }
}

/// LIMIT values above `i64::MAX` saturate instead of wrapping negative.
fn sql_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Column values as read, before parsing.
struct RawRow {
    asctime: String,
    id: String,
    content: String,
    embedding: Vec<u8>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            asctime: row.get(0)?,
            id: row.get(1)?,
            content: row.get(2)?,
            embedding: row.get(3)?,
        })
    }

    fn into_record(self) -> Result<SummaryRecord> {
        Ok(SummaryRecord {
            timestamp: parse_timestamp(&self.asctime)?,
            id: SummaryId::parse(&self.id)?,
            content: self.content,
            embedding: blob_to_embedding(&self.embedding)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;
    use crate::validation::ValidationError;
    use chrono::{Duration, Utc};

    fn store(dims: usize) -> SummaryStore {
        let store = SummaryStore::open_in_memory(dims).unwrap();
        store.ensure_table().unwrap();
        store
    }

    #[test]
    fn test_insert_then_recent_returns_record() {
        let store = store(3);
        let record = SummaryRecord::new("They talked about tides.", vec![0.1, 0.2, 0.3]);
        store.insert(&record).unwrap();

        let recent = store.recent(1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, record.id);
        assert_eq!(recent[0].content, record.content);
        assert_eq!(recent[0].embedding, record.embedding);
        assert_eq!(recent[0].asctime(), record.asctime());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let store = store(2);
        let now = Utc::now();
        for (i, text) in ["oldest", "middle", "newest"].iter().enumerate() {
            let record = SummaryRecord::new(*text, vec![1.0, i as f32])
                .with_timestamp(now + Duration::seconds(i as i64));
            store.insert(&record).unwrap();
        }

        let recent = store.recent(2).unwrap();
        assert_eq!(
            recent.iter().map(|r| r.content.as_str()).collect::<Vec<_>>(),
            vec!["newest", "middle"]
        );
        assert_eq!(store.recent(10).unwrap().len(), 3);
        assert!(store.recent(0).unwrap().is_empty());
    }

    #[test]
    fn test_recent_same_timestamp_prefers_later_insert() {
        let store = store(2);
        let now = Utc::now();
        store
            .insert(&SummaryRecord::new("first", vec![1.0, 0.0]).with_timestamp(now))
            .unwrap();
        store
            .insert(&SummaryRecord::new("second", vec![1.0, 0.0]).with_timestamp(now))
            .unwrap();
        assert_eq!(store.recent(1).unwrap()[0].content, "second");
    }

    #[test]
    fn test_top_k_orders_by_similarity() {
        let store = store(3);
        store
            .insert(&SummaryRecord::new("weather", vec![1.0, 0.0, 0.0]))
            .unwrap();
        store
            .insert(&SummaryRecord::new("cooking", vec![0.0, 1.0, 0.0]))
            .unwrap();
        store
            .insert(&SummaryRecord::new("mostly weather", vec![0.9, 0.1, 0.0]))
            .unwrap();

        let results = store.top_k_similar(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.content, "weather");
        assert_eq!(results[1].record.content, "mostly weather");
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_top_k_ties_keep_insertion_order() {
        let store = store(2);
        store
            .insert(&SummaryRecord::new("first", vec![0.6, 0.8]))
            .unwrap();
        store
            .insert(&SummaryRecord::new("second", vec![0.6, 0.8]))
            .unwrap();
        store
            .insert(&SummaryRecord::new("third", vec![0.6, 0.8]))
            .unwrap();

        let results = store.top_k_similar(&[1.0, 0.0], 3).unwrap();
        assert_eq!(
            results
                .iter()
                .map(|r| r.record.content.as_str())
                .collect::<Vec<_>>(),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn test_top_k_empty_table_and_zero_k() {
        let store = store(2);
        assert!(store.top_k_similar(&[1.0, 0.0], 3).unwrap().is_empty());

        store
            .insert(&SummaryRecord::new("one", vec![1.0, 0.0]))
            .unwrap();
        assert!(store.top_k_similar(&[1.0, 0.0], 0).unwrap().is_empty());
        assert_eq!(store.top_k_similar(&[1.0, 0.0], 5).unwrap().len(), 1);
    }

    #[test]
    fn test_top_k_zero_vectors_score_zero() {
        let store = store(3);
        store
            .insert(&SummaryRecord::new("silent", vec![0.0, 0.0, 0.0]))
            .unwrap();
        store
            .insert(&SummaryRecord::new("weather", vec![1.0, 0.0, 0.0]))
            .unwrap();

        let results = store.top_k_similar(&[1.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.content, "weather");
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert_eq!(results[1].record.content, "silent");
        assert_eq!(results[1].score, 0.0);

        let results = store.top_k_similar(&[0.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(
            results
                .iter()
                .map(|r| r.record.content.as_str())
                .collect::<Vec<_>>(),
            vec!["silent", "weather"]
        );
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_huge_limits_return_all_rows() {
        let store = store(2);
        store
            .insert(&SummaryRecord::new("one", vec![1.0, 0.0]))
            .unwrap();
        store
            .insert(&SummaryRecord::new("two", vec![0.0, 1.0]))
            .unwrap();

        assert_eq!(store.top_k_similar(&[1.0, 0.0], usize::MAX).unwrap().len(), 2);
        assert_eq!(store.top_k_similar(&[1.0, 0.0], usize::MAX / 2).unwrap().len(), 2);
        assert_eq!(store.recent(usize::MAX).unwrap().len(), 2);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
        assert_eq!(sql_limit(3), 3);
    }

    #[test]
    fn test_insert_rejects_wrong_dimensions() {
        let store = store(3);
        let err = store
            .insert(&SummaryRecord::new("short", vec![1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            MemoryError::Validation(ValidationError::DimensionMismatch { .. })
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_query_rejects_wrong_dimensions() {
        let store = store(3);
        assert!(store.top_k_similar(&[1.0], 3).is_err());
    }

    #[test]
    fn test_insert_rejects_empty_content() {
        let store = store(2);
        assert!(store.insert(&SummaryRecord::new("  ", vec![1.0, 0.0])).is_err());
    }

    #[test]
    fn test_records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dialogue.db");

        let record = SummaryRecord::new("persisted", vec![0.5, 0.5]);
        {
            let store = SummaryStore::open(&path, 2).unwrap();
            store.ensure_table().unwrap();
            store.insert(&record).unwrap();
            store.close().unwrap();
        }

        let store = SummaryStore::open(&path, 2).unwrap();
        assert!(!store.ensure_table().unwrap());
        let recent = store.recent(5).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, record.id);
    }
}
