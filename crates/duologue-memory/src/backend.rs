//! Summary backend trait for pluggable storage.
//!
//! The pipeline talks to storage through [`SummaryBackend`] so that tests
//! can swap the SQLite store for [`MockSummaryBackend`], including one that
//! refuses inserts.

use crate::error::Result;
use crate::types::{ScoredSummary, SummaryRecord};

/// Trait for summary storage backends.
///
/// All implementations must be `Send + Sync`.
pub trait SummaryBackend: Send + Sync {
    /// Create the summary table if it does not exist.
    ///
    /// Returns `true` if the table was created by this call.
    fn ensure_table(&self) -> Result<bool>;

    /// Append one record.
    ///
    /// # Errors
    ///
    /// Fails if the record's embedding length differs from
    /// [`dimensions`](SummaryBackend::dimensions), or on storage errors.
    fn insert(&self, record: &SummaryRecord) -> Result<()>;

    /// The `k` records most similar to `query`, highest score first, ties in
    /// insertion order. An empty table or `k == 0` yields an empty vector.
    fn top_k_similar(&self, query: &[f32], k: usize) -> Result<Vec<ScoredSummary>>;

    /// The `n` most recently inserted records, newest first.
    fn recent(&self, n: usize) -> Result<Vec<SummaryRecord>>;

    /// Number of stored records.
    fn count(&self) -> Result<usize>;

    /// Embedding length this backend accepts.
    fn dimensions(&self) -> usize;
}

#[cfg(any(test, feature = "testing"))]
pub use mock::MockSummaryBackend;

#[cfg(any(test, feature = "testing"))]
mod mock {
    use std::sync::atomic::{AtomicBool, Ordering};

    use parking_lot::Mutex;

    use super::SummaryBackend;
    use crate::error::{MemoryError, Result};
    use crate::types::{ScoredSummary, SummaryRecord};
    use crate::validation::{validate_embedding, validate_record};
    use crate::vector::cosine_similarity;

    /// In-memory summary backend for testing.
    #[derive(Debug)]
    pub struct MockSummaryBackend {
        dimensions: usize,
        records: Mutex<Vec<SummaryRecord>>,
        table_created: AtomicBool,
        fail_inserts: AtomicBool,
    }

    impl MockSummaryBackend {
        /// Create an empty backend accepting `dimensions`-length embeddings.
        pub fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                records: Mutex::new(Vec::new()),
                table_created: AtomicBool::new(false),
                fail_inserts: AtomicBool::new(false),
            }
        }

        /// A backend whose inserts always fail.
        pub fn failing_inserts(dimensions: usize) -> Self {
            let backend = Self::new(dimensions);
            backend.set_fail_inserts(true);
            backend
        }

        /// Toggle insert failure injection.
        pub fn set_fail_inserts(&self, fail: bool) {
            self.fail_inserts.store(fail, Ordering::SeqCst);
        }

        /// Seed a record directly, bypassing failure injection.
        pub fn seed(&self, record: SummaryRecord) {
            self.records.lock().push(record);
        }

        /// Snapshot of all records in insertion order.
        pub fn records(&self) -> Vec<SummaryRecord> {
            self.records.lock().clone()
        }
    }

    impl SummaryBackend for MockSummaryBackend {
        fn ensure_table(&self) -> Result<bool> {
            Ok(!self.table_created.swap(true, Ordering::SeqCst))
        }

        fn insert(&self, record: &SummaryRecord) -> Result<()> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(MemoryError::Unavailable(
                    "MockSummaryBackend: insert failure injected".to_string(),
                ));
            }
            validate_record(record, self.dimensions)?;
            self.records.lock().push(record.clone());
            Ok(())
        }

        fn top_k_similar(&self, query: &[f32], k: usize) -> Result<Vec<ScoredSummary>> {
            validate_embedding(query, self.dimensions)?;
            let records = self.records.lock();
            let mut scored: Vec<ScoredSummary> = records
                .iter()
                .map(|r| ScoredSummary {
                    score: cosine_similarity(&r.embedding, query),
                    record: r.clone(),
                })
                .collect();
            // Stable sort keeps insertion order among equal scores.
            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
            scored.truncate(k);
            Ok(scored)
        }

        fn recent(&self, n: usize) -> Result<Vec<SummaryRecord>> {
            let records = self.records.lock();
            let mut newest: Vec<SummaryRecord> = records.iter().rev().cloned().collect();
            newest.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            newest.truncate(n);
            Ok(newest)
        }

        fn count(&self) -> Result<usize> {
            Ok(self.records.lock().len())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }
}
