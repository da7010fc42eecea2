//! Summary storage for duologue.
//!
//! Each dialogue run ends with one [`SummaryRecord`]: the summary text, its
//! document embedding, a timestamp and a random id. Records are appended to
//! a SQLite table and later queried by cosine similarity or by recency.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  SummaryStore                                            │
//! │  - Single SQLite file with WAL mode                      │
//! │  - summaries(asctime, id, content, embedding BLOB)       │
//! │  - meta(key, value) remembers embedding dimensions       │
//! │  - sqlite-vec vec_distance_cosine for similarity         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use duologue_memory::{SummaryRecord, SummaryStore};
//!
//! let store = SummaryStore::open("data/dialogue.db", 768)?;
//! store.ensure_table()?;
//!
//! store.insert(&SummaryRecord::new("They argued about tea.", vec![0.0; 768]))?;
//! let similar = store.top_k_similar(&vec![0.0; 768], 3)?;
//! let latest = store.recent(3)?;
//! # Ok::<(), duologue_memory::MemoryError>(())
//! ```

pub mod backend;
pub mod error;
pub mod store;
pub mod types;
pub mod validation;
pub mod vector;

pub use backend::SummaryBackend;
#[cfg(any(test, feature = "testing"))]
pub use backend::MockSummaryBackend;
pub use error::{MemoryError, Result};
pub use store::{DEFAULT_TABLE, SummaryStore};
pub use types::{ScoredSummary, SummaryId, SummaryRecord, format_timestamp, parse_timestamp};
pub use validation::ValidationError;

impl SummaryBackend for SummaryStore {
    fn ensure_table(&self) -> Result<bool> {
        SummaryStore::ensure_table(self)
    }

    fn insert(&self, record: &SummaryRecord) -> Result<()> {
        SummaryStore::insert(self, record)
    }

    fn top_k_similar(&self, query: &[f32], k: usize) -> Result<Vec<ScoredSummary>> {
        SummaryStore::top_k_similar(self, query, k)
    }

    fn recent(&self, n: usize) -> Result<Vec<SummaryRecord>> {
        SummaryStore::recent(self, n)
    }

    fn count(&self) -> Result<usize> {
        SummaryStore::count(self)
    }

    fn dimensions(&self) -> usize {
        SummaryStore::dimensions(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_store_behind_trait_object() {
        let backend: Arc<dyn SummaryBackend> = Arc::new(SummaryStore::open_in_memory(2).unwrap());
        assert!(backend.ensure_table().unwrap());
        backend
            .insert(&SummaryRecord::new("via trait", vec![1.0, 0.0]))
            .unwrap();
        assert_eq!(backend.count().unwrap(), 1);
        assert_eq!(backend.dimensions(), 2);
        assert_eq!(backend.top_k_similar(&[1.0, 0.0], 3).unwrap().len(), 1);
    }
}
