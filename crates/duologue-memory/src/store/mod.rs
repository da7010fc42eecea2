//! Summary store implementation using SQLite.
//!
//! One database file holds the summary table and a small `meta` table that
//! remembers the embedding size each summary table was created with.
//! Similarity is computed in SQL by sqlite-vec's `vec_distance_cosine`.

mod summary_ops;

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{MemoryError, Result};
use crate::validation::validate_table_name;

/// Default summary table name.
pub const DEFAULT_TABLE: &str = "summaries";

/// Summary store backed by SQLite.
///
/// Uses WAL mode so `recent` and `search` from another process do not block
/// a running dialogue.
pub struct SummaryStore {
    /// The SQLite connection.
    pub(crate) conn: Mutex<Connection>,
    /// Validated table name, safe to interpolate into SQL.
    pub(crate) table: String,
    /// Embedding length accepted by this store.
    pub(crate) dimensions: usize,
}

impl std::fmt::Debug for SummaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryStore")
            .field("table", &self.table)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Initialization
// ─────────────────────────────────────────────────────────────────────────────

impl SummaryStore {
    /// Open or create a summary store at the given path.
    ///
    /// Creates the parent directory if needed. The summary table itself is
    /// created by [`ensure_table`](Self::ensure_table).
    pub fn open(path: impl AsRef<Path>, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        crate::vector::init_vector_extension();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let store = Self::from_connection(conn, dimensions)?;
        info!(path = %path.display(), dimensions, "Summary store opened");
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        crate::vector::init_vector_extension();
        let conn = Connection::open_in_memory()?;
        let store = Self::from_connection(conn, dimensions)?;
        debug!(dimensions, "In-memory summary store created");
        Ok(store)
    }

    fn from_connection(conn: Connection, dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(MemoryError::InvalidData(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        let version = crate::vector::check_vector_extension(&conn)?;
        debug!(sqlite_vec = %version, "Vector extension available");

        Ok(Self {
            conn: Mutex::new(conn),
            table: DEFAULT_TABLE.to_string(),
            dimensions,
        })
    }

    /// Use a different summary table.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `name` is not a plain SQL identifier.
    pub fn with_table(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_table_name(&name)?;
        self.table = name;
        Ok(self)
    }

    /// Summary table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Embedding length accepted by this store.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Create the summary table if it does not exist.
    ///
    /// Returns `true` if the table was created by this call. Calling it again
    /// is a no-op that leaves existing rows untouched.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::DimensionMismatch`] if the table was created
    /// for a different embedding size.
    pub fn ensure_table(&self) -> Result<bool> {
        let conn = self.conn.lock();
        let dims_key = self.dimensions_key();

        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![dims_key],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(stored) = stored {
            let stored: usize = stored.parse().map_err(|_| {
                MemoryError::InvalidData(format!("bad stored dimensions '{}'", stored))
            })?;
            if stored != self.dimensions {
                return Err(MemoryError::DimensionMismatch {
                    stored,
                    configured: self.dimensions,
                });
            }
        }

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![self.table],
            |row| row.get(0),
        )?;

        if !exists {
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE {table} (
                    asctime TEXT NOT NULL,
                    id TEXT PRIMARY KEY,
                    content TEXT NOT NULL,
                    embedding BLOB NOT NULL CHECK (length(embedding) = {bytes})
                );
                CREATE INDEX IF NOT EXISTS idx_{table}_asctime ON {table}(asctime);
                "#,
                table = self.table,
                bytes = self.dimensions * 4,
            ))?;
        }

        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![dims_key, self.dimensions.to_string()],
        )?;

        if exists {
            debug!(table = %self.table, "Summary table already exists");
        } else {
            info!(table = %self.table, dimensions = self.dimensions, "Created table");
        }
        Ok(!exists)
    }

    /// Close the underlying connection.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner();
        conn.close().map_err(|(_, e)| MemoryError::Database(e))?;
        info!("Summary store connection closed");
        Ok(())
    }

    fn dimensions_key(&self) -> String {
        format!("{}.embedding_dimensions", self.table)
    }
}
