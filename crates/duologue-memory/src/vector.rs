//! Vector helpers around the sqlite-vec extension.
//!
//! Embeddings are stored as little-endian `f32` BLOBs, the format sqlite-vec
//! reads natively, so `vec_distance_cosine` can score rows directly.

use std::sync::Once;

use rusqlite::Connection;
use zerocopy::IntoBytes;

use crate::error::{MemoryError, Result};

static VEC_INIT: Once = Once::new();

/// Register sqlite-vec for every connection opened afterwards in this process.
///
/// Safe to call repeatedly; registration happens once.
pub fn init_vector_extension() {
    use rusqlite::ffi::sqlite3_auto_extension;
    use sqlite_vec::sqlite3_vec_init;

    VEC_INIT.call_once(|| unsafe {
        #[allow(clippy::missing_transmute_annotations)]
        sqlite3_auto_extension(Some(std::mem::transmute(sqlite3_vec_init as *const ())));
    });
}

/// Check that sqlite-vec is loaded and return its version.
pub fn check_vector_extension(conn: &Connection) -> Result<String> {
    let version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
    Ok(version)
}

/// View an embedding as raw bytes for binding to a BLOB parameter.
pub fn embedding_as_blob(embedding: &[f32]) -> &[u8] {
    embedding.as_bytes()
}

/// Decode a stored BLOB back into an embedding.
pub fn blob_to_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(MemoryError::InvalidData(format!(
            "embedding blob length {} is not a multiple of 4",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Calculate cosine similarity between two embeddings.
///
/// Returns 0.0 for mismatched lengths or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_roundtrip_preserves_values() {
        let v = vec![0.25f32, -1.5, 3.0e-7, 42.0];
        let blob = embedding_as_blob(&v).to_vec();
        assert_eq!(blob.len(), 16);
        assert_eq!(blob_to_embedding(&blob).unwrap(), v);
    }

    #[test]
    fn test_blob_with_bad_length() {
        assert!(blob_to_embedding(&[0u8; 5]).is_err());
        assert!(blob_to_embedding(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[2.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_extension_loads() {
        init_vector_extension();
        let conn = Connection::open_in_memory().unwrap();
        let version = check_vector_extension(&conn).unwrap();
        assert!(version.starts_with('v'));
    }

    #[test]
    fn test_sql_cosine_matches_rust() {
        init_vector_extension();
        let conn = Connection::open_in_memory().unwrap();
        let a = [1.0f32, 2.0, 3.0];
        let b = [3.0f32, 2.0, 1.0];
        let distance: f64 = conn
            .query_row(
                "SELECT vec_distance_cosine(?1, ?2)",
                rusqlite::params![embedding_as_blob(&a), embedding_as_blob(&b)],
                |row| row.get(0),
            )
            .unwrap();
        let expected = cosine_similarity(&a, &b) as f64;
        assert!((1.0 - distance - expected).abs() < 1e-5);
    }
}
