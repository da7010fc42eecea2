//! Validation for records and queries before they reach SQLite.
//!
//! Checks:
//! - Embedding dimensions and values
//! - Summary content
//! - Table names (interpolated into SQL, so restricted to identifiers)

use crate::error::{MemoryError, Result};
use crate::types::SummaryRecord;

/// Specific validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Summary content is empty.
    #[error("summary content is empty")]
    EmptyContent,

    /// Summary content contains NUL bytes.
    #[error("summary content contains NUL bytes")]
    NulInContent,

    /// Embedding dimension mismatch.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding contains NaN or Inf.
    #[error("embedding contains {count} invalid values (NaN or Inf)")]
    InvalidEmbeddingValues { count: usize },

    /// Table name is not a plain SQL identifier.
    #[error("invalid table name '{0}'")]
    InvalidTableName(String),
}

/// Validate an embedding vector: exact length, finite values.
pub fn validate_embedding(
    embedding: &[f32],
    expected_dim: usize,
) -> std::result::Result<(), ValidationError> {
    if embedding.len() != expected_dim {
        return Err(ValidationError::DimensionMismatch {
            expected: expected_dim,
            actual: embedding.len(),
        });
    }

    let invalid_count = embedding.iter().filter(|v| !v.is_finite()).count();
    if invalid_count > 0 {
        return Err(ValidationError::InvalidEmbeddingValues {
            count: invalid_count,
        });
    }

    Ok(())
}

/// Validate summary text.
pub fn validate_content(content: &str) -> std::result::Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content.contains('\0') {
        return Err(ValidationError::NulInContent);
    }
    Ok(())
}

/// Validate a full record against the store's dimension.
pub fn validate_record(record: &SummaryRecord, expected_dim: usize) -> Result<()> {
    validate_content(&record.content)?;
    validate_embedding(&record.embedding, expected_dim)?;
    Ok(())
}

/// Table names must match `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MemoryError::Validation(ValidationError::InvalidTableName(
            name.to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_embedding() {
        assert!(validate_embedding(&[0.1, 0.2, 0.3], 3).is_ok());
        assert_eq!(
            validate_embedding(&[0.1, 0.2], 3),
            Err(ValidationError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            validate_embedding(&[f32::NAN, f32::INFINITY, 0.0], 3),
            Err(ValidationError::InvalidEmbeddingValues { count: 2 })
        );
    }

    #[test]
    fn test_validate_content() {
        assert!(validate_content("they talked about rain").is_ok());
        assert_eq!(validate_content("   "), Err(ValidationError::EmptyContent));
        assert_eq!(validate_content("a\0b"), Err(ValidationError::NulInContent));
    }

    #[test]
    fn test_validate_record() {
        let ok = SummaryRecord::new("summary", vec![1.0, 0.0]);
        assert!(validate_record(&ok, 2).is_ok());

        let wrong_dims = SummaryRecord::new("summary", vec![1.0]);
        let err = validate_record(&wrong_dims, 2).unwrap_err();
        assert!(matches!(
            err,
            MemoryError::Validation(ValidationError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("summaries").is_ok());
        assert!(validate_table_name("_summaries_v2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2summaries").is_err());
        assert!(validate_table_name("summaries; DROP TABLE meta").is_err());
        assert!(validate_table_name("my-table").is_err());
    }
}
