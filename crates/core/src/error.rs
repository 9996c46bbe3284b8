//! Error types for index operations
//!
//! Every store operation returns `IndexResult<T>`. Callers inspect the
//! variant instead of matching on message strings.

use crate::value::{Metadata, Value};
use thiserror::Error;

/// Errors returned by the index store and its engines
#[derive(Debug, Error)]
pub enum IndexError {
    /// Vector length differs from the store's configured dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimension
        expected: usize,
        /// Length of the offending vector
        actual: usize,
    },

    /// Zero-length vector
    #[error("empty vector")]
    EmptyVector,

    /// Vector contains NaN or an infinity
    #[error("invalid vector: non-finite component at position {position}")]
    InvalidVector {
        /// Index of the first non-finite component
        position: usize,
    },

    /// Metadata holds a float JSON cannot represent (NaN or an infinity)
    #[error("invalid metadata: non-finite float at {path}")]
    InvalidMetadata {
        /// Dotted path to the offending value, array positions in brackets
        path: String,
    },

    /// Unknown external id
    #[error("entry not found: {id}")]
    NotFound {
        /// The id that was looked up
        id: String,
    },

    /// Persisted artifacts are malformed or fail referential-integrity checks
    #[error("corrupt state: {reason}")]
    CorruptState {
        /// What failed validation
        reason: String,
    },

    /// Storage medium failure during save/load
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

impl IndexError {
    /// Shorthand for `CorruptState`
    pub fn corrupt(reason: impl Into<String>) -> Self {
        IndexError::CorruptState {
            reason: reason.into(),
        }
    }

    /// Shorthand for `NotFound`
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        IndexError::NotFound { id: id.to_string() }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound { .. })
    }

    /// Check if this error came from validating persisted state
    pub fn is_corrupt(&self) -> bool {
        matches!(self, IndexError::CorruptState { .. })
    }

    /// Check if the caller supplied a bad vector or metadata payload
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            IndexError::DimensionMismatch { .. }
                | IndexError::EmptyVector
                | IndexError::InvalidVector { .. }
                | IndexError::InvalidMetadata { .. }
        )
    }
}

/// Validate a caller-supplied vector against the configured dimension
///
/// Checks run in order: empty, length, finiteness.
pub fn validate_vector(vector: &[f32], dim: usize) -> IndexResult<()> {
    if vector.is_empty() {
        return Err(IndexError::EmptyVector);
    }
    if vector.len() != dim {
        return Err(IndexError::DimensionMismatch {
            expected: dim,
            actual: vector.len(),
        });
    }
    if let Some(position) = vector.iter().position(|x| !x.is_finite()) {
        return Err(IndexError::InvalidVector { position });
    }
    Ok(())
}

/// Reject metadata that would not survive a save/load round-trip
///
/// The metadata artifact is JSON, which has no NaN or infinities.
pub fn validate_metadata(metadata: &Metadata) -> IndexResult<()> {
    for (key, value) in metadata {
        if let Some(path) = non_finite_path(value, key.clone()) {
            return Err(IndexError::InvalidMetadata { path });
        }
    }
    Ok(())
}

fn non_finite_path(value: &Value, path: String) -> Option<String> {
    match value {
        Value::Float(f) if !f.is_finite() => Some(path),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, v)| non_finite_path(v, format!("{}[{}]", path, i))),
        Value::Object(fields) => fields
            .iter()
            .find_map(|(k, v)| non_finite_path(v, format!("{}.{}", path, k))),
        _ => None,
    }
}
