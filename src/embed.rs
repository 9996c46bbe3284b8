//! Embedding collaborator contract and content fingerprints
//!
//! Osprey never runs models itself. Callers construct an [`Embedder`]
//! explicitly (loading whatever model they use up front) and hand it to an
//! [`crate::Ingestor`].

use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use thiserror::Error;

/// Embedding failures reported by an [`Embedder`]
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The input is not something this embedder handles
    #[error("unsupported input: {0}")]
    Unsupported(String),

    /// The model or backend failed
    #[error("embedding failed: {0}")]
    Failed(String),
}

/// Turns raw artifact bytes into a fixed-length vector
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder returns
    fn dimension(&self) -> usize;

    /// Embed one artifact
    fn embed(&self, bytes: &[u8]) -> Result<Vec<f32>, EmbedError>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, bytes: &[u8]) -> Result<Vec<f32>, EmbedError> {
        (**self).embed(bytes)
    }
}

impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, bytes: &[u8]) -> Result<Vec<f32>, EmbedError> {
        (**self).embed(bytes)
    }
}

/// Lowercase hex SHA-256 of the source bytes
///
/// Used as the content hash for exact-duplicate detection.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
