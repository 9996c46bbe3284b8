//! Unified error types for Osprey.
//!
//! Wraps the per-crate errors so facade callers match on one enum.

use crate::config::ConfigError;
use crate::embed::EmbedError;
use osprey_index::{EntryId, IndexError};
use thiserror::Error;

/// All Osprey errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Index store failure (bad vector, unknown id, corrupt artifacts)
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Entry was stored in memory but saving the store afterwards failed
    #[error("entry {id} inserted but not saved: {source}")]
    NotPersisted {
        /// Id of the committed entry
        id: EntryId,
        /// Why the save failed
        #[source]
        source: IndexError,
    },

    /// Configuration could not be read or is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Embedder failed to produce a vector
    #[error("embedding error: {0}")]
    Embed(#[from] EmbedError),

    /// No space registered under this name
    #[error("unknown space: {0}")]
    UnknownSpace(String),

    /// I/O error outside the index store (data directory handling)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Osprey operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a not-found error (unknown entry or space).
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Index(e) => e.is_not_found(),
            Error::UnknownSpace(_) => true,
            _ => false,
        }
    }

    /// Check if persisted state failed validation.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Index(e) if e.is_corrupt())
    }

    /// Id of an entry that was committed despite the error.
    pub fn committed_id(&self) -> Option<&EntryId> {
        match self {
            Error::NotPersisted { id, .. } => Some(id),
            _ => None,
        }
    }
}
