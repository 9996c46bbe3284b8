//! Convenient imports for Osprey.
//!
//! ```ignore
//! use osprey::prelude::*;
//!
//! let registry = IndexRegistry::open(OspreyConfig::from_env()?)?;
//! let vision = registry.space("vision")?;
//! ```

// Entry points
pub use crate::config::{OspreyConfig, SpaceConfig};
pub use crate::ingest::{IngestOptions, IngestOutcome, Ingestor};
pub use crate::registry::IndexRegistry;

// Error handling
pub use crate::error::{Error, Result};

// Embedding
pub use crate::embed::{content_hash, EmbedError, Embedder};

// Store and core types
pub use osprey_index::{
    ArtifactPaths, Duplicate, DuplicateMatch, EngineKind, Entry, EntryId, HnswConfig, IndexError,
    IndexStore, Metadata, Ordinal, SearchHit, StoreConfig, Value,
};
