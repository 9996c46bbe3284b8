//! # Osprey
//!
//! Embedded vector index for media similarity search.
//!
//! Osprey stores fixed-dimension embeddings under stable string ids with
//! free-form metadata, answers k-nearest-neighbor queries by vector or by
//! stored id, flags duplicates by content hash or vector distance, and
//! persists each index as a pair of files that are validated on load.
//!
//! ## Quick Start
//!
//! ```ignore
//! use osprey::prelude::*;
//!
//! osprey::logging::init();
//!
//! // Open the configured spaces ("vision" and "text" by default)
//! let registry = IndexRegistry::open(OspreyConfig::from_env()?)?;
//! let vision = registry.space("vision")?;
//!
//! // Insert and search
//! let id = vision.insert(&embedding, Metadata::new(), None)?;
//! let hits = vision.search_by_id(&id, 10)?;
//!
//! // Persist
//! registry.save("vision")?;
//! ```
//!
//! ## Layers
//!
//! - [`osprey_core`] - ids, ordinals, metadata values, errors
//! - [`osprey_index`] - the index store, exact and HNSW engines, artifacts
//! - this crate - configuration, named spaces, the ingestion pipeline
//!
//! ## Engines
//!
//! Every space uses either the exact engine (brute force, always correct)
//! or HNSW (approximate, faster on large sets). Both rank by squared
//! Euclidean distance and break ties by insertion order.

#![warn(missing_docs)]

pub mod config;
pub mod embed;
mod error;
pub mod ingest;
pub mod logging;
pub mod registry;

pub mod prelude;

// Re-export main entry points
pub use config::{ConfigError, OspreyConfig, SpaceConfig};
pub use embed::{content_hash, EmbedError, Embedder};
pub use error::{Error, Result};
pub use ingest::{IngestOptions, IngestOutcome, Ingestor};
pub use registry::IndexRegistry;

// Re-export the layers underneath
pub use osprey_core;
pub use osprey_index;

pub use osprey_index::{
    ArtifactPaths, Duplicate, DuplicateMatch, EngineKind, Entry, EntryId, HnswConfig, IndexError,
    IndexStore, Metadata, Ordinal, SearchHit, StoreConfig, Value,
};
