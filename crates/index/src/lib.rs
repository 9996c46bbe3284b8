//! Nearest-neighbor engines and the persistent index store
//!
//! - [`IndexStore`]: thread-safe CRUD, similarity search and save/load for
//!   one fixed-dimension embedding space
//! - [`engine`]: the exact scan and HNSW graph behind [`NeighborEngine`]
//! - [`dedup`]: content-hash and near-vector duplicate detection
//! - [`artifact`] / [`persist`]: the two on-disk artifacts

#![warn(missing_docs)]

pub mod artifact;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod persist;
pub mod store;

pub use config::{HnswConfig, StoreConfig};
pub use dedup::DuplicateMatch;
pub use engine::{EngineFactory, ExactEngine, HnswEngine, NeighborEngine};
pub use persist::ArtifactPaths;
pub use store::IndexStore;

pub use osprey_core::{
    Duplicate, EngineKind, Entry, EntryId, IndexError, IndexResult, Metadata, Ordinal, SearchHit,
    Value,
};
