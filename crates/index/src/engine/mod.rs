//! Nearest-neighbor engines
//!
//! The store talks to its engine only through [`NeighborEngine`], so the
//! exact scan and the HNSW graph are interchangeable at construction time.
//!
//! - [`ExactEngine`]: O(n) scan, exact results
//! - [`HnswEngine`]: hierarchical navigable small-world graph, approximate results

pub mod distance;
pub mod exact;
pub mod hnsw;

pub use distance::{rank, squared_l2};
pub use exact::ExactEngine;
pub use hnsw::HnswEngine;

use crate::config::{HnswConfig, StoreConfig};
use osprey_core::{EngineKind, IndexResult, Ordinal};

/// Trait for swappable nearest-neighbor implementations
///
/// IMPORTANT: This trait must work for BOTH the exact scan and HNSW.
/// Do NOT add methods that assume brute-force semantics.
pub trait NeighborEngine: Send + Sync {
    /// Register a vector under a fresh ordinal
    ///
    /// Ordinals are assigned by the store and never reused; inserting an
    /// ordinal the engine already holds is an error.
    fn insert(&mut self, ordinal: Ordinal, vector: &[f32]) -> IndexResult<()>;

    /// Remove a vector
    ///
    /// Returns true if the ordinal was live.
    fn remove(&mut self, ordinal: Ordinal) -> bool;

    /// Search for the k nearest live vectors
    ///
    /// Returns (ordinal, squared distance) pairs sorted by
    /// (distance asc, ordinal asc). `k == 0` yields nothing.
    fn search(&self, query: &[f32], k: usize) -> Vec<(Ordinal, f32)>;

    /// Number of live vectors
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector length
    fn dimension(&self) -> usize;

    /// Which strategy this is
    fn kind(&self) -> EngineKind;

    /// Get a live vector by ordinal
    fn get(&self, ordinal: Ordinal) -> Option<&[f32]>;

    /// Check if an ordinal is live
    fn contains(&self, ordinal: Ordinal) -> bool;

    /// All live ordinals, ascending
    fn ordinals(&self) -> Vec<Ordinal>;

    /// Highest ordinal the engine holds, removed ones included
    fn max_ordinal(&self) -> Option<Ordinal>;

    /// Drop every vector
    fn clear(&mut self);

    /// Serialize engine state for the index artifact
    fn encode(&self) -> IndexResult<Vec<u8>>;
}

/// Factory for creating engines
///
/// Lets the store switch between the exact scan and HNSW without knowing
/// either concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EngineFactory {
    /// Brute-force O(n) search
    #[default]
    Exact,
    /// HNSW graph with the given tuning
    Hnsw(HnswConfig),
}

impl EngineFactory {
    /// Pick the factory matching a store configuration
    pub fn for_config(config: &StoreConfig) -> Self {
        match config.engine {
            EngineKind::Exact => EngineFactory::Exact,
            EngineKind::Approximate => EngineFactory::Hnsw(config.hnsw),
        }
    }

    /// Engine kind this factory produces
    pub fn kind(&self) -> EngineKind {
        match self {
            EngineFactory::Exact => EngineKind::Exact,
            EngineFactory::Hnsw(_) => EngineKind::Approximate,
        }
    }

    /// Create an empty engine
    pub fn create(&self, dim: usize) -> Box<dyn NeighborEngine> {
        match self {
            EngineFactory::Exact => Box::new(ExactEngine::new(dim)),
            EngineFactory::Hnsw(config) => Box::new(HnswEngine::new(dim, *config)),
        }
    }

    /// Rebuild an engine from an index artifact payload
    ///
    /// Any decode or structural failure is `CorruptState`.
    pub fn decode(&self, dim: usize, payload: &[u8]) -> IndexResult<Box<dyn NeighborEngine>> {
        match self {
            EngineFactory::Exact => Ok(Box::new(ExactEngine::decode(dim, payload)?)),
            EngineFactory::Hnsw(config) => {
                Ok(Box::new(HnswEngine::decode(dim, *config, payload)?))
            }
        }
    }
}
