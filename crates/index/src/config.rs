//! Store and engine configuration

use osprey_core::EngineKind;
use serde::{Deserialize, Serialize};

/// Tuning knobs for the approximate (HNSW) engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    /// Max neighbors per node on layers above 0 (layer 0 allows `2 * m`)
    pub m: usize,
    /// Beam width while wiring a new node into the graph
    pub ef_construction: usize,
    /// Minimum beam width at query time; the effective width is `max(ef_search, k)`
    pub ef_search: usize,
    /// Seed for layer assignment, so graphs are reproducible
    pub seed: u64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 64,
            seed: 0x5EED,
        }
    }
}

/// Configuration fixed at store construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Vector length shared by every entry
    pub dim: usize,
    /// Nearest-neighbor strategy
    pub engine: EngineKind,
    /// Only consulted when `engine` is `Approximate`
    #[serde(default)]
    pub hnsw: HnswConfig,
}

impl StoreConfig {
    /// Exact brute-force store of the given dimension
    pub fn exact(dim: usize) -> Self {
        Self {
            dim,
            engine: EngineKind::Exact,
            hnsw: HnswConfig::default(),
        }
    }

    /// HNSW-backed store of the given dimension
    pub fn approximate(dim: usize, hnsw: HnswConfig) -> Self {
        Self {
            dim,
            engine: EngineKind::Approximate,
            hnsw,
        }
    }
}
