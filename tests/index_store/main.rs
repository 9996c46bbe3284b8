//! Index Store Integration Tests
//!
//! Exercises the store through the public facade: CRUD, search ordering,
//! duplicate detection, persistence round-trips and corruption handling,
//! concurrent readers and writers, the HNSW engine, named spaces, and the
//! ingestion pipeline.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test index_store
//!
//! # Persistence only
//! cargo test --test index_store persistence::
//! ```

use osprey::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

mod approximate;
mod basic_ops;
mod duplicates;
mod ingest;
mod registry;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Metadata with a single `name` key
pub fn named(name: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("name".to_string(), Value::from(name));
    metadata
}

/// `n` random vectors in `[-1, 1)^dim`
pub fn random_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

/// Store filled with the given vectors; ids returned in insertion order
pub fn filled(store: IndexStore, vectors: &[Vec<f32>]) -> (Arc<IndexStore>, Vec<EntryId>) {
    let ids = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| store.insert(v, named(&format!("item-{}", i)), None).unwrap())
        .collect();
    (Arc::new(store), ids)
}

/// Small HNSW settings for fast, deterministic graphs
pub fn small_hnsw() -> HnswConfig {
    HnswConfig {
        m: 8,
        ef_construction: 64,
        ef_search: 32,
        seed: 7,
    }
}

/// Both engines over the same dimension
pub fn both_engines(dim: usize) -> Vec<IndexStore> {
    vec![IndexStore::exact(dim), IndexStore::approximate(dim, small_hnsw())]
}

/// Ids of a hit list
pub fn hit_ids(hits: &[SearchHit]) -> Vec<EntryId> {
    hits.iter().map(|h| h.id.clone()).collect()
}
