//! Node representation in the HNSW graph

use osprey_core::Ordinal;
use serde::{Deserialize, Serialize};

/// A node in the HNSW graph
///
/// Each node exists on layers `0..=level`. Neighbor lists hold positions in
/// the engine's node vector, not ordinals, so traversal never hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Store-assigned ordinal
    pub ordinal: Ordinal,

    /// The vector itself
    pub vector: Vec<f32>,

    /// Neighbors at each layer
    /// - `layers[0]` = neighbors at layer 0 (base, every node)
    /// - `layers[n]` = neighbors at layer n (express, fewer nodes)
    pub layers: Vec<Vec<usize>>,

    /// Removed from results but kept for navigation
    pub deleted: bool,
}

impl Node {
    /// Create an unlinked node living on layers `0..=level`
    pub fn new(ordinal: Ordinal, vector: Vec<f32>, level: usize) -> Self {
        Self {
            ordinal,
            vector,
            layers: vec![Vec::new(); level + 1],
            deleted: false,
        }
    }

    /// Highest layer this node exists on
    pub fn level(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }

    /// Neighbors at a specific layer
    pub fn neighbors(&self, layer: usize) -> &[usize] {
        self.layers.get(layer).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Add a neighbor at a specific layer, ignoring duplicates
    pub fn add_neighbor(&mut self, layer: usize, neighbor: usize) {
        if let Some(neighbors) = self.layers.get_mut(layer) {
            if !neighbors.contains(&neighbor) {
                neighbors.push(neighbor);
            }
        }
    }

    /// Replace the neighbor list at a specific layer
    pub fn set_neighbors(&mut self, layer: usize, neighbors: Vec<usize>) {
        if let Some(slot) = self.layers.get_mut(layer) {
            *slot = neighbors;
        }
    }
}
