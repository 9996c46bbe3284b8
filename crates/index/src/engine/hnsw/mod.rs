//! HNSW approximate nearest-neighbor engine
//!
//! **Insert**: assign a random layer L, greedy descent from the entry point
//! down to L + 1, then beam search with `ef_construction` on every layer from
//! L to 0, wiring diversity-selected neighbors in both directions.
//!
//! **Search**: greedy descent to layer 0, then beam search with
//! `ef = max(ef_search, k)`. Removed nodes are tombstones: still traversed,
//! never returned. When tombstones leave fewer than `k` live candidates the
//! beam doubles until it has `k` or has seen every reachable node.

mod graph;
mod node;

pub use node::Node;

use super::distance::rank;
use super::NeighborEngine;
use crate::config::HnswConfig;
use osprey_core::{validate_vector, EngineKind, IndexError, IndexResult, Ordinal};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hard cap on assigned layers
const MAX_LEVEL: usize = 16;

/// HNSW engine
#[derive(Debug, Clone)]
pub struct HnswEngine {
    dim: usize,
    config: HnswConfig,
    /// Graph nodes in insertion order, tombstones included
    nodes: Vec<Node>,
    /// Ordinal -> position in `nodes`
    positions: HashMap<Ordinal, usize>,
    /// Position of the node on the highest layer
    entry_point: Option<usize>,
    max_layer: usize,
    /// Non-deleted node count
    live: usize,
    /// Level multiplier (1/ln(M))
    ml: f64,
    rng: StdRng,
}

#[derive(Serialize, Deserialize)]
struct HnswPayload {
    config: HnswConfig,
    nodes: Vec<Node>,
    entry_point: Option<usize>,
    max_layer: usize,
}

impl HnswEngine {
    /// Create an empty graph for vectors of length `dim`
    pub fn new(dim: usize, config: HnswConfig) -> Self {
        let m = config.m.max(2);
        Self {
            dim,
            config: HnswConfig { m, ..config },
            nodes: Vec::new(),
            positions: HashMap::new(),
            entry_point: None,
            max_layer: 0,
            live: 0,
            ml: 1.0 / (m as f64).ln(),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Rebuild from an encoded payload
    ///
    /// Graph-shaping parameters (`m`, `ef_construction`, `seed`) come from
    /// the payload since the graph was built with them; `ef_search` comes
    /// from `runtime` so query-time tuning can change between runs.
    pub fn decode(dim: usize, runtime: HnswConfig, payload: &[u8]) -> IndexResult<Self> {
        let decoded: HnswPayload = bincode::deserialize(payload)
            .map_err(|e| IndexError::corrupt(format!("hnsw index payload: {}", e)))?;

        let config = HnswConfig {
            ef_search: runtime.ef_search,
            ..decoded.config
        };
        let mut engine = Self::new(dim, config);
        let count = decoded.nodes.len();

        for (idx, node) in decoded.nodes.iter().enumerate() {
            if node.vector.len() != dim {
                return Err(IndexError::corrupt(format!(
                    "hnsw node {} has length {}, expected {}",
                    node.ordinal,
                    node.vector.len(),
                    dim
                )));
            }
            if node.layers.is_empty() {
                return Err(IndexError::corrupt(format!(
                    "hnsw node {} has no layers",
                    node.ordinal
                )));
            }
            if node.layers.iter().flatten().any(|&n| n >= count) {
                return Err(IndexError::corrupt(format!(
                    "hnsw node {} links past the end of the graph",
                    node.ordinal
                )));
            }
            if engine.positions.insert(node.ordinal, idx).is_some() {
                return Err(IndexError::corrupt(format!(
                    "hnsw graph lists ordinal {} twice",
                    node.ordinal
                )));
            }
        }

        match decoded.entry_point {
            None if count > 0 => {
                return Err(IndexError::corrupt("hnsw graph has nodes but no entry point"));
            }
            Some(ep) if ep >= count => {
                return Err(IndexError::corrupt("hnsw entry point out of range"));
            }
            Some(ep) if decoded.nodes[ep].level() != decoded.max_layer => {
                return Err(IndexError::corrupt(
                    "hnsw entry point is not on the top layer",
                ));
            }
            _ => {}
        }

        engine.live = decoded.nodes.iter().filter(|n| !n.deleted).count();
        engine.nodes = decoded.nodes;
        engine.entry_point = decoded.entry_point;
        engine.max_layer = decoded.max_layer;
        // Continue the layer sequence instead of replaying it
        engine.rng = StdRng::seed_from_u64(engine.config.seed ^ count as u64);
        Ok(engine)
    }

    /// Configuration in effect
    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Nodes in the graph, tombstones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn max_degree(&self, layer: usize) -> usize {
        if layer == 0 {
            self.config.m * 2
        } else {
            self.config.m
        }
    }

    /// Assign a random layer from an exponential distribution
    fn random_level(&mut self) -> usize {
        // 1 - U(0,1] keeps ln() finite
        let r: f64 = 1.0 - self.rng.gen::<f64>();
        let level = (-r.ln() * self.ml).floor() as usize;
        level.min(MAX_LEVEL)
    }
}

impl NeighborEngine for HnswEngine {
    fn insert(&mut self, ordinal: Ordinal, vector: &[f32]) -> IndexResult<()> {
        validate_vector(vector, self.dim)?;
        if self.positions.contains_key(&ordinal) {
            return Err(IndexError::corrupt(format!(
                "ordinal {} is already indexed",
                ordinal
            )));
        }

        let level = self.random_level();
        let idx = self.nodes.len();
        self.nodes.push(Node::new(ordinal, vector.to_vec(), level));
        self.positions.insert(ordinal, idx);
        self.live += 1;

        let Some(entry) = self.entry_point else {
            self.entry_point = Some(idx);
            self.max_layer = level;
            return Ok(());
        };

        // Phase 1: zoom in from the top layer down to level + 1
        let mut current = entry;
        for layer in (level + 1..=self.max_layer).rev() {
            if let Some(best) = self.search_layer(vector, current, 1, layer).first() {
                current = best.idx;
            }
        }

        // Phase 2: wire the node on every layer it shares with the graph
        for layer in (0..=level.min(self.max_layer)).rev() {
            let candidates = self.search_layer(vector, current, self.config.ef_construction, layer);
            let neighbors = self.select_neighbors(&candidates, self.max_degree(layer));
            for &neighbor in &neighbors {
                self.link(neighbor, idx, layer);
            }
            self.nodes[idx].set_neighbors(layer, neighbors);
            if let Some(best) = candidates.first() {
                current = best.idx;
            }
        }

        if level > self.max_layer {
            self.max_layer = level;
            self.entry_point = Some(idx);
        }
        Ok(())
    }

    fn remove(&mut self, ordinal: Ordinal) -> bool {
        match self.positions.get(&ordinal) {
            Some(&idx) if !self.nodes[idx].deleted => {
                self.nodes[idx].deleted = true;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(Ordinal, f32)> {
        if k == 0 || self.live == 0 {
            return Vec::new();
        }
        let Some(entry) = self.entry_point else {
            return Vec::new();
        };

        let mut current = entry;
        for layer in (1..=self.max_layer).rev() {
            if let Some(best) = self.search_layer(query, current, 1, layer).first() {
                current = best.idx;
            }
        }

        let total = self.nodes.len();
        let mut ef = self.config.ef_search.max(k);
        loop {
            let found = self.search_layer(query, current, ef, 0);
            let exhausted = found.len() < ef || ef >= total;
            let mut hits: Vec<(Ordinal, f32)> = found
                .iter()
                .filter(|s| !self.nodes[s.idx].deleted)
                .map(|s| (self.nodes[s.idx].ordinal, s.distance))
                .collect();
            if hits.len() >= k || exhausted {
                hits.sort_by(rank);
                hits.truncate(k);
                return hits;
            }
            ef = ef.saturating_mul(2).min(total);
        }
    }

    fn len(&self) -> usize {
        self.live
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Approximate
    }

    fn get(&self, ordinal: Ordinal) -> Option<&[f32]> {
        let idx = *self.positions.get(&ordinal)?;
        let node = &self.nodes[idx];
        (!node.deleted).then_some(node.vector.as_slice())
    }

    fn contains(&self, ordinal: Ordinal) -> bool {
        self.get(ordinal).is_some()
    }

    fn ordinals(&self) -> Vec<Ordinal> {
        let mut live: Vec<Ordinal> = self
            .nodes
            .iter()
            .filter(|n| !n.deleted)
            .map(|n| n.ordinal)
            .collect();
        live.sort();
        live
    }

    fn max_ordinal(&self) -> Option<Ordinal> {
        self.nodes.iter().map(|n| n.ordinal).max()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.positions.clear();
        self.entry_point = None;
        self.max_layer = 0;
        self.live = 0;
    }

    fn encode(&self) -> IndexResult<Vec<u8>> {
        let payload = HnswPayload {
            config: self.config,
            nodes: self.nodes.clone(),
            entry_point: self.entry_point,
            max_layer: self.max_layer,
        };
        bincode::serialize(&payload).map_err(|e| IndexError::Io(std::io::Error::other(e)))
    }
}
