//! Exact brute-force engine
//!
//! Scans every live vector on each query. O(n) per search, but results are
//! exact and fully deterministic, which makes it the reference the HNSW
//! engine is measured against.

use super::distance::{rank, squared_l2};
use super::NeighborEngine;
use osprey_core::{validate_vector, EngineKind, IndexError, IndexResult, Ordinal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Brute-force nearest-neighbor engine
///
/// BTreeMap keeps iteration in ordinal order, so equal distances come out
/// lowest-ordinal first without extra bookkeeping.
#[derive(Debug, Clone)]
pub struct ExactEngine {
    dim: usize,
    vectors: BTreeMap<Ordinal, Vec<f32>>,
}

#[derive(Serialize, Deserialize)]
struct ExactPayload {
    entries: Vec<(Ordinal, Vec<f32>)>,
}

impl ExactEngine {
    /// Create an empty engine for vectors of length `dim`
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: BTreeMap::new(),
        }
    }

    /// Rebuild from an encoded payload
    pub fn decode(dim: usize, payload: &[u8]) -> IndexResult<Self> {
        let decoded: ExactPayload = bincode::deserialize(payload)
            .map_err(|e| IndexError::corrupt(format!("exact index payload: {}", e)))?;

        let mut engine = Self::new(dim);
        for (ordinal, vector) in decoded.entries {
            if vector.len() != dim {
                return Err(IndexError::corrupt(format!(
                    "exact index vector {} has length {}, expected {}",
                    ordinal,
                    vector.len(),
                    dim
                )));
            }
            if engine.vectors.insert(ordinal, vector).is_some() {
                return Err(IndexError::corrupt(format!(
                    "exact index lists ordinal {} twice",
                    ordinal
                )));
            }
        }
        Ok(engine)
    }
}

impl NeighborEngine for ExactEngine {
    fn insert(&mut self, ordinal: Ordinal, vector: &[f32]) -> IndexResult<()> {
        validate_vector(vector, self.dim)?;
        if self.vectors.contains_key(&ordinal) {
            return Err(IndexError::corrupt(format!(
                "ordinal {} is already indexed",
                ordinal
            )));
        }
        self.vectors.insert(ordinal, vector.to_vec());
        Ok(())
    }

    fn remove(&mut self, ordinal: Ordinal) -> bool {
        self.vectors.remove(&ordinal).is_some()
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(Ordinal, f32)> {
        if k == 0 || self.vectors.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(Ordinal, f32)> = self
            .vectors
            .iter()
            .map(|(ordinal, vector)| (*ordinal, squared_l2(query, vector)))
            .collect();

        if scored.len() > k {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);
        scored
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Exact
    }

    fn get(&self, ordinal: Ordinal) -> Option<&[f32]> {
        self.vectors.get(&ordinal).map(|v| v.as_slice())
    }

    fn contains(&self, ordinal: Ordinal) -> bool {
        self.vectors.contains_key(&ordinal)
    }

    fn ordinals(&self) -> Vec<Ordinal> {
        self.vectors.keys().copied().collect()
    }

    fn max_ordinal(&self) -> Option<Ordinal> {
        self.vectors.keys().next_back().copied()
    }

    fn clear(&mut self) {
        self.vectors.clear();
    }

    fn encode(&self) -> IndexResult<Vec<u8>> {
        let payload = ExactPayload {
            entries: self
                .vectors
                .iter()
                .map(|(ordinal, vector)| (*ordinal, vector.clone()))
                .collect(),
        };
        bincode::serialize(&payload).map_err(|e| IndexError::Io(std::io::Error::other(e)))
    }
}
