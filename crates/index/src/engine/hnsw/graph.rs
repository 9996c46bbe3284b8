//! Graph traversal and wiring for the HNSW engine
//!
//! - `search_layer`: greedy beam search on one layer
//! - `select_neighbors`: diversity-preserving neighbor heuristic
//! - `link`: reverse edge with degree-bounded pruning

use super::HnswEngine;
use crate::engine::distance::squared_l2;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

/// A node position scored against a query
///
/// Ordered by (distance, position) so heap pops are deterministic.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scored {
    pub idx: usize,
    pub distance: f32,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.idx.cmp(&other.idx))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HnswEngine {
    #[inline]
    pub(crate) fn distance_to(&self, query: &[f32], idx: usize) -> f32 {
        squared_l2(query, &self.nodes[idx].vector)
    }

    /// Beam search on a single layer starting from `entry`
    ///
    /// Returns at most `ef` nodes sorted by distance ascending. Tombstoned
    /// nodes are included; filtering is the caller's job. Fewer than `ef`
    /// results means every node reachable on this layer was visited.
    pub(crate) fn search_layer(
        &self,
        query: &[f32],
        entry: usize,
        ef: usize,
        layer: usize,
    ) -> Vec<Scored> {
        let ef = ef.max(1);
        let mut visited: HashSet<usize> = HashSet::new();
        // Frontier to expand (min-heap)
        let mut candidates: BinaryHeap<Reverse<Scored>> = BinaryHeap::with_capacity(ef);
        // Best found so far (max-heap, worst on top)
        let mut results: BinaryHeap<Scored> = BinaryHeap::with_capacity(ef + 1);

        visited.insert(entry);
        let start = Scored {
            idx: entry,
            distance: self.distance_to(query, entry),
        };
        candidates.push(Reverse(start));
        results.push(start);

        while let Some(Reverse(current)) = candidates.pop() {
            if results.len() >= ef {
                if let Some(worst) = results.peek() {
                    if current.distance > worst.distance {
                        break;
                    }
                }
            }

            for &neighbor in self.nodes[current.idx].neighbors(layer) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let scored = Scored {
                    idx: neighbor,
                    distance: self.distance_to(query, neighbor),
                };
                let admit = results.len() < ef
                    || results.peek().map_or(true, |worst| scored < *worst);
                if admit {
                    candidates.push(Reverse(scored));
                    results.push(scored);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        results.into_sorted_vec()
    }

    /// Pick up to `m` neighbors from `candidates` (sorted ascending)
    ///
    /// A candidate is kept only if it is closer to the base than to every
    /// neighbor already kept. Remaining slots are filled with the closest
    /// rejected candidates so sparse regions stay connected.
    pub(crate) fn select_neighbors(&self, candidates: &[Scored], m: usize) -> Vec<usize> {
        let mut selected: Vec<usize> = Vec::with_capacity(m);

        for candidate in candidates {
            if selected.len() >= m {
                break;
            }
            let vector = &self.nodes[candidate.idx].vector;
            let diverse = selected
                .iter()
                .all(|&kept| squared_l2(vector, &self.nodes[kept].vector) >= candidate.distance);
            if diverse {
                selected.push(candidate.idx);
            }
        }

        if selected.len() < m {
            for candidate in candidates {
                if selected.len() >= m {
                    break;
                }
                if !selected.contains(&candidate.idx) {
                    selected.push(candidate.idx);
                }
            }
        }

        selected
    }

    /// Add the edge `from -> to` on `layer`, pruning `from` back to its
    /// degree bound if needed
    pub(crate) fn link(&mut self, from: usize, to: usize, layer: usize) {
        let cap = self.max_degree(layer);
        self.nodes[from].add_neighbor(layer, to);
        if self.nodes[from].neighbors(layer).len() <= cap {
            return;
        }

        let base = &self.nodes[from].vector;
        let mut scored: Vec<Scored> = self.nodes[from]
            .neighbors(layer)
            .iter()
            .map(|&n| Scored {
                idx: n,
                distance: squared_l2(base, &self.nodes[n].vector),
            })
            .collect();
        scored.sort();
        let kept = self.select_neighbors(&scored, cap);
        self.nodes[from].set_neighbors(layer, kept);
    }
}
