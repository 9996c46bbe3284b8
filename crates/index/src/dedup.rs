//! Duplicate detection
//!
//! Two layers, cheapest first:
//! 1. exact: a caller-supplied content hash already seen by the store
//! 2. approximate: the nearest stored vector lies within a distance threshold
//!
//! Thresholds are squared Euclidean distances and are always per call.

use crate::store::{IndexStore, StoreState};
use osprey_core::{validate_vector, Duplicate, EntryId, IndexResult};

/// Why an incoming artifact counts as a duplicate
#[derive(Debug, Clone, PartialEq)]
pub enum DuplicateMatch {
    /// Identical content hash
    ContentHash(EntryId),
    /// Nearest vector within the threshold
    NearVector(Duplicate),
}

impl DuplicateMatch {
    /// The existing entry that matched
    pub fn id(&self) -> &EntryId {
        match self {
            DuplicateMatch::ContentHash(id) => id,
            DuplicateMatch::NearVector(dup) => &dup.id,
        }
    }
}

fn nearest_within(state: &StoreState, vector: &[f32], threshold: f32) -> Option<Duplicate> {
    let nearest = state.resolve(state.engine.search(vector, 1)).into_iter().next()?;
    (nearest.distance <= threshold).then(|| Duplicate {
        id: nearest.id,
        distance: nearest.distance,
    })
}

impl IndexStore {
    /// Nearest entry if its distance is `<= threshold`
    ///
    /// A NaN threshold never matches.
    pub fn find_duplicate(&self, vector: &[f32], threshold: f32) -> IndexResult<Option<Duplicate>> {
        validate_vector(vector, self.dim())?;
        let state = self.state.read();
        Ok(nearest_within(&state, vector, threshold))
    }

    /// Id of the entry inserted with this content hash, if still live
    pub fn lookup_by_content_hash(&self, hash: &str) -> Option<EntryId> {
        self.state.read().content_hashes.get(hash).cloned()
    }

    /// Both duplicate layers under a single read lock
    ///
    /// The content hash is checked first; the vector is only validated and
    /// searched when the hash is absent or unknown.
    pub fn check_duplicate(
        &self,
        content_hash: Option<&str>,
        vector: &[f32],
        threshold: f32,
    ) -> IndexResult<Option<DuplicateMatch>> {
        let state = self.state.read();
        if let Some(id) = content_hash.and_then(|h| state.content_hashes.get(h)) {
            return Ok(Some(DuplicateMatch::ContentHash(id.clone())));
        }
        validate_vector(vector, self.dim())?;
        Ok(nearest_within(&state, vector, threshold).map(DuplicateMatch::NearVector))
    }
}
