//! IndexStore: fixed-dimension vectors with metadata and similarity search
//!
//! ## Design
//!
//! One store owns the entries of one embedding space. It holds:
//! - a boxed [`NeighborEngine`] keyed by internal ordinals
//! - id <-> ordinal maps, metadata, and the content-hash index
//!
//! All of it sits behind one `parking_lot::RwLock`. Mutations and
//! save/load take the write lock for their whole duration; lookups and
//! searches share the read lock.
//!
//! ## Ordinals
//!
//! Ordinals start at 1 and come from a single counter that is persisted as
//! `next_ordinal` and never reset, not even by [`IndexStore::clear`].
//!
//! ## Thread Safety
//!
//! IndexStore is `Send + Sync`; share it as `Arc<IndexStore>`.

use crate::artifact::{decode_index_artifact, encode_index_artifact};
use crate::config::{HnswConfig, StoreConfig};
use crate::engine::{EngineFactory, NeighborEngine};
use crate::persist::{write_all_atomically, ArtifactPaths, MetadataArtifact, METADATA_FORMAT_VERSION};
use osprey_core::{
    validate_metadata, validate_vector, EngineKind, Entry, EntryId, IndexError, IndexResult, Metadata, Ordinal,
    SearchHit,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// First ordinal a fresh store hands out
const FIRST_ORDINAL: Ordinal = Ordinal(1);

/// Per-entry bookkeeping; the vector itself lives in the engine
#[derive(Debug, Clone)]
pub(crate) struct Record {
    pub ordinal: Ordinal,
    pub metadata: Metadata,
    pub content_hash: Option<String>,
}

/// Everything guarded by the store lock
pub(crate) struct StoreState {
    pub engine: Box<dyn NeighborEngine>,
    pub next_ordinal: Ordinal,
    pub entries: HashMap<EntryId, Record>,
    pub ordinal_to_id: BTreeMap<Ordinal, EntryId>,
    pub content_hashes: HashMap<String, EntryId>,
}

impl StoreState {
    fn empty(engine: Box<dyn NeighborEngine>, next_ordinal: Ordinal) -> Self {
        Self {
            engine,
            next_ordinal,
            entries: HashMap::new(),
            ordinal_to_id: BTreeMap::new(),
            content_hashes: HashMap::new(),
        }
    }

    /// Attach ids and metadata to raw engine hits
    pub(crate) fn resolve(&self, raw: Vec<(Ordinal, f32)>) -> Vec<SearchHit> {
        raw.into_iter()
            .filter_map(|(ordinal, distance)| {
                let id = self.ordinal_to_id.get(&ordinal)?;
                let record = self.entries.get(id)?;
                Some(SearchHit {
                    id: id.clone(),
                    distance,
                    metadata: record.metadata.clone(),
                })
            })
            .collect()
    }

    /// Populate entries from a validated metadata artifact
    ///
    /// The engine must already hold exactly `artifact.ordinal_to_id`'s ordinals.
    fn from_artifact(engine: Box<dyn NeighborEngine>, artifact: MetadataArtifact) -> Self {
        let MetadataArtifact {
            next_ordinal,
            ordinal_to_id,
            mut metadata,
            content_hash_to_id,
            ..
        } = artifact;

        let mut state = Self::empty(engine, next_ordinal);
        for (ordinal, id) in &ordinal_to_id {
            let record = Record {
                ordinal: *ordinal,
                metadata: metadata.remove(id).unwrap_or_default(),
                content_hash: None,
            };
            state.entries.insert(id.clone(), record);
        }
        for (hash, id) in content_hash_to_id {
            if let Some(record) = state.entries.get_mut(&id) {
                record.content_hash = Some(hash.clone());
            }
            state.content_hashes.insert(hash, id);
        }
        state.ordinal_to_id = ordinal_to_id;
        state
    }

    fn to_artifact(&self, config: &StoreConfig) -> MetadataArtifact {
        let mut metadata = BTreeMap::new();
        let mut vectors = BTreeMap::new();
        for (ordinal, id) in &self.ordinal_to_id {
            if let Some(record) = self.entries.get(id) {
                metadata.insert(id.clone(), record.metadata.clone());
            }
            if let Some(vector) = self.engine.get(*ordinal) {
                vectors.insert(id.clone(), vector.to_vec());
            }
        }
        MetadataArtifact {
            format_version: METADATA_FORMAT_VERSION,
            dim: config.dim,
            engine: config.engine,
            next_ordinal: self.next_ordinal,
            ordinal_to_id: self.ordinal_to_id.clone(),
            metadata,
            vectors,
            content_hash_to_id: self
                .content_hashes
                .iter()
                .map(|(hash, id)| (hash.clone(), id.clone()))
                .collect(),
        }
    }
}

/// Thread-safe vector store for one embedding space
///
/// # Example
///
/// ```
/// use osprey_index::IndexStore;
/// use osprey_core::Metadata;
///
/// let store = IndexStore::exact(2);
/// let a = store.insert(&[0.0, 0.0], Metadata::new(), None).unwrap();
/// let b = store.insert(&[1.0, 0.0], Metadata::new(), None).unwrap();
///
/// let hits = store.search_by_vector(&[0.0, 0.0], 2).unwrap();
/// assert_eq!(hits[0].id, a);
/// assert_eq!(hits[1].id, b);
/// ```
pub struct IndexStore {
    config: StoreConfig,
    factory: EngineFactory,
    pub(crate) state: RwLock<StoreState>,
}

impl IndexStore {
    /// Create an empty store
    pub fn new(config: StoreConfig) -> Self {
        let factory = EngineFactory::for_config(&config);
        let engine = factory.create(config.dim);
        Self {
            config,
            factory,
            state: RwLock::new(StoreState::empty(engine, FIRST_ORDINAL)),
        }
    }

    /// Empty store with the exact engine
    pub fn exact(dim: usize) -> Self {
        Self::new(StoreConfig::exact(dim))
    }

    /// Empty store with the HNSW engine
    pub fn approximate(dim: usize, hnsw: HnswConfig) -> Self {
        Self::new(StoreConfig::approximate(dim, hnsw))
    }

    /// Store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Vector length every entry shares
    pub fn dim(&self) -> usize {
        self.config.dim
    }

    /// Engine selected at construction
    pub fn engine_kind(&self) -> EngineKind {
        self.config.engine
    }

    /// Number of live entries
    pub fn count(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Check if the store has no entries
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Check if an id is live
    pub fn contains(&self, id: &EntryId) -> bool {
        self.state.read().entries.contains_key(id)
    }

    /// All live ids in insertion order
    pub fn ids(&self) -> Vec<EntryId> {
        self.state.read().ordinal_to_id.values().cloned().collect()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert a vector with its metadata
    ///
    /// Returns the freshly assigned id. If `content_hash` was already mapped
    /// to another entry, the mapping moves to the new entry.
    ///
    /// # Errors
    /// - `EmptyVector` if `vector` is empty
    /// - `DimensionMismatch` if `vector.len() != dim`
    /// - `InvalidVector` if a component is NaN or infinite
    /// - `InvalidMetadata` if a metadata float is NaN or infinite
    /// - `CorruptState` if the ordinal counter is exhausted
    pub fn insert(
        &self,
        vector: &[f32],
        metadata: Metadata,
        content_hash: Option<String>,
    ) -> IndexResult<EntryId> {
        validate_vector(vector, self.config.dim)?;
        validate_metadata(&metadata)?;

        let mut state = self.state.write();
        let ordinal = state.next_ordinal;
        let next_ordinal = ordinal
            .checked_next()
            .ok_or_else(|| IndexError::corrupt(format!("ordinal counter exhausted at {}", ordinal)))?;
        state.engine.insert(ordinal, vector)?;
        state.next_ordinal = next_ordinal;

        let mut id = EntryId::generate();
        while state.entries.contains_key(&id) {
            id = EntryId::generate();
        }

        if let Some(hash) = &content_hash {
            if let Some(previous) = state.content_hashes.insert(hash.clone(), id.clone()) {
                if let Some(record) = state.entries.get_mut(&previous) {
                    record.content_hash = None;
                }
            }
        }
        state.ordinal_to_id.insert(ordinal, id.clone());
        state.entries.insert(
            id.clone(),
            Record {
                ordinal,
                metadata,
                content_hash,
            },
        );

        debug!("Inserted {} at ordinal {}", id, ordinal.as_u64());
        Ok(id)
    }

    /// Remove an entry and every content hash pointing at it
    ///
    /// # Errors
    /// - `NotFound` if `id` is unknown
    pub fn remove(&self, id: &EntryId) -> IndexResult<()> {
        let mut state = self.state.write();
        let record = state
            .entries
            .remove(id)
            .ok_or_else(|| IndexError::not_found(id))?;
        state.ordinal_to_id.remove(&record.ordinal);
        state.content_hashes.retain(|_, owner| owner != id);
        state.engine.remove(record.ordinal);
        debug!("Removed {} (ordinal {})", id, record.ordinal.as_u64());
        Ok(())
    }

    /// Drop every entry and reset the engine
    ///
    /// The ordinal counter keeps counting.
    pub fn clear(&self) {
        let mut state = self.state.write();
        let dropped = state.entries.len();
        state.engine.clear();
        state.entries.clear();
        state.ordinal_to_id.clear();
        state.content_hashes.clear();
        info!(
            "Cleared {} entries from {} store (dim {})",
            dropped, self.config.engine, self.config.dim
        );
    }

    // ========================================================================
    // Lookup and search
    // ========================================================================

    /// Exact lookup of a stored entry
    pub fn get(&self, id: &EntryId) -> Option<Entry> {
        let state = self.state.read();
        let record = state.entries.get(id)?;
        let vector = state.engine.get(record.ordinal)?.to_vec();
        Some(Entry {
            id: id.clone(),
            vector,
            metadata: record.metadata.clone(),
            content_hash: record.content_hash.clone(),
        })
    }

    /// Up to `k` nearest entries by squared Euclidean distance
    ///
    /// Ties are broken by insertion order. Fewer than `k` hits when the store
    /// is smaller; `k == 0` yields none.
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> IndexResult<Vec<SearchHit>> {
        validate_vector(query, self.config.dim)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let state = self.state.read();
        let raw = state.engine.search(query, k);
        Ok(state.resolve(raw))
    }

    /// Up to `k` nearest neighbors of a stored entry, excluding the entry itself
    ///
    /// # Errors
    /// - `NotFound` if `id` is unknown
    pub fn search_by_id(&self, id: &EntryId, k: usize) -> IndexResult<Vec<SearchHit>> {
        let state = self.state.read();
        let record = state.entries.get(id).ok_or_else(|| IndexError::not_found(id))?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let query = state
            .engine
            .get(record.ordinal)
            .ok_or_else(|| IndexError::corrupt(format!("{} has no vector in the engine", id)))?;

        let self_ordinal = record.ordinal;
        let mut raw = state.engine.search(query, k.saturating_add(1));
        raw.retain(|(ordinal, _)| *ordinal != self_ordinal);
        raw.truncate(k);
        Ok(state.resolve(raw))
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write both artifacts
    ///
    /// Memory is never touched; on failure the previous artifacts remain.
    pub fn save(&self, paths: &ArtifactPaths) -> IndexResult<()> {
        let state = self.state.write();

        let artifact = state.to_artifact(&self.config);
        let metadata_bytes = artifact.to_json()?;
        let payload = state.engine.encode()?;
        let index_bytes = encode_index_artifact(self.config.engine, self.config.dim, &payload)?;

        write_all_atomically(&[
            (paths.index.as_path(), index_bytes.as_slice()),
            (paths.metadata.as_path(), metadata_bytes.as_slice()),
        ])?;

        info!(
            "Saved {} entries ({} engine, dim {}) to {}",
            state.entries.len(),
            self.config.engine,
            self.config.dim,
            paths.index.display()
        );
        Ok(())
    }

    /// Replace the store's contents with the saved artifacts
    ///
    /// The artifacts must come from a store with the same dimension and
    /// engine. Every cross-reference is validated before anything is
    /// swapped in; on any error the current contents stay as they were.
    ///
    /// # Errors
    /// - `Io` if a file cannot be read
    /// - `CorruptState` if the artifacts are malformed or inconsistent
    pub fn load(&self, paths: &ArtifactPaths) -> IndexResult<()> {
        let mut state = self.state.write();

        let index_bytes = fs::read(&paths.index)?;
        let metadata_bytes = fs::read(&paths.metadata)?;
        let restored = self.restore(&index_bytes, &metadata_bytes)?;

        info!(
            "Loaded {} entries ({} engine, dim {}) from {}",
            restored.entries.len(),
            self.config.engine,
            self.config.dim,
            paths.index.display()
        );
        *state = restored;
        Ok(())
    }

    /// Rebuild the store from the metadata artifact alone
    ///
    /// Every vector is re-inserted under its original ordinal into a fresh
    /// engine of this store's kind, so an artifact saved by the other engine
    /// kind is accepted.
    pub fn rebuild_from_metadata(&self, path: impl AsRef<Path>) -> IndexResult<()> {
        let path = path.as_ref();
        let mut state = self.state.write();

        let bytes = fs::read(path)?;
        let artifact = MetadataArtifact::from_json(&bytes)?;
        artifact.validate(self.config.dim)?;
        if artifact.engine != self.config.engine {
            warn!(
                "Rebuilding {} store from metadata written by {} engine",
                self.config.engine, artifact.engine
            );
        }

        let mut engine = self.factory.create(self.config.dim);
        for (ordinal, id) in &artifact.ordinal_to_id {
            let vector = artifact
                .vectors
                .get(id)
                .ok_or_else(|| IndexError::corrupt(format!("id {} has no vector", id)))?;
            engine.insert(*ordinal, vector)?;
        }

        let restored = StoreState::from_artifact(engine, artifact);
        info!(
            "Rebuilt {} entries ({} engine, dim {}) from {}",
            restored.entries.len(),
            self.config.engine,
            self.config.dim,
            path.display()
        );
        *state = restored;
        Ok(())
    }

    /// Decode and cross-check both artifacts into a fresh state
    fn restore(&self, index_bytes: &[u8], metadata_bytes: &[u8]) -> IndexResult<StoreState> {
        let (header, payload) = decode_index_artifact(index_bytes)?;
        if header.kind != self.config.engine {
            return Err(IndexError::corrupt(format!(
                "index artifact was written by {} engine, store uses {}",
                header.kind, self.config.engine
            )));
        }
        if header.dim as usize != self.config.dim {
            return Err(IndexError::corrupt(format!(
                "index artifact dimension {} does not match store dimension {}",
                header.dim, self.config.dim
            )));
        }

        let artifact = MetadataArtifact::from_json(metadata_bytes)?;
        if artifact.engine != self.config.engine {
            return Err(IndexError::corrupt(format!(
                "metadata artifact was written by {} engine, store uses {}",
                artifact.engine, self.config.engine
            )));
        }
        artifact.validate(self.config.dim)?;

        let engine = self.factory.decode(self.config.dim, payload)?;

        if let Some(max) = engine.max_ordinal() {
            if max >= artifact.next_ordinal {
                return Err(IndexError::corrupt(format!(
                    "index holds ordinal {} but next ordinal is {}",
                    max, artifact.next_ordinal
                )));
            }
        }

        let live = engine.ordinals();
        let listed: Vec<Ordinal> = artifact.ordinal_to_id.keys().copied().collect();
        if live != listed {
            let missing = listed.iter().find(|o| !engine.contains(**o));
            let unlisted = live
                .iter()
                .find(|o| !artifact.ordinal_to_id.contains_key(*o));
            let reason = match (missing, unlisted) {
                (Some(o), _) => format!("ordinal {} is not in the index artifact", o),
                (None, Some(o)) => format!("index ordinal {} has no id", o),
                (None, None) => "ordinal sets differ".to_string(),
            };
            return Err(IndexError::corrupt(reason));
        }

        for (ordinal, id) in &artifact.ordinal_to_id {
            let stored = artifact.vectors.get(id).map(|v| v.as_slice());
            if engine.get(*ordinal) != stored {
                return Err(IndexError::corrupt(format!(
                    "vector for id {} differs between artifacts",
                    id
                )));
            }
        }

        Ok(StoreState::from_artifact(engine, artifact))
    }
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("dim", &self.config.dim)
            .field("engine", &self.config.engine)
            .field("count", &self.count())
            .finish()
    }
}
