//! Ingestion pipeline
//!
//! hash -> exact duplicate check -> embed -> near-duplicate check -> insert -> optional save.
//! The embedder is only invoked when the content hash is unknown.

use crate::embed::{content_hash, Embedder};
use crate::error::{Error, Result};
use osprey_index::{ArtifactPaths, Duplicate, EntryId, IndexError, IndexStore, Metadata, SearchHit};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-ingestor settings
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Skip inserts whose nearest neighbor is within this squared distance
    pub near_duplicate_threshold: Option<f32>,
    /// Save the store here after every successful insert
    ///
    /// A failed save leaves the entry in memory and reports
    /// [`Error::NotPersisted`] with its id.
    pub persist_after: Option<ArtifactPaths>,
}

/// What happened to one artifact
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Stored under a new id
    Inserted(EntryId),
    /// Bytes already ingested; nothing stored
    DuplicateContent(EntryId),
    /// A stored vector lies within the threshold; nothing stored
    NearDuplicate(Duplicate),
}

impl IngestOutcome {
    /// Whether a new entry was created
    pub fn is_inserted(&self) -> bool {
        matches!(self, IngestOutcome::Inserted(_))
    }

    /// The new or matching entry id
    pub fn id(&self) -> &EntryId {
        match self {
            IngestOutcome::Inserted(id) | IngestOutcome::DuplicateContent(id) => id,
            IngestOutcome::NearDuplicate(dup) => &dup.id,
        }
    }
}

/// Embeds raw artifacts into one store
pub struct Ingestor<E: Embedder> {
    embedder: E,
    store: Arc<IndexStore>,
    options: IngestOptions,
}

impl<E: Embedder> Ingestor<E> {
    /// Pair an embedder with a store of the same dimension
    pub fn new(embedder: E, store: Arc<IndexStore>, options: IngestOptions) -> Result<Self> {
        if embedder.dimension() != store.dim() {
            return Err(IndexError::DimensionMismatch {
                expected: store.dim(),
                actual: embedder.dimension(),
            }
            .into());
        }
        Ok(Self {
            embedder,
            store,
            options,
        })
    }

    /// Target store
    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Settings in effect
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Ingest one artifact
    ///
    /// Two concurrent ingests of identical bytes may both insert; the content
    /// hash then points at the later one.
    pub fn ingest(&self, bytes: &[u8], metadata: Metadata) -> Result<IngestOutcome> {
        let hash = content_hash(bytes);
        if let Some(existing) = self.store.lookup_by_content_hash(&hash) {
            debug!("Skipping {}: content already stored as {}", hash, existing);
            return Ok(IngestOutcome::DuplicateContent(existing));
        }

        let vector = self.embedder.embed(bytes)?;

        if let Some(threshold) = self.options.near_duplicate_threshold {
            if let Some(dup) = self.store.find_duplicate(&vector, threshold)? {
                debug!(
                    "Skipping {}: within {} of {}",
                    hash, dup.distance, dup.id
                );
                return Ok(IngestOutcome::NearDuplicate(dup));
            }
        }

        let id = self.store.insert(&vector, metadata, Some(hash))?;
        if let Some(paths) = &self.options.persist_after {
            if let Err(source) = self.store.save(paths) {
                warn!("Entry {} inserted but save failed: {}", id, source);
                return Err(Error::NotPersisted { id, source });
            }
        }
        Ok(IngestOutcome::Inserted(id))
    }

    /// Neighbors of a stored entry, excluding itself
    pub fn similar(&self, id: &EntryId, k: usize) -> Result<Vec<SearchHit>> {
        Ok(self.store.search_by_id(id, k)?)
    }
}

impl<E: Embedder> std::fmt::Debug for Ingestor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("dim", &self.embedder.dimension())
            .field("store", &self.store)
            .field("options", &self.options)
            .finish()
    }
}
