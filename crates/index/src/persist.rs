//! Artifact paths, the metadata artifact, and atomic writes
//!
//! A store persists as two files: the binary index artifact (see
//! [`crate::artifact`]) and a pretty-printed JSON metadata artifact that maps
//! ordinals to ids and carries metadata, raw vectors and content hashes.
//! Both are written to sibling temporaries, fsynced, then renamed into place.

use osprey_core::{validate_vector, EngineKind, EntryId, IndexError, IndexResult, Metadata, Ordinal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Current metadata artifact format version
pub const METADATA_FORMAT_VERSION: u32 = 1;

/// Where a store's two artifacts live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Binary index artifact
    pub index: PathBuf,
    /// JSON metadata artifact
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    /// Explicit paths
    pub fn new(index: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            metadata: metadata.into(),
        }
    }

    /// `<dir>/<stem>.index` and `<dir>/<stem>.meta.json`
    pub fn in_dir(dir: impl AsRef<Path>, stem: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            index: dir.join(format!("{}.index", stem)),
            metadata: dir.join(format!("{}.meta.json", stem)),
        }
    }

    /// True if both files exist
    pub fn exist(&self) -> bool {
        self.index.exists() && self.metadata.exists()
    }

    /// True if at least one file exists
    pub fn any_exist(&self) -> bool {
        self.index.exists() || self.metadata.exists()
    }

    /// Delete both files, ignoring ones already gone
    pub fn remove(&self) -> io::Result<()> {
        for path in [&self.index, &self.metadata] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// On-disk shape of the metadata artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataArtifact {
    /// [`METADATA_FORMAT_VERSION`] at write time
    pub format_version: u32,
    /// Store dimension
    pub dim: usize,
    /// Engine that wrote the companion index artifact
    pub engine: EngineKind,
    /// Next ordinal the store will hand out
    pub next_ordinal: Ordinal,
    /// Every live ordinal and its external id
    pub ordinal_to_id: BTreeMap<Ordinal, EntryId>,
    /// Metadata payload per id
    pub metadata: BTreeMap<EntryId, Metadata>,
    /// Raw vector per id
    pub vectors: BTreeMap<EntryId, Vec<f32>>,
    /// Content hash -> id
    pub content_hash_to_id: BTreeMap<String, EntryId>,
}

impl MetadataArtifact {
    /// Parse artifact bytes; any failure is `CorruptState`
    pub fn from_json(bytes: &[u8]) -> IndexResult<Self> {
        let artifact: MetadataArtifact = serde_json::from_slice(bytes)
            .map_err(|e| IndexError::corrupt(format!("metadata artifact: {}", e)))?;
        if artifact.format_version != METADATA_FORMAT_VERSION {
            return Err(IndexError::corrupt(format!(
                "metadata artifact version {} (expected {})",
                artifact.format_version, METADATA_FORMAT_VERSION
            )));
        }
        Ok(artifact)
    }

    /// Pretty JSON; serialization failures surface as `Io`
    pub fn to_json(&self) -> IndexResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| IndexError::Io(io::Error::other(e)))
    }

    /// Internal consistency checks that need no engine
    ///
    /// - `dim` matches the store
    /// - `ordinal_to_id` is injective and every ordinal is below `next_ordinal`
    /// - the id sets of `ordinal_to_id`, `metadata` and `vectors` are equal
    /// - every vector is a valid `dim`-length vector
    /// - every content hash points to a live id
    pub fn validate(&self, dim: usize) -> IndexResult<()> {
        if self.dim != dim {
            return Err(IndexError::corrupt(format!(
                "metadata artifact dimension {} does not match store dimension {}",
                self.dim, dim
            )));
        }

        let mut ids: BTreeSet<&EntryId> = BTreeSet::new();
        for (ordinal, id) in &self.ordinal_to_id {
            if *ordinal >= self.next_ordinal {
                return Err(IndexError::corrupt(format!(
                    "ordinal {} is not below next ordinal {}",
                    ordinal, self.next_ordinal
                )));
            }
            if !ids.insert(id) {
                return Err(IndexError::corrupt(format!(
                    "id {} is mapped from more than one ordinal",
                    id
                )));
            }
        }

        if let Some(stray) = self.metadata.keys().find(|id| !ids.contains(id)) {
            return Err(IndexError::corrupt(format!(
                "metadata for unknown id {}",
                stray
            )));
        }
        if let Some(stray) = self.vectors.keys().find(|id| !ids.contains(id)) {
            return Err(IndexError::corrupt(format!("vector for unknown id {}", stray)));
        }

        for id in &ids {
            if !self.metadata.contains_key(*id) {
                return Err(IndexError::corrupt(format!("id {} has no metadata", id)));
            }
            let vector = self
                .vectors
                .get(*id)
                .ok_or_else(|| IndexError::corrupt(format!("id {} has no vector", id)))?;
            validate_vector(vector, dim)
                .map_err(|e| IndexError::corrupt(format!("vector for id {}: {}", id, e)))?;
        }

        if let Some((hash, id)) = self
            .content_hash_to_id
            .iter()
            .find(|(_, id)| !ids.contains(id))
        {
            return Err(IndexError::corrupt(format!(
                "content hash {} points to unknown id {}",
                hash, id
            )));
        }

        Ok(())
    }
}

/// Sibling temporary path: `<target>.tmp`
pub(crate) fn temp_path(target: &Path) -> PathBuf {
    let mut name: OsString = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write every `(path, bytes)` pair so that readers see either all old or
/// all new file contents per file
///
/// Each file goes to a fsynced temporary first; renames start only after
/// every temporary is complete. A failure before the renames removes the
/// temporaries and leaves the targets untouched. The renames themselves are
/// per-file atomic, not atomic across files; a failed rename removes the
/// temporaries not yet renamed.
pub(crate) fn write_all_atomically(files: &[(&Path, &[u8])]) -> io::Result<()> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());

    for (target, bytes) in files {
        let tmp = temp_path(target);
        let result = (|| {
            if let Some(parent) = target.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()
        })();
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            for done in &written {
                let _ = fs::remove_file(done);
            }
            return Err(e);
        }
        written.push(tmp);
    }

    for (i, ((target, _), tmp)) in files.iter().zip(&written).enumerate() {
        if let Err(e) = fs::rename(tmp, target) {
            for leftover in &written[i..] {
                let _ = fs::remove_file(leftover);
            }
            return Err(e);
        }
    }
    Ok(())
}
