//! Identifier and result types shared by the index crates

use crate::value::Metadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-visible entry identifier
///
/// Assigned by the store on insertion (a UUID v4 string) and never reused.
/// The string form is opaque; callers must not parse it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        EntryId(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing id string (e.g. one returned to a caller earlier)
    pub fn new(id: impl Into<String>) -> Self {
        EntryId(id.into())
    }

    /// Borrow the id string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the id string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        EntryId(s.to_string())
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        EntryId(s)
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Internal position of an entry in the neighbor engine
///
/// IMPORTANT: Ordinals are never reused. They are handed out by a single
/// monotonically increasing counter per store, which survives save/load
/// and `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ordinal(pub u64);

impl Ordinal {
    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The ordinal after this one, or `None` once the counter is exhausted
    pub fn checked_next(&self) -> Option<Ordinal> {
        self.0.checked_add(1).map(Ordinal)
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Nearest-neighbor strategy, fixed when a store is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Brute-force scan, exact results
    #[default]
    Exact,
    /// Hierarchical navigable small-world graph, approximate results
    #[serde(alias = "hnsw")]
    Approximate,
}

impl EngineKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Exact => "exact",
            EngineKind::Approximate => "approximate",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "exact" | "flat" | "brute_force" => Some(EngineKind::Exact),
            "approximate" | "hnsw" => Some(EngineKind::Approximate),
            _ => None,
        }
    }

    /// Tag byte used in the index artifact header
    pub fn to_byte(&self) -> u8 {
        match self {
            EngineKind::Exact => 0,
            EngineKind::Approximate => 1,
        }
    }

    /// Inverse of [`EngineKind::to_byte`]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(EngineKind::Exact),
            1 => Some(EngineKind::Approximate),
            _ => None,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One search result
///
/// `distance` is squared Euclidean for both engines, so values are
/// comparable across engines and across stores of equal dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Entry id
    pub id: EntryId,
    /// Squared Euclidean distance to the query
    pub distance: f32,
    /// The entry's metadata, verbatim
    pub metadata: Metadata,
}

/// A stored entry within `threshold` of a query vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duplicate {
    /// Matching entry
    pub id: EntryId,
    /// Squared Euclidean distance to the query
    pub distance: f32,
}

/// A stored entry as returned by exact lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry id
    pub id: EntryId,
    /// The stored vector
    pub vector: Vec<f32>,
    /// Metadata payload
    pub metadata: Metadata,
    /// Content fingerprint supplied at insertion, if any
    pub content_hash: Option<String>,
}
