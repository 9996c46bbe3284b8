//! Shared types for the Osprey embedding index
//!
//! - [`Value`] / [`Metadata`]: opaque metadata payload carried with each entry
//! - [`EntryId`], [`Ordinal`]: external and internal identifiers
//! - [`EngineKind`]: nearest-neighbor strategy selector
//! - [`SearchHit`], [`Duplicate`], [`Entry`]: operation results
//! - [`IndexError`]: the error enum for every index operation

#![warn(missing_docs)]

pub mod error;
pub mod types;
pub mod value;

pub use error::{validate_metadata, validate_vector, IndexError, IndexResult};
pub use types::{Duplicate, EngineKind, Entry, EntryId, Ordinal, SearchHit};
pub use value::{Metadata, Value};
