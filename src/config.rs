//! Configuration for the index registry
//!
//! Loaded from TOML, then optionally overridden from the environment:
//!
//! | Variable          | Effect                                              |
//! |-------------------|-----------------------------------------------------|
//! | `OSPREY_DATA_DIR` | replaces `data_dir`                                 |
//! | `OSPREY_USE_HNSW` | `1`/`true`/`yes` selects HNSW for every space, `0`/`false`/`no` selects exact |
//!
//! ```toml
//! data_dir = "data"
//! recover_corrupt = false
//!
//! [[spaces]]
//! name = "vision"
//! dim = 512
//!
//! [[spaces]]
//! name = "text"
//! dim = 384
//! engine = "hnsw"
//! hnsw = { m = 32, ef_search = 128 }
//! ```

use osprey_index::{EngineKind, HnswConfig, StoreConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Environment variable overriding the data directory
pub const ENV_DATA_DIR: &str = "OSPREY_DATA_DIR";

/// Environment variable switching every space to HNSW (or back)
pub const ENV_USE_HNSW: &str = "OSPREY_USE_HNSW";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but break a rule
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One named embedding space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// Space name, also the artifact file stem
    pub name: String,
    /// Vector dimension
    pub dim: usize,
    /// Nearest-neighbor engine
    #[serde(default)]
    pub engine: EngineKind,
    /// HNSW tuning, used when `engine` is approximate
    #[serde(default)]
    pub hnsw: HnswConfig,
}

impl SpaceConfig {
    /// Exact-engine space
    pub fn new(name: impl Into<String>, dim: usize) -> Self {
        Self {
            name: name.into(),
            dim,
            engine: EngineKind::Exact,
            hnsw: HnswConfig::default(),
        }
    }

    /// Store configuration for this space
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            dim: self.dim,
            engine: self.engine,
            hnsw: self.hnsw,
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OspreyConfig {
    /// Directory holding `<space>.index` and `<space>.meta.json`
    pub data_dir: PathBuf,
    /// Start a space empty (with a warning) when its artifacts are corrupt,
    /// instead of failing to open
    pub recover_corrupt: bool,
    /// Embedding spaces to open
    pub spaces: Vec<SpaceConfig>,
}

impl Default for OspreyConfig {
    /// Two spaces: `vision` (512, image/video/audio embeddings) and
    /// `text` (384), both exact
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            recover_corrupt: false,
            spaces: vec![SpaceConfig::new("vision", 512), SpaceConfig::new("text", 384)],
        }
    }
}

impl OspreyConfig {
    /// Parse TOML text and validate
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: OspreyConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, apply environment overrides, and validate
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: OspreyConfig = toml::from_str(&text)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `OSPREY_DATA_DIR` / `OSPREY_USE_HNSW` from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(ENV_USE_HNSW) {
            let engine = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => Some(EngineKind::Approximate),
                "0" | "false" | "no" | "" => Some(EngineKind::Exact),
                other => {
                    warn!("Ignoring {}={:?}: expected 1/true/yes or 0/false/no", ENV_USE_HNSW, other);
                    None
                }
            };
            if let Some(engine) = engine {
                for space in &mut self.spaces {
                    space.engine = engine;
                }
            }
        }
    }

    /// Check names and numeric bounds
    ///
    /// - at least one space; names non-empty, unique, and usable as file stems
    /// - `dim > 0`
    /// - HNSW spaces: `m >= 2`, `ef_construction >= 1`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spaces.is_empty() {
            return Err(ConfigError::Invalid("no spaces configured".into()));
        }

        let mut seen = BTreeSet::new();
        for space in &self.spaces {
            let name = space.name.as_str();
            if name.is_empty() {
                return Err(ConfigError::Invalid("space name must not be empty".into()));
            }
            if !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(ConfigError::Invalid(format!(
                    "space name {:?} may only contain ASCII letters, digits, '_' and '-'",
                    name
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!("duplicate space name {:?}", name)));
            }
            if space.dim == 0 {
                return Err(ConfigError::Invalid(format!(
                    "space {:?} has dimension 0",
                    name
                )));
            }
            if space.engine == EngineKind::Approximate {
                if space.hnsw.m < 2 {
                    return Err(ConfigError::Invalid(format!(
                        "space {:?}: hnsw.m must be at least 2, got {}",
                        name, space.hnsw.m
                    )));
                }
                if space.hnsw.ef_construction == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "space {:?}: hnsw.ef_construction must be positive",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Look up a space by name
    pub fn space(&self, name: &str) -> Option<&SpaceConfig> {
        self.spaces.iter().find(|s| s.name == name)
    }
}
