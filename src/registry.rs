//! Named embedding spaces
//!
//! The registry owns one [`IndexStore`] per configured space and hands out
//! `Arc` handles. Spaces share no state; each persists as
//! `<data_dir>/<name>.index` + `<data_dir>/<name>.meta.json`.

use crate::config::{OspreyConfig, SpaceConfig};
use crate::error::{Error, Result};
use osprey_index::{ArtifactPaths, IndexError, IndexStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Set of named index stores
pub struct IndexRegistry {
    config: OspreyConfig,
    spaces: BTreeMap<String, Arc<IndexStore>>,
}

impl IndexRegistry {
    /// Open every configured space from the data directory
    ///
    /// A space with no artifacts starts empty. A space whose artifacts are
    /// corrupt (or only half present) fails the open, unless
    /// `recover_corrupt` is set, in which case it starts empty with a warning.
    pub fn open(config: OspreyConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)?;

        let mut spaces = BTreeMap::new();
        for space in &config.spaces {
            let paths = ArtifactPaths::in_dir(&config.data_dir, &space.name);
            let store = open_space(space, &paths, config.recover_corrupt)?;
            spaces.insert(space.name.clone(), Arc::new(store));
        }

        info!(
            "Opened {} spaces from {}",
            spaces.len(),
            config.data_dir.display()
        );
        Ok(Self { config, spaces })
    }

    /// Every configured space, empty, without touching the disk
    pub fn empty(config: OspreyConfig) -> Result<Self> {
        config.validate()?;
        let spaces = config
            .spaces
            .iter()
            .map(|s| (s.name.clone(), Arc::new(IndexStore::new(s.store_config()))))
            .collect();
        Ok(Self { config, spaces })
    }

    /// Configuration in effect
    pub fn config(&self) -> &OspreyConfig {
        &self.config
    }

    /// Handle to a space
    pub fn space(&self, name: &str) -> Result<Arc<IndexStore>> {
        self.spaces
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownSpace(name.to_string()))
    }

    /// Space names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.spaces.keys().map(String::as_str).collect()
    }

    /// Artifact locations for a space
    pub fn paths(&self, name: &str) -> Result<ArtifactPaths> {
        if !self.spaces.contains_key(name) {
            return Err(Error::UnknownSpace(name.to_string()));
        }
        Ok(ArtifactPaths::in_dir(&self.config.data_dir, name))
    }

    /// Persist one space
    pub fn save(&self, name: &str) -> Result<()> {
        let store = self.space(name)?;
        store.save(&self.paths(name)?)?;
        Ok(())
    }

    /// Persist every space, stopping at the first failure
    pub fn save_all(&self) -> Result<()> {
        for name in self.spaces.keys() {
            self.save(name)?;
        }
        Ok(())
    }

    /// Empty a space and delete its artifacts
    ///
    /// Existing handles stay valid and observe the empty store.
    pub fn reset(&self, name: &str) -> Result<()> {
        let store = self.space(name)?;
        store.clear();
        self.paths(name)?.remove()?;
        info!("Reset space {}", name);
        Ok(())
    }

    /// Live entry count per space
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.spaces
            .iter()
            .map(|(name, store)| (name.clone(), store.count()))
            .collect()
    }
}

fn open_space(space: &SpaceConfig, paths: &ArtifactPaths, recover: bool) -> Result<IndexStore> {
    let store = IndexStore::new(space.store_config());

    let outcome = match (paths.index.exists(), paths.metadata.exists()) {
        (false, false) => {
            info!(
                "No artifacts for space {} in {}, starting empty",
                space.name,
                paths.index.parent().map(|p| p.display().to_string()).unwrap_or_default()
            );
            return Ok(store);
        }
        (true, true) => store.load(paths),
        (true, false) => Err(IndexError::corrupt(format!(
            "metadata artifact {} is missing",
            paths.metadata.display()
        ))),
        (false, true) => Err(IndexError::corrupt(format!(
            "index artifact {} is missing",
            paths.index.display()
        ))),
    };

    match outcome {
        Ok(()) => Ok(store),
        Err(e) if e.is_corrupt() && recover => {
            warn!(
                "Space {} has corrupt artifacts ({}); continuing with an empty index",
                space.name, e
            );
            Ok(store)
        }
        Err(e) => Err(e.into()),
    }
}

impl std::fmt::Debug for IndexRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRegistry")
            .field("data_dir", &self.config.data_dir)
            .field("spaces", &self.counts())
            .finish()
    }
}
