//! Per-session cache of loaded scene assets.

use std::collections::HashMap;

use crate::error::ConfiguratorError;

#[derive(Debug)]
pub enum LoadState<A> {
    Idle,
    Loading,
    Ready(A),
    Failed(String),
}

impl<A> LoadState<A> {
    pub fn is_idle(&self) -> bool {
        matches!(self, LoadState::Idle)
    }
}

/// Each path is loaded at most once unless it failed and [`retry`](Self::retry) was called.
#[derive(Debug)]
pub struct SceneLoader<A> {
    entries: HashMap<String, LoadState<A>>,
}

impl<A> SceneLoader<A> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn state(&self, path: &str) -> &LoadState<A> {
        self.entries.get(path).unwrap_or(&LoadState::Idle)
    }

    /// Marks `path` as loading. Returns false when it is already loading or done.
    pub fn begin(&mut self, path: &str) -> bool {
        let entry = self
            .entries
            .entry(path.to_string())
            .or_insert(LoadState::Idle);
        if !entry.is_idle() {
            return false;
        }
        log::info!("Loading {}", path);
        *entry = LoadState::Loading;
        true
    }

    pub fn finish(&mut self, path: &str, result: anyhow::Result<A>) -> Result<(), ConfiguratorError> {
        let Some(entry) = self.entries.get_mut(path) else {
            log::warn!("Received a load result for {} which was never requested", path);
            return Err(ConfiguratorError::AssetLoad {
                path: path.to_string(),
                reason: "not requested".to_string(),
            });
        };
        match result {
            Ok(asset) => {
                log::info!("Loaded {}", path);
                *entry = LoadState::Ready(asset);
                Ok(())
            }
            Err(e) => {
                let error = ConfiguratorError::asset_load(path, &e);
                log::error!("{}", error);
                *entry = LoadState::Failed(error.to_string());
                Err(error)
            }
        }
    }

    /// Moves a failed path back to idle so the next [`begin`](Self::begin) loads it again.
    pub fn retry(&mut self, path: &str) -> bool {
        match self.entries.get_mut(path) {
            Some(entry @ LoadState::Failed(_)) => {
                *entry = LoadState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, path: &str) -> Option<&A> {
        match self.entries.get(path) {
            Some(LoadState::Ready(asset)) => Some(asset),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut A> {
        match self.entries.get_mut(path) {
            Some(LoadState::Ready(asset)) => Some(asset),
            _ => None,
        }
    }
}

impl<A> Default for SceneLoader<A> {
    fn default() -> Self {
        Self::new()
    }
}
