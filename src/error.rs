//! Domain errors of the configurator.
//!
//! Plumbing code propagates `anyhow::Result`; the variants below are the failure
//! kinds the flows turn into visible state (status banner, log lines) instead of
//! tearing down the render loop.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfiguratorError {
    /// A mesh or texture asset could not be fetched or decoded.
    #[error("failed to load asset {path}: {reason}")]
    AssetLoad { path: String, reason: String },
    #[error("asset {path} did not load within {timeout:?}")]
    LoadTimeout { path: String, timeout: Duration },
    /// A selection referenced an id that is not part of the catalog.
    #[error("unknown material id {0:?}")]
    UnknownMaterialId(String),
    /// Neither the name rules nor the shape fallback found a door in the asset.
    #[error("no door parts could be classified in {path}")]
    ClassificationAmbiguity { path: String },
}

impl ConfiguratorError {
    pub fn asset_load(path: &str, err: &anyhow::Error) -> Self {
        Self::AssetLoad {
            path: path.to_string(),
            // `{:#}` keeps the whole context chain on one line
            reason: format!("{:#}", err),
        }
    }
}
