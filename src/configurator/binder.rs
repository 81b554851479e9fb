//! Binding of the selected catalog surface to the cabinet.
//!
//! Texture loads are asynchronous. Every request gets a new generation number and
//! only the result carrying the latest generation is bound, results of superseded
//! requests are released on arrival. The binder owns the bound texture and releases
//! it when it is replaced or when the binder is dropped.
//!
//! A failed request stays the latest one until [`MaterialBinder::retry`] is called,
//! so a missing file is not fetched again every frame.

use crate::{
    config::ConfiguratorConfig,
    configurator::{classify::PartClassification, material::is_hardware},
    configurator::catalog::MaterialRecord,
    data_structures::scene_graph::{MaterialSlot, SceneGraph},
};

/// A loaded colour map that can be freed explicitly.
pub trait TextureResource {
    /// Path the texture was loaded from.
    fn source(&self) -> &str;
    fn release(self);
}

/// What the caller has to load for a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureTicket {
    pub generation: u64,
    pub material_id: &'static str,
    pub path: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    /// A newer request was issued in the meantime; the texture was released.
    Superseded,
    /// The previous material stays bound.
    Failed(String),
}

pub struct MaterialBinder<T: TextureResource> {
    paths: ConfiguratorConfig,
    generation: u64,
    requested: Option<&'static str>,
    failed: bool,
    bound: Option<T>,
    dirty: bool,
}

impl<T: TextureResource> MaterialBinder<T> {
    pub fn new(config: &ConfiguratorConfig) -> Self {
        Self {
            paths: config.clone(),
            generation: 0,
            requested: None,
            failed: false,
            bound: None,
            dirty: false,
        }
    }

    /// Id of the most recent request, bound or still in flight.
    pub fn requested(&self) -> Option<&'static str> {
        self.requested
    }

    pub fn bound(&self) -> Option<&T> {
        self.bound.as_ref()
    }

    /// Starts a new request unless `record` is already the latest one.
    pub fn request(&mut self, record: &'static MaterialRecord) -> Option<TextureTicket> {
        if self.requested == Some(record.id) {
            return None;
        }
        self.generation += 1;
        self.requested = Some(record.id);
        self.failed = false;
        let ticket = TextureTicket {
            generation: self.generation,
            material_id: record.id,
            path: self.paths.texture_path(record.id),
        };
        log::debug!("Requesting texture {} (generation {})", ticket.path, ticket.generation);
        Some(ticket)
    }

    pub fn complete(&mut self, generation: u64, result: anyhow::Result<T>) -> BindOutcome {
        if generation != self.generation {
            if let Ok(texture) = result {
                log::debug!(
                    "Dropping stale texture {} (generation {}, latest {})",
                    texture.source(),
                    generation,
                    self.generation
                );
                texture.release();
            }
            return BindOutcome::Superseded;
        }
        match result {
            Ok(texture) => {
                log::info!("Bound texture {}", texture.source());
                if let Some(previous) = self.bound.replace(texture) {
                    previous.release();
                }
                self.dirty = true;
                BindOutcome::Bound
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                log::warn!("Texture load failed, keeping the current material: {}", reason);
                self.failed = true;
                BindOutcome::Failed(reason)
            }
        }
    }

    /// [`complete`](Self::complete) followed by [`apply`](Self::apply) on the loaded
    /// cabinet, so no frame draws a slot naming a texture that was just released.
    pub fn complete_into(
        &mut self,
        generation: u64,
        result: anyhow::Result<T>,
        scene: Option<(&mut SceneGraph, &PartClassification)>,
    ) -> BindOutcome {
        let outcome = self.complete(generation, result);
        if let (BindOutcome::Bound, Some((graph, parts))) = (&outcome, scene) {
            self.apply(graph, parts);
        }
        outcome
    }

    /// Forgets a failed request; the next [`request`](Self::request) for the same id
    /// issues a new ticket. Returns false when the latest request did not fail.
    pub fn retry(&mut self) -> bool {
        if !self.failed {
            return false;
        }
        log::info!("Retrying texture {:?}", self.requested);
        self.failed = false;
        self.requested = None;
        true
    }

    /// Writes the bound surface into every eligible mesh after a new bind.
    ///
    /// Returns the number of meshes that were updated.
    pub fn apply(&mut self, graph: &mut SceneGraph, parts: &PartClassification) -> usize {
        if !self.dirty {
            return 0;
        }
        let Some(texture) = &self.bound else {
            return 0;
        };
        let targets: Vec<_> = graph
            .meshes()
            .filter(|id| {
                let node = &graph[*id];
                !parts.is_glass(*id)
                    && node.material != MaterialSlot::Glass
                    && !is_hardware(&node.name)
            })
            .collect();
        for id in &targets {
            graph[*id].material = MaterialSlot::Surface {
                texture_source: texture.source().to_string(),
            };
        }
        self.dirty = false;
        targets.len()
    }

    /// Re-applies the bound surface on the next [`apply`](Self::apply), e.g. after a reload.
    pub fn invalidate(&mut self) {
        self.dirty = self.bound.is_some();
    }
}

impl<T: TextureResource> Drop for MaterialBinder<T> {
    fn drop(&mut self) {
        if let Some(texture) = self.bound.take() {
            texture.release();
        }
    }
}
