//! Render composition and pipeline batching.
//!
//! This module defines the [`Render`] enum, which flows use to specify how their
//! objects are drawn. The engine sorts every flow's `Render` into batches per
//! pipeline (opaque surfaces, glass, GUI) and, for picking, collects the GUI quads.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Instanced<'a>`] contains data for instanced rendering (mesh + material + instance buffer)
//! - [`Flat<'a>`] contains data for flat (2D / GUI) rendering (vertex + index buffers)
//!

use std::collections::{HashMap, HashSet};

use crate::data_structures::model::Mesh;

/// Data for instanced mesh rendering: a mesh, its material, an instance buffer and a pick ID.
#[derive(Clone, Copy)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a Mesh,
    pub material: &'a wgpu::BindGroup,
    pub amount: usize,
    pub id: u32,
}

/// Data for flat (2D / GUI) object rendering: vertex and index buffers with a bind group.
///
/// The bind group contains the texture and sampler of the quad.
#[derive(Clone, Copy)]
pub struct Flat<'a> {
    pub vertex: &'a wgpu::Buffer,
    pub index: &'a wgpu::Buffer,
    pub group: &'a wgpu::BindGroup,
    pub amount: usize,
    pub id: u32,
}

/// Everything the flows want drawn this frame, grouped by pipeline.
#[derive(Default)]
pub(crate) struct Batches<'a> {
    pub opaque: Vec<Instanced<'a>>,
    pub glass: Vec<Instanced<'a>>,
    /// Drawn in order; the flows emit their quads back to front.
    pub gui: Vec<Flat<'a>>,
}

/// Specifies how a flow's objects should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Default(Instanced)` renders a single opaque instanced mesh
/// - `Defaults(Vec<Instanced>)` renders a batch of opaque instanced meshes
/// - `Transparent(Instanced)` renders a single alpha blended mesh after all opaque ones
/// - `Transparents(Vec<Instanced>)` renders a batch of alpha blended meshes
/// - `GUI(Flat)` renders 2D elements (flat geometry) on top of the scene
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
///
pub enum Render<'a> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Transparent(Instanced<'a>),
    Transparents(Vec<Instanced<'a>>),
    GUI(Flat<'a>),
    Composed(Vec<Render<'a>>),
}

fn insert_id(map: &mut HashMap<u32, HashSet<usize>>, id: u32, flow_id: usize) {
    map.entry(id)
        .and_modify(|flows| _ = flows.insert(flow_id))
        .or_insert([flow_id].into());
}

impl<'a> Render<'a> {
    /// Map object IDs to flow IDs for picking and selection.
    ///
    /// Walks the render tree and records which flow owns which object ID so only
    /// the owning flows receive the click.
    pub(crate) fn map_ids(&self, flow_id: usize, map: &mut HashMap<u32, HashSet<usize>>) {
        match self {
            Render::Default(instanced) | Render::Transparent(instanced) => {
                insert_id(map, instanced.id, flow_id)
            }
            Render::Defaults(vec) | Render::Transparents(vec) => vec
                .iter()
                .for_each(|instanced| insert_id(map, instanced.id, flow_id)),
            Render::GUI(flat) => insert_id(map, flat.id, flow_id),
            Render::Composed(renders) => renders
                .iter()
                .for_each(|render| render.map_ids(flow_id, map)),
            Render::None => (),
        }
    }

    /// Sorts the render tree into the batches of the main pass.
    pub(crate) fn collect(self, batches: &mut Batches<'a>) {
        match self {
            Render::Default(instanced) => batches.opaque.push(instanced),
            Render::Defaults(mut vec) => batches.opaque.append(&mut vec),
            Render::Transparent(instanced) => batches.glass.push(instanced),
            Render::Transparents(mut vec) => batches.glass.append(&mut vec),
            Render::GUI(flat) => batches.gui.push(flat),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.collect(batches)),
            Render::None => (),
        }
    }

    /// Collects what can be clicked. Only the GUI quads are pickable; the cabinet
    /// itself reacts to the orbit controls alone.
    pub(crate) fn set_pick_pipelines(self, flats: &mut Vec<Flat<'a>>) {
        match self {
            Render::GUI(flat) => flats.push(flat),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pick_pipelines(flats)),
            Render::None
            | Render::Default(_)
            | Render::Defaults(_)
            | Render::Transparent(_)
            | Render::Transparents(_) => (),
        }
    }
}
