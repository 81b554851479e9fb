//! Data structures of the rendered scene.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds the local transformation of a node and its GPU layout
//! - `scene_graph` is the node arena of the loaded cabinet

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
