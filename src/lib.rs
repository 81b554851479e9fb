//! cabinet-configurator
//!
//! A cross-platform 3D configurator for a kitchen cabinet, running natively and in
//! the browser (WASM). The user opens and closes the cabinet doors and picks one of
//! a fixed catalog of wood and stone surfaces, which is applied to the cabinet body
//! while glass and hardware keep their own look.
//!
//! High-level modules
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `config`: asset paths, animation constants, camera and lighting settings
//! - `configurator`: catalog, session state, part classification, material binding,
//!   door animation and the two flows (cabinet and shell)
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene graph, meshes, instances and textures
//! - `error`: the domain error type
//! - `flow`: flow trait and the winit event loop driving all flows
//! - `pick`: GPU picking of the shell controls
//! - `pipelines`: surface, glass, shadow, GUI and pick pipelines
//! - `resources`: helpers to load the scene and textures and create GPU resources
//! - `render`: render composition for pipeline batching
//!

pub mod camera;
pub mod config;
pub mod configurator;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pick;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use config::ConfiguratorConfig;
pub use error::ConfiguratorError;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point, runs with the default configuration.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    configurator::run(ConfiguratorConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
