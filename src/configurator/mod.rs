//! The kitchen cabinet configurator.
//!
//! Two flows share one [`Session`]:
//!
//! - [`cabinet::CabinetFlow`] loads the cabinet asset, classifies its parts, binds the
//!   selected catalog surface and animates the doors
//! - [`gui::ShellFlow`] draws the controls (door toggle, material panel, swatches,
//!   status banner, logo) and turns clicks into state changes
//!
//! Everything asynchronous (asset and texture loads) comes back as a
//! [`ConfiguratorEvent`].

use std::pin::Pin;

use crate::{
    config::ConfiguratorConfig,
    context::InitContext,
    data_structures::texture::Texture,
    flow::{self, FlowConstructor, GraphicsFlow},
    resources::SceneData,
};

pub mod animator;
pub mod binder;
pub mod cabinet;
pub mod catalog;
pub mod classify;
pub mod gui;
pub mod loader;
pub mod material;
pub mod shell;
pub mod state;

use state::Session;

/// Results of asynchronous work and requests between the flows.
pub enum ConfiguratorEvent {
    SceneLoaded {
        path: String,
        result: anyhow::Result<SceneData>,
    },
    TextureLoaded {
        generation: u64,
        path: String,
        result: anyhow::Result<Texture>,
    },
    /// Thumbnail of catalog entry `index`.
    SwatchLoaded {
        index: usize,
        result: anyhow::Result<Texture>,
    },
    LogoLoaded(anyhow::Result<Texture>),
    /// Retry a failed cabinet load.
    ReloadScene,
    /// Retry a failed load of the selected surface.
    ReloadTexture,
}

impl std::fmt::Debug for ConfiguratorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SceneLoaded { path, result } => f
                .debug_struct("SceneLoaded")
                .field("path", path)
                .field("ok", &result.is_ok())
                .finish(),
            Self::TextureLoaded {
                generation,
                path,
                result,
            } => f
                .debug_struct("TextureLoaded")
                .field("generation", generation)
                .field("path", path)
                .field("ok", &result.is_ok())
                .finish(),
            Self::SwatchLoaded { index, result } => f
                .debug_struct("SwatchLoaded")
                .field("index", index)
                .field("ok", &result.is_ok())
                .finish(),
            Self::LogoLoaded(result) => f.debug_tuple("LogoLoaded").field(&result.is_ok()).finish(),
            Self::ReloadScene => f.write_str("ReloadScene"),
            Self::ReloadTexture => f.write_str("ReloadTexture"),
        }
    }
}

type BoxedFlow = Box<dyn GraphicsFlow<Session, ConfiguratorEvent>>;

fn constructor<F>(build: F) -> FlowConstructor<Session, ConfiguratorEvent>
where
    F: FnOnce(InitContext) -> BoxedFlow + 'static,
{
    Box::new(move |init: InitContext| {
        let flow: Pin<Box<dyn Future<Output = BoxedFlow>>> = Box::pin(async move { build(init) });
        flow
    })
}

/// The flows of the configurator in update order: the cabinet derives the scene
/// status before the shell lays out its banner in the same frame.
pub fn flows(config: ConfiguratorConfig) -> Vec<FlowConstructor<Session, ConfiguratorEvent>> {
    let shell_config = config.clone();
    vec![
        constructor(move |init| Box::new(cabinet::CabinetFlow::new(init, config))),
        constructor(move |init| Box::new(gui::ShellFlow::new(init, shell_config))),
    ]
}

/// Opens the window and runs the configurator until it is closed.
pub fn run(config: ConfiguratorConfig) -> anyhow::Result<()> {
    flow::run(flows(config))
}
