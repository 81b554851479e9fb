//! The 3D cabinet: loading, part classification, surface binding and door animation.

use std::collections::HashMap;

use anyhow::{Context as _, ensure};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{DeviceEvent, WindowEvent};

#[cfg(feature = "integration-tests")]
use crate::flow::ImageTestResult;
use crate::{
    camera::{CameraController, OrbitCamera, Projection},
    config::ConfiguratorConfig,
    configurator::{
        ConfiguratorEvent,
        animator::DoorAnimator,
        binder::{BindOutcome, MaterialBinder, TextureResource},
        classify::{self, PartClassification},
        loader::SceneLoader,
        material::{GlassParams, SurfaceParams},
        state::{SceneStatus, Session},
    },
    context::{Context, InitContext},
    data_structures::{
        instance::InstanceRaw,
        model::{Material, MaterialUniform, Mesh},
        scene_graph::{MaterialSlot, NodeId, SceneGraph},
        texture::{SamplerSettings, Texture},
    },
    flow::{GraphicsFlow, Out},
    render::{Instanced, Render},
    resources::{SceneData, load_scene, texture::load_texture, with_timeout},
};

/// The bound catalog surface: its colour map and the material sampling it.
#[derive(Debug)]
pub struct BoundSurface {
    source: String,
    texture: Texture,
    material: Material,
}

impl BoundSurface {
    pub fn new(ctx: &Context, source: String, texture: Texture) -> Self {
        let uniform: MaterialUniform = SurfaceParams::default().into();
        let material = Material::new(
            &ctx.device,
            &source,
            &texture,
            uniform,
            &ctx.pipelines.material_layout,
        );
        Self {
            source,
            texture,
            material,
        }
    }
}

impl TextureResource for BoundSurface {
    fn source(&self) -> &str {
        &self.source
    }

    fn release(self) {
        self.texture.release();
    }
}

/// A glTF primitive on the GPU and the node it belongs to.
#[derive(Debug)]
struct Draw {
    node: NodeId,
    mesh: Mesh,
    material: Option<usize>,
}

/// A loaded cabinet with everything needed to draw and animate it.
#[derive(Debug)]
pub struct Cabinet {
    pub graph: SceneGraph,
    pub parts: PartClassification,
    pub animator: DoorAnimator,
    draws: Vec<Draw>,
    instances: HashMap<NodeId, wgpu::Buffer>,
    source_materials: Vec<Material>,
    default_material: Material,
    glass_material: Material,
}

impl Cabinet {
    /// Classifies the parts and uploads meshes, authored materials and one instance
    /// buffer per mesh node.
    pub fn upload(ctx: &Context, data: SceneData, config: &ConfiguratorConfig) -> anyhow::Result<Self> {
        ensure!(
            !data.primitives.is_empty(),
            "{} contains no triangle meshes",
            config.model_path
        );
        let SceneData {
            mut graph,
            primitives,
            materials,
            images,
        } = data;

        let parts = classify::classify(&graph);
        classify::apply_glass(&mut graph, &parts);
        let animator = DoorAnimator::new(
            &graph,
            &parts,
            config.animation_rate,
            config.door_open_angle,
        );
        graph.update_world_transforms();

        let device = &ctx.device;
        let layout = &ctx.pipelines.material_layout;
        let white = Texture::create_solid([255; 4], "white", device, &ctx.queue);

        let source_materials = materials
            .iter()
            .map(|material| {
                let uniform = MaterialUniform {
                    base_color: material.base_color,
                    ..Default::default()
                };
                let image = material
                    .base_color_image
                    .and_then(|index| images.get(index))
                    .and_then(Option::as_ref);
                let texture = match image {
                    Some(image) => Texture::from_image(
                        device,
                        &ctx.queue,
                        image,
                        Some(&material.name),
                        SamplerSettings::default(),
                    )
                    .with_context(|| format!("uploading the colour map of {}", material.name))?,
                    None => white.clone(),
                };
                Ok(Material::new(device, &material.name, &texture, uniform, layout))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let default_material =
            Material::new(device, "default", &white, MaterialUniform::default(), layout);
        let glass_material =
            Material::new(device, "glass", &white, GlassParams::default().into(), layout);

        let draws = primitives
            .into_iter()
            .map(|primitive| Draw {
                mesh: Mesh::new(
                    device,
                    &graph[primitive.node].name,
                    &primitive.vertices,
                    &primitive.indices,
                ),
                node: primitive.node,
                material: primitive.material,
            })
            .collect();

        let instances = graph
            .meshes()
            .map(|id| {
                let raw = InstanceRaw::from_matrix(graph[id].world());
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Instance Buffer", graph[id].name)),
                    contents: bytemuck::cast_slice(&[raw]),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
                (id, buffer)
            })
            .collect();

        Ok(Self {
            graph,
            parts,
            animator,
            draws,
            instances,
            source_materials,
            default_material,
            glass_material,
        })
    }

    fn source_material(&self, index: Option<usize>) -> &Material {
        index
            .and_then(|index| self.source_materials.get(index))
            .unwrap_or(&self.default_material)
    }

    /// Uploads the world matrices after the hinges moved.
    fn write_instances(&mut self, queue: &wgpu::Queue) {
        self.graph.update_world_transforms();
        for (id, buffer) in &self.instances {
            let raw = InstanceRaw::from_matrix(self.graph[*id].world());
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[raw]));
        }
    }

    fn render<'a>(&'a self, surface: Option<&'a BoundSurface>) -> Render<'a> {
        let mut opaque = Vec::new();
        let mut glass = Vec::new();
        for draw in &self.draws {
            let Some(instance) = self.instances.get(&draw.node) else {
                continue;
            };
            let (material, transparent) = match &self.graph[draw.node].material {
                MaterialSlot::Glass => (&self.glass_material, true),
                MaterialSlot::Surface { texture_source } => (
                    surface
                        .filter(|bound| bound.source() == texture_source)
                        .map(|bound| &bound.material)
                        .unwrap_or_else(|| self.source_material(draw.material)),
                    false,
                ),
                MaterialSlot::Source(_) => (self.source_material(draw.material), false),
            };
            let instanced = Instanced {
                instance,
                mesh: &draw.mesh,
                material: &material.bind_group,
                amount: 1,
                id: 0,
            };
            if transparent {
                glass.push(instanced);
            } else {
                opaque.push(instanced);
            }
        }
        Render::Composed(vec![Render::Defaults(opaque), Render::Transparents(glass)])
    }
}

pub struct CabinetFlow {
    config: ConfiguratorConfig,
    init: InitContext,
    loader: SceneLoader<Cabinet>,
    binder: MaterialBinder<BoundSurface>,
}

impl CabinetFlow {
    pub fn new(init: InitContext, config: ConfiguratorConfig) -> Self {
        let binder = MaterialBinder::new(&config);
        Self {
            config,
            init,
            loader: SceneLoader::new(),
            binder,
        }
    }

    fn load_scene(&self) -> Box<dyn Future<Output = ConfiguratorEvent>> {
        let path = self.config.model_path.clone();
        let timeout = self.config.load_timeout;
        Box::new(async move {
            let result = with_timeout(&path, timeout, load_scene(&path)).await;
            ConfiguratorEvent::SceneLoaded { path, result }
        })
    }

    fn load_surface(&self, generation: u64, path: String) -> Box<dyn Future<Output = ConfiguratorEvent>> {
        let InitContext {
            device,
            queue,
            max_anisotropy,
        } = self.init.clone();
        let timeout = self.config.load_timeout;
        let sampler = SamplerSettings {
            address_mode: wgpu::AddressMode::Repeat,
            anisotropy: max_anisotropy,
        };
        Box::new(async move {
            let result = with_timeout(
                &path,
                timeout,
                load_texture(&path, &device, &queue, sampler),
            )
            .await;
            ConfiguratorEvent::TextureLoaded {
                generation,
                path,
                result,
            }
        })
    }

    fn scene_loaded(&mut self, ctx: &Context, state: &mut Session, path: String, result: anyhow::Result<SceneData>) {
        let result = result.and_then(|data| Cabinet::upload(ctx, data, &self.config));
        match self.loader.finish(&path, result) {
            Ok(()) => {
                let Some(cabinet) = self.loader.get_mut(&path) else {
                    return;
                };
                if let Err(e) = cabinet.parts.check_doors(&path) {
                    log::warn!("{}, toggling the door has no effect", e);
                }
                state.scene = SceneStatus::Ready {
                    animated: !cabinet.animator.is_inert(),
                };
                // the first frame of the new cabinet already shows the bound surface
                self.binder.invalidate();
                self.binder.apply(&mut cabinet.graph, &cabinet.parts);
            }
            Err(e) => state.scene = SceneStatus::Failed(e.to_string()),
        }
    }
}

impl GraphicsFlow<Session, ConfiguratorEvent> for CabinetFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut Session) -> Out<Session, ConfiguratorEvent> {
        let camera = &self.config.camera;
        ctx.camera.camera = OrbitCamera::from_config(camera);
        ctx.camera.controller = CameraController::new(camera.rotate_speed, camera.zoom_speed);
        ctx.projection = Projection::new(
            ctx.config.width,
            ctx.config.height,
            camera.fovy,
            camera.znear,
            camera.zfar,
        );
        ctx.light
            .configure(&ctx.device, &ctx.queue, &self.config.lighting);
        ctx.clear_colour = self.config.clear_colour;
        ctx.write_camera();
        Out::Empty
    }

    fn on_click(&mut self, _: &Context, _: &mut Session, _: u32) -> Out<Session, ConfiguratorEvent> {
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, state: &mut Session, dt: Duration) -> Out<Session, ConfiguratorEvent> {
        let mut loads = Vec::new();
        let path = &self.config.model_path;

        if self.loader.state(path).is_idle() && self.loader.begin(path) {
            state.scene = SceneStatus::Loading;
            loads.push(self.load_scene());
        }

        if let Some(ticket) = self.binder.request(state.app.selected_material()) {
            loads.push(self.load_surface(ticket.generation, ticket.path));
        }

        if let Some(cabinet) = self.loader.get_mut(path) {
            cabinet.animator.set_open(state.app.door_open());
            let moved = cabinet.animator.tick(dt, &mut cabinet.graph);
            let rebound = self.binder.apply(&mut cabinet.graph, &cabinet.parts);
            if rebound > 0 {
                log::debug!("Applied the surface to {} parts", rebound);
            }
            if moved {
                cabinet.write_instances(&ctx.queue);
            }
        }

        if loads.is_empty() {
            Out::Empty
        } else {
            Out::FutEvent(loads)
        }
    }

    fn on_device_events(&mut self, _: &Context, _: &mut Session, _: &DeviceEvent) -> Out<Session, ConfiguratorEvent> {
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &mut Session, _: &WindowEvent) -> Out<Session, ConfiguratorEvent> {
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        state: &mut Session,
        event: ConfiguratorEvent,
    ) -> Option<ConfiguratorEvent> {
        match event {
            ConfiguratorEvent::SceneLoaded { path, result } => {
                self.scene_loaded(ctx, state, path, result);
                None
            }
            ConfiguratorEvent::TextureLoaded {
                generation,
                path,
                result,
            } => {
                let result = result.map(|texture| BoundSurface::new(ctx, path, texture));
                let scene = self
                    .loader
                    .get_mut(&self.config.model_path)
                    .map(|cabinet| (&mut cabinet.graph, &cabinet.parts));
                match self.binder.complete_into(generation, result, scene) {
                    BindOutcome::Bound => state.texture_error = None,
                    BindOutcome::Failed(reason) => state.texture_error = Some(reason),
                    BindOutcome::Superseded => (),
                }
                None
            }
            ConfiguratorEvent::ReloadTexture => {
                // picked up by the next on_update
                self.binder.retry();
                None
            }
            ConfiguratorEvent::ReloadScene => {
                if self.loader.retry(&self.config.model_path) {
                    log::info!("Reloading {}", self.config.model_path);
                    state.scene = SceneStatus::Loading;
                }
                None
            }
            other => Some(other),
        }
    }

    fn on_render(&self) -> Render<'_> {
        match self.loader.get(&self.config.model_path) {
            Some(cabinet) => cabinet.render(self.binder.bound()),
            None => Render::None,
        }
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _: &Context,
        _: &mut Session,
        _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        Ok(ImageTestResult::Passed)
    }
}
