//! Flow control and application event loop.
//!
//! This module provides the main event loop and the flow abstraction. A "flow" is
//! a self-contained part of the application that handles user input, updates its
//! state and provides renderable objects each frame. The runner drives all flows
//! in order and coordinates rendering, picking, and event distribution.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is the trait for flows that handle events and rendering
//! - [`Out<S, E>`] is the output type for async event handling and context configuration
//!
//! # Lifecycle Flow
//!
//! The event loop follows this pattern each frame:
//! 1. Collect window/device events
//! 2. Call `on_<device/window/custom>_event` on all flows for event distribution
//! 3. Call flows' `on_render()` to collect renderable objects
//! 4. Render the shadow map, then the frame using batched pipelines
//! 5. Present frame
//! 6. Update the camera and the flows (via `on_update`)
//! 7. Perform picking if mouse clicked
//!
//! Futures returned as [`Out::FutEvent`] never block a frame. On native targets they
//! are parked on a local task set that is polled once per frame; on WASM they are
//! spawned on the browser's microtask queue.

use std::{collections::HashSet, fmt::Debug, iter, pin::Pin, sync::Arc};

#[cfg(feature = "integration-tests")]
use anyhow::Context as _;

use instant::{Duration, Instant};

#[cfg(feature = "integration-tests")]
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::{Context, InitContext, MouseButtonState},
    data_structures::{model::DrawModel, texture::Texture},
    pick::draw_to_pick_buffer,
    render::{Batches, Instanced},
};

pub use crate::render::Render;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

type BoxedFlows<S, E> = Vec<Box<dyn GraphicsFlow<S, E>>>;

///
/// This is the Output Type for every lifecycle hook where the user can pass async events that are
/// handled according to the platform you're running on.
///
/// `Out::FutEvent` can be used to resolve a future of an Event that is put in the Event Queue after
/// being resolved. The caller is responsible for handling the event later on and it will have no
/// side effects unless handled.
///
/// `Out::FutFn` can be used to directly modify the state and the mutation is handled internally with
/// no further action required by the callee.
///
/// `Out::Configure` can be used to modify the Context during runtime for instance to change
/// the clear colour or the lighting.
///
/// `Empty` is the default output used when no eventing/futures need to be handled.
///
pub enum Out<S, E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    FutFn(Vec<Box<dyn Future<Output = Box<dyn FnOnce(&mut S)>>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl<S, E> Default for Out<S, E> {
    fn default() -> Self {
        Self::Empty
    }
}

#[cfg(feature = "integration-tests")]
pub enum ImageTestResult {
    Passed,
    Waiting,
    Failed,
}

/// Trait for implementing a renderable part of the application.
///
/// A `GraphicsFlow` manages a self-contained portion of the application:
/// rendering, input handling, animations, and state updates. The runner
/// coordinates multiple flows, passes events to them, and composes their renders.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created; configure context (camera, clear color, etc.)
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_update()` is called every frame
/// 4. `on_click()` is called when an object with this flow's ID is clicked
/// 5. `on_custom_events()` is called for custom application events
/// 6. `on_render()` is called each frame and specifies how to render `self`
///
pub trait GraphicsFlow<S, E> {
    /// Initialize the flow and configure the context.
    ///
    /// This is the place to modify the Context and configure things such as the
    /// background colour, the lighting or the camera start position.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<S, E>;

    /// Handle a click on an object rendered by this flow.
    ///
    /// `id` is the ID that correlates to a specific quad set via `on_render`.
    /// Use a unique, non-zero u32 id for each element that should be selectable.
    /// See [`crate::pick::draw_to_pick_buffer`] for details.
    fn on_click(&mut self, ctx: &Context, state: &mut S, id: u32) -> Out<S, E>;

    /// Update state every frame.
    ///
    /// Called every frame with the elapsed time `dt`. Use for animations
    /// and other per-frame logic.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out<S, E>;

    /// Handle raw device events (mouse motion, hardware input).
    fn on_device_events(&mut self, ctx: &Context, state: &mut S, event: &DeviceEvent) -> Out<S, E>;

    /// Handle window events (keyboard, mouse, window resizing, etc.).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<S, E>;

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E>;

    /// Return renderable objects for this flow.
    ///
    /// Called each frame. Collect your objects into a [`Render`] and return it.
    /// The runner batches all flows' renders per pipeline.
    fn on_render(&self) -> Render<'_>;

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut S,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error>;
}

// Dummy impl to make wasm work
impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`. This allows lazy initialization and resource loading.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// Application state bundle: GPU context, app state, and surface status.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let ctx = &mut self.ctx;
        ctx.config.width = width;
        ctx.config.height = height;
        ctx.projection.resize(width, height);
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.depth_texture = Texture::create_depth_texture(&ctx.device, [width, height], "depth_texture");
        self.is_surface_configured = true;
    }

    fn draw_shadows(&self, encoder: &mut wgpu::CommandEncoder, batches: &Batches) {
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.ctx.light.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        shadow_pass.set_pipeline(&self.ctx.pipelines.shadow);
        for instanced in batches.opaque.iter().chain(&batches.glass) {
            if instanced.amount == 0 {
                continue;
            }
            shadow_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            shadow_pass.draw_mesh_shadow(
                instanced.mesh,
                0..instanced.amount as u32,
                &self.ctx.light.shadow_bind_group,
            );
        }
    }

    fn draw_meshes<'p>(
        &'p self,
        render_pass: &mut wgpu::RenderPass<'p>,
        pipeline: &'p wgpu::RenderPipeline,
        batch: &[Instanced<'p>],
    ) {
        render_pass.set_pipeline(pipeline);
        for instanced in batch {
            if instanced.amount == 0 || instanced.instance.size() == 0 {
                log::warn!("Skipping mesh {} without instances", instanced.mesh.name);
                continue;
            }
            render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            render_pass.draw_mesh_instanced(
                instanced.mesh,
                instanced.material,
                0..instanced.amount as u32,
                &self.ctx.camera.bind_group,
                &self.ctx.light.bind_group,
            );
        }
    }

    /// Shadow map first, then opaque surfaces, glass and the GUI on top.
    fn render<Event>(
        &mut self,
        graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>],
        #[cfg(feature = "integration-tests")] async_runtime: &Runtime,
        #[cfg(feature = "integration-tests")] proxy: &EventLoopProxy<FlowEvent<State, Event>>,
    ) -> Result<(), wgpu::SurfaceError> {
        // keeps the redraw loop going
        self.ctx.window.request_redraw();
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        // integration tests render into a padded offscreen target they can read back
        #[cfg(feature = "integration-tests")]
        let (target, depth) = {
            let extent = crate::pick::padded_extent(&self.ctx.config);
            let usage = wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT;
            (
                crate::pick::offscreen_texture(&self.ctx.device, extent, self.ctx.config.format, usage, "Capture target"),
                crate::pick::offscreen_texture(&self.ctx.device, extent, Texture::DEPTH_FORMAT, usage, "Capture depth"),
            )
        };
        #[cfg(feature = "integration-tests")]
        let (view, capture_depth) = (
            target.create_view(&wgpu::TextureViewDescriptor::default()),
            depth.create_view(&wgpu::TextureViewDescriptor::default()),
        );
        #[cfg(feature = "integration-tests")]
        let depth_view = &capture_depth;
        #[cfg(not(feature = "integration-tests"))]
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        #[cfg(not(feature = "integration-tests"))]
        let depth_view = &self.ctx.depth_texture.view;

        let mut batches = Batches::default();
        for flow in graphics_flows {
            flow.on_render().collect(&mut batches);
        }

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.draw_shadows(&mut encoder, &batches);
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.draw_meshes(&mut render_pass, &self.ctx.pipelines.surface, &batches.opaque);
            self.draw_meshes(&mut render_pass, &self.ctx.pipelines.glass, &batches.glass);

            render_pass.set_pipeline(&self.ctx.pipelines.gui);
            for quad in &batches.gui {
                render_pass.set_bind_group(0, quad.group, &[]);
                render_pass.set_vertex_buffer(0, quad.vertex.slice(..));
                render_pass.set_index_buffer(quad.index.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..quad.amount as u32, 0, 0..1);
            }
        }
        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        if let Err(e) = self.check_frame(graphics_flows, async_runtime, proxy, &target) {
            panic!("Frame check failed: {:#}", e);
        }

        output.present();
        Ok(())
    }

    /// Reads the offscreen frame back and lets every flow assert on it. Exits the
    /// event loop once all flows passed.
    #[cfg(feature = "integration-tests")]
    fn check_frame<Event>(
        &mut self,
        graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>],
        async_runtime: &Runtime,
        proxy: &EventLoopProxy<FlowEvent<State, Event>>,
        target: &wgpu::Texture,
    ) -> anyhow::Result<()> {
        let extent = crate::pick::padded_extent(&self.ctx.config);
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });
        let buffer = crate::pick::copy_to_buffer(&self.ctx.device, &mut encoder, target, extent, "Capture buffer");
        self.ctx.queue.submit(iter::once(encoder.finish()));
        async_runtime.block_on(crate::pick::map_read(&self.ctx.device, &buffer))?;

        let data = buffer.slice(..).get_mapped_range();
        let mut frame = image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(extent.width, extent.height, data)
            .context("the captured frame is smaller than its extent")?;
        let mut all_passed = true;
        for flow in graphics_flows {
            match flow.render_to_texture(&self.ctx, &mut self.state, &mut frame)? {
                ImageTestResult::Passed => (),
                ImageTestResult::Waiting => all_passed = false,
                ImageTestResult::Failed => anyhow::bail!("a flow rejected the rendered frame"),
            }
        }
        if all_passed {
            proxy
                .send_event(FlowEvent::Exit)
                .map_err(|_| anyhow::anyhow!("all flows passed but the event loop is gone"))?;
        }
        Ok(())
    }
}

pub struct App<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    /// Pending `Out::FutEvent` futures, advanced at the start of every frame.
    #[cfg(not(target_arch = "wasm32"))]
    pending: tokio::task::LocalSet,
    proxy: EventLoopProxy<FlowEvent<State, Event>>,
    state: Option<AppState<State>>,
    /// Filled once the constructors resolved.
    graphics_flows: BoxedFlows<State, Event>,
    /// Taken on the first `resumed`.
    constructors: Option<Vec<FlowConstructor<State, Event>>>,
    last_time: Instant,
}

pub(crate) enum FlowEvent<State: 'static, Event: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: BoxedFlows<State, Event>,
    },
    #[allow(dead_code)]
    Id((u32, HashSet<usize>)),
    #[allow(dead_code)]
    Mut(Box<dyn FnOnce(&mut State)>),
    Custom(Event),
    #[allow(dead_code)]
    Exit,
}

impl<State, Event> Debug for FlowEvent<State, Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { flows, .. } => f.debug_struct("Initialized").field("flows", flows).finish(),
            Self::Id(picked) => f.debug_tuple("Id").field(picked).finish(),
            Self::Mut(_) => f.write_str("Mut(|&mut State| -> {...})"),
            Self::Custom(_) => f.write_str("Custom(E)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

impl<State: 'static + Default, Event: 'static> App<State, Event> {
    fn new(event_loop: &EventLoop<FlowEvent<State, Event>>, constructors: Vec<FlowConstructor<State, Event>>) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            #[cfg(not(target_arch = "wasm32"))]
            pending: tokio::task::LocalSet::new(),
            proxy: event_loop.create_proxy(),
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
        })
    }

    /// Runs `hook` on every flow in order and handles what each returns.
    fn dispatch(&mut self, mut hook: impl FnMut(usize, &mut dyn GraphicsFlow<State, Event>, &mut Context, &mut State) -> Out<State, Event>) {
        let Some(app) = self.state.as_mut() else {
            return;
        };
        for (idx, flow) in self.graphics_flows.iter_mut().enumerate() {
            let out = hook(idx, flow.as_mut(), &mut app.ctx, &mut app.state);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                #[cfg(not(target_arch = "wasm32"))]
                &self.pending,
                &mut app.state,
                &mut app.ctx,
                self.proxy.clone(),
                out,
            );
        }
    }

    fn start(&mut self, mut app_state: AppState<State>, flows: BoxedFlows<State, Event>) {
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        self.graphics_flows = flows;
        self.state = Some(app_state);
        self.dispatch(|_, flow, ctx, state| flow.on_init(ctx, state));
        if let Some(app) = &self.state {
            app.ctx.window.request_redraw();
        }
    }

    fn click(&mut self, pick_id: u32, flow_ids: HashSet<usize>) {
        if flow_ids.len() > 1 {
            log::warn!("Multiple flows (indices {:?}) react to the render ID {}", flow_ids, pick_id);
        }
        self.dispatch(|idx, flow, ctx, state| {
            if flow_ids.contains(&idx) {
                flow.on_click(ctx, state, pick_id)
            } else {
                Out::Empty
            }
        });
    }

    /// Polls the pending futures once; finished ones are already queued as events.
    #[cfg(not(target_arch = "wasm32"))]
    fn poll_pending(&self) {
        self.async_runtime
            .block_on(self.pending.run_until(tokio::task::yield_now()));
    }

    fn redraw(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        self.poll_pending();
        let Some(app) = self.state.as_mut() else {
            return;
        };
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();

        match app.render(
            &self.graphics_flows,
            #[cfg(feature = "integration-tests")]
            &self.async_runtime,
            #[cfg(feature = "integration-tests")]
            &self.proxy,
        ) {
            Ok(()) => {
                let camera = &mut app.ctx.camera;
                camera.controller.update(&mut camera.camera, dt);
                app.ctx.write_camera();
                self.dispatch(|_, flow, ctx, state| flow.on_update(ctx, state, dt));
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = app.ctx.window.inner_size();
                app.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {}", e),
        }
    }
}

impl<State: 'static + Default, Event: 'static> ApplicationHandler<FlowEvent<State, Event>> for App<State, Event> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // resumed fires again on mobile and web after a suspend, the flows live on
        let Some(constructors) = self.constructors.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Cabinet Configurator");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = wgpu::web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            match canvas {
                Some(canvas) => window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into())),
                None => log::warn!("No element with id '{}', winit creates its own canvas", CANVAS_ID),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create the window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let init_future = async move {
            let app_state = AppState::new(window).await?;
            // InitContext only clones the Arc handles of device and queue
            let flows = futures::future::join_all(
                constructors
                    .into_iter()
                    .map(|constructor| constructor((&app_state.ctx).into())),
            )
            .await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        match self.async_runtime.block_on(init_future) {
            Ok((app_state, flows)) => self.start(app_state, flows),
            Err(e) => {
                log::error!("App initialization failed. Cannot create the main context: {:#}", e);
                event_loop.exit();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((state, flows)) => {
                        if proxy.send_event(FlowEvent::Initialized { state, flows }).is_err() {
                            log::error!("The event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("App initialization failed. Cannot create the main context: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<State, Event>) {
        match event {
            FlowEvent::Initialized { state, flows } => self.start(state, flows),
            FlowEvent::Id((pick_id, flow_ids)) => self.click(pick_id, flow_ids),
            FlowEvent::Custom(custom_event) => {
                let Some(app) = self.state.as_mut() else {
                    return;
                };
                // a flow consumes the event by returning None
                let unconsumed = self
                    .graphics_flows
                    .iter_mut()
                    .try_fold(custom_event, |event, flow| flow.on_custom_events(&app.ctx, &mut app.state, event));
                if unconsumed.is_some() {
                    log::warn!("Custom event was not consumed by any flow");
                }
            }
            FlowEvent::Mut(mutation) => {
                if let Some(app) = self.state.as_mut() {
                    mutation(&mut app.state);
                }
            }
            FlowEvent::Exit => event_loop.exit(),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(app) = self.state.as_mut() else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            let controller = &mut app.ctx.camera.controller;
            match app.ctx.mouse.pressed {
                MouseButtonState::Right => controller.handle_mouse(dx, dy),
                MouseButtonState::Middle => controller.handle_pan(dx, dy),
                MouseButtonState::Left | MouseButtonState::None => (),
            }
        }
        self.dispatch(|_, flow, ctx, state| flow.on_device_events(ctx, state, &event));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: winit::window::WindowId, event: WindowEvent) {
        let Some(app) = self.state.as_mut() else {
            return;
        };
        app.ctx.camera.controller.handle_window_events(&event);
        if let WindowEvent::CursorMoved { position, .. } = event {
            app.ctx.mouse.coords = position;
        }

        self.dispatch(|_, flow, ctx, state| flow.on_window_events(ctx, state, &event));

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(app) = self.state.as_mut() {
                    app.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => self.mouse_input(button, button_state.is_pressed()),
            _ => {}
        }
    }
}

impl<State: 'static + Default, Event: 'static> App<State, Event> {
    fn mouse_input(&mut self, button: MouseButton, pressed: bool) {
        let Some(app) = self.state.as_mut() else {
            return;
        };
        app.ctx.mouse.pressed = match (button, pressed) {
            (MouseButton::Left, true) => MouseButtonState::Left,
            (MouseButton::Right, true) => MouseButtonState::Right,
            (MouseButton::Middle, true) => MouseButtonState::Middle,
            (_, false) => MouseButtonState::None,
            _ => return,
        };
        if app.ctx.mouse.pressed != MouseButtonState::Left {
            return;
        }
        let picked = draw_to_pick_buffer::<State, Event>(
            #[cfg(not(target_arch = "wasm32"))]
            &self.async_runtime,
            &self.graphics_flows,
            &app.ctx,
            #[cfg(target_arch = "wasm32")]
            self.proxy.clone(),
        );
        if let Some((pick_id, flow_ids)) = picked {
            self.click(pick_id, flow_ids);
        }
    }
}

fn handle_flow_output<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    #[cfg(not(target_arch = "wasm32"))] pending: &tokio::task::LocalSet,
    state: &mut State,
    ctx: &mut Context,
    proxy: EventLoopProxy<FlowEvent<State, Event>>,
    out: Out<State, Event>,
) {
    match out {
        // each event goes through the winit queue to every flow as soon as it resolved
        Out::FutEvent(futures) => {
            for future in futures {
                let proxy = proxy.clone();
                let deliver = async move { forward(&proxy, vec![Pin::from(future).await], FlowEvent::Custom) };
                #[cfg(not(target_arch = "wasm32"))]
                pending.spawn_local(deliver);
                #[cfg(target_arch = "wasm32")]
                wasm_bindgen_futures::spawn_local(deliver);
            }
        }
        // mutations apply right away where we can block, otherwise they come back as events
        Out::FutFn(futures) => {
            let all = futures::future::join_all(futures.into_iter().map(Pin::from));
            #[cfg(not(target_arch = "wasm32"))]
            for mutation in async_runtime.block_on(all) {
                mutation(state);
            }
            #[cfg(target_arch = "wasm32")]
            {
                let _ = state;
                wasm_bindgen_futures::spawn_local(async move { forward(&proxy, all.await, FlowEvent::Mut) });
            }
        }
        Out::Configure(configure) => configure(ctx),
        Out::Empty => (),
    }
}

fn forward<State, Event, T>(proxy: &EventLoopProxy<FlowEvent<State, Event>>, items: Vec<T>, wrap: impl Fn(T) -> FlowEvent<State, Event>) {
    for item in items {
        if let Err(e) = proxy.send_event(wrap(item)) {
            log::error!("Event loop closed before all flow results were delivered: {}", e);
            break;
        }
    }
}

pub fn run<State: 'static + Default, Event: 'static>(constructors: Vec<FlowConstructor<State, Event>>) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    if let Err(e) = env_logger::try_init() {
        eprintln!("Could not initialize logger: {}", e);
    }

    #[cfg(target_arch = "wasm32")]
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Could not initialize logger: {}", e).into());
    }

    // the integration tests drive the event loop off the main thread
    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;
        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(not(feature = "integration-tests"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, constructors)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
