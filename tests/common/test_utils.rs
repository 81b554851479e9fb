#[cfg(feature = "integration-tests")]
use cabinet_configurator::{
    context::Context,
    flow::{GraphicsFlow, ImageTestResult, Out},
    render::Render,
};

/// Counts the lifecycle hooks and records what the flows did, in order.
#[derive(Default)]
pub(crate) struct Lifecycle {
    pub inits: u32,
    pub frames: u32,
    pub clicks: u32,
    pub journal: Vec<String>,
}

impl Lifecycle {
    pub fn note(&mut self, entry: impl Into<String>) {
        self.journal.push(entry.into());
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.journal.iter().position(|noted| noted == entry)
    }
}

#[derive(Default)]
pub(crate) struct FrameCounter(pub(crate) u32);

impl FrameCounter {
    pub(crate) fn frame(&self) -> u32 {
        self.0
    }

    pub(crate) fn progress(&mut self) {
        self.0 += 1;
    }
}

/// The colour a clear colour ends up as in an 8 bit texture.
pub(crate) fn rgba8(colour: wgpu::Color) -> image::Rgba<u8> {
    let f_to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    image::Rgba([
        f_to_u8(colour.r),
        f_to_u8(colour.g),
        f_to_u8(colour.b),
        f_to_u8(colour.a),
    ])
}

/// Pixel of the offscreen image covering `(x, y)` of the window.
///
/// The offscreen target is padded to the copy alignment and the viewport spans all of it.
pub(crate) fn window_to_image(x: f32, y: f32, width: u32, height: u32) -> (u32, u32) {
    let padded = |size: u32| size.max(1).next_multiple_of(256) as f32;
    (
        (x * padded(width) / width as f32) as u32,
        (y * padded(height) / height as f32) as u32,
    )
}

/// A render under test: sets the context up, draws and checks the offscreen image.
#[cfg(feature = "integration-tests")]
pub(crate) trait ImageFlow {
    fn test_setup(&mut self, ctx: &mut Context);
    fn render_test(&self) -> Render<'_>;
    fn validate_render_output(
        &self,
        ctx: &Context,
        frames: &FrameCounter,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error>;
}

#[cfg(feature = "integration-tests")]
pub(crate) struct Flow(pub(crate) Box<dyn ImageFlow>);

#[cfg(feature = "integration-tests")]
impl GraphicsFlow<FrameCounter, ()> for Flow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut FrameCounter) -> Out<FrameCounter, ()> {
        self.0.test_setup(ctx);
        Out::Empty
    }

    fn on_click(&mut self, _: &Context, _: &mut FrameCounter, _: u32) -> Out<FrameCounter, ()> {
        Out::Empty
    }

    fn on_update(
        &mut self,
        _: &Context,
        frames: &mut FrameCounter,
        _: std::time::Duration,
    ) -> Out<FrameCounter, ()> {
        frames.progress();
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &cabinet_configurator::DeviceEvent,
    ) -> Out<FrameCounter, ()> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &cabinet_configurator::WindowEvent,
    ) -> Out<FrameCounter, ()> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut FrameCounter, event: ()) -> Option<()> {
        Some(event)
    }

    fn on_render(&self) -> Render<'_> {
        self.0.render_test()
    }

    fn render_to_texture(
        &self,
        ctx: &Context,
        frames: &mut FrameCounter,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        self.0.validate_render_output(ctx, frames, texture)
    }
}

/// Runs the event loop with a single [`ImageFlow`] built from the [`InitContext`]
/// until its validation passes.
///
/// [`InitContext`]: cabinet_configurator::context::InitContext
#[macro_export]
macro_rules! golden_image_test {
    ($build:expr) => {{
        use crate::common::test_utils::{Flow, FrameCounter, ImageFlow};
        use cabinet_configurator::context::InitContext;
        use cabinet_configurator::flow::{FlowConstructor, GraphicsFlow};
        let constructor: FlowConstructor<FrameCounter, ()> = Box::new(|init: InitContext| {
            Box::pin(async move {
                let image_flow: Box<dyn ImageFlow> = Box::new(($build)(init));
                let g_flow: Box<dyn GraphicsFlow<FrameCounter, ()>> = Box::new(Flow(image_flow));
                g_flow
            })
        });

        cabinet_configurator::flow::run(vec![constructor])
            .expect("Failed to run flow for integration test.");
    }};
}
