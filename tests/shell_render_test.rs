#[cfg(feature = "integration-tests")]
#[macro_use]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_draw_gui_quads_over_the_clear_colour() {
    use cabinet_configurator::{
        configurator::shell::Rect,
        context::{Context, InitContext},
        data_structures::texture::Texture,
        flow::ImageTestResult,
        pipelines::gui::{Vertex, mk_bind_group},
        render::{Flat, Render},
    };
    use wgpu::{Color, util::DeviceExt};

    use crate::common::test_utils::{FrameCounter, ImageFlow, rgba8, window_to_image};

    const RECT: Rect = Rect {
        x: 10.0,
        y: 10.0,
        width: 100.0,
        height: 60.0,
    };

    struct Quad {
        init: InitContext,
        vertex: Option<wgpu::Buffer>,
        index: Option<wgpu::Buffer>,
        group: Option<wgpu::BindGroup>,
    }

    impl ImageFlow for Quad {
        fn test_setup(&mut self, ctx: &mut Context) {
            ctx.clear_colour = Color::WHITE;
            let (width, height) = (ctx.config.width as f32, ctx.config.height as f32);
            let vertices = Vertex::quad(RECT.to_ndc(width, height), 0.5);
            self.vertex = Some(self.init.device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("test quad vertices"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            ));
            self.index = Some(self.init.device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("test quad indices"),
                    contents: bytemuck::cast_slice(&Vertex::QUAD_INDICES),
                    usage: wgpu::BufferUsages::INDEX,
                },
            ));
            let black = Texture::create_solid([0, 0, 0, 255], "black", &ctx.device, &ctx.queue);
            self.group = Some(mk_bind_group(
                &ctx.device,
                &black,
                &ctx.pipelines.gui_texture_layout,
            ));
        }

        fn render_test(&self) -> Render<'_> {
            match (&self.vertex, &self.index, &self.group) {
                (Some(vertex), Some(index), Some(group)) => Render::GUI(Flat {
                    vertex,
                    index,
                    group,
                    amount: Vertex::QUAD_INDICES.len(),
                    id: 1,
                }),
                _ => Render::None,
            }
        }

        fn validate_render_output(
            &self,
            ctx: &Context,
            frames: &FrameCounter,
            texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
        ) -> Result<ImageTestResult, anyhow::Error> {
            if frames.frame() == 0 {
                return Ok(ImageTestResult::Waiting);
            }
            let (width, height) = (ctx.config.width, ctx.config.height);
            let (x, y) = window_to_image(
                RECT.x + RECT.width / 2.0,
                RECT.y + RECT.height / 2.0,
                width,
                height,
            );
            assert_eq!(*texture.get_pixel(x, y), rgba8(Color::BLACK));
            let (x, y) = window_to_image(RECT.x + RECT.width + 20.0, RECT.y, width, height);
            assert_eq!(*texture.get_pixel(x, y), rgba8(Color::WHITE));
            Ok(ImageTestResult::Passed)
        }
    }

    golden_image_test!(|init: InitContext| Quad {
        init,
        vertex: None,
        index: None,
        group: None,
    });
}
