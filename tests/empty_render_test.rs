#[cfg(feature = "integration-tests")]
#[macro_use]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour() {
    use cabinet_configurator::{
        context::{Context, InitContext},
        flow::ImageTestResult,
        render::Render,
    };
    use wgpu::Color;

    use crate::common::test_utils::{FrameCounter, ImageFlow, rgba8};

    struct Empty;

    impl ImageFlow for Empty {
        fn test_setup(&mut self, ctx: &mut Context) {
            ctx.clear_colour = Color::WHITE;
        }

        fn render_test(&self) -> Render<'_> {
            Render::None
        }

        fn validate_render_output(
            &self,
            _: &Context,
            frames: &FrameCounter,
            texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
        ) -> Result<ImageTestResult, anyhow::Error> {
            if frames.frame() == 0 {
                return Ok(ImageTestResult::Waiting);
            }
            let desired_pixel = rgba8(Color::WHITE);
            for pixel in texture.pixels() {
                assert_eq!(*pixel, desired_pixel);
            }
            Ok(ImageTestResult::Passed)
        }
    }

    golden_image_test!(|_: InitContext| Empty);
}
