//! The shell flow: draws the controls laid out by [`shell::layout`] as textured
//! quads and turns picked quads into [`shell::UiAction`]s.

use image::{DynamicImage, Rgba, RgbaImage};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{DeviceEvent, WindowEvent};

#[cfg(feature = "integration-tests")]
use crate::flow::ImageTestResult;
use crate::{
    config::ConfiguratorConfig,
    configurator::{
        ConfiguratorEvent, catalog,
        shell::{self, Banner, Rect, ShellLayout},
        state::Session,
    },
    context::{Context, InitContext},
    data_structures::texture::{SamplerSettings, Texture},
    flow::{GraphicsFlow, Out},
    pipelines::gui::{self, Vertex},
    render::{Flat, Render},
    resources::{
        texture::{load_texture, load_thumbnail},
        with_timeout,
    },
};

const ICON_SIZE: u32 = 64;
const THUMBNAIL_SIZE: u32 = 128;

const INK: Rgba<u8> = Rgba([51, 51, 51, 255]);
const BUTTON: Rgba<u8> = Rgba([255, 255, 255, 230]);
const PANEL: Rgba<u8> = Rgba([255, 255, 255, 200]);
const ACCENT: Rgba<u8> = Rgba([47, 111, 223, 255]);
const PLACEHOLDER: Rgba<u8> = Rgba([204, 204, 204, 255]);
const LOADING: Rgba<u8> = Rgba([74, 111, 165, 230]);
const FAILED: Rgba<u8> = Rgba([192, 57, 43, 230]);
const WARNING: Rgba<u8> = Rgba([230, 162, 60, 230]);

// smaller is closer, all of them in front of the cabinet
const Z_PANEL: f32 = 0.05;
const Z_RING: f32 = 0.04;
const Z_CONTROL: f32 = 0.03;
const Z_BANNER: f32 = 0.02;

fn border(x: u32, y: u32, size: u32, width: u32) -> bool {
    x < width || y < width || x >= size - width || y >= size - width
}

/// A door leaf with a handle on its right edge.
fn door_icon(size: u32) -> RgbaImage {
    let s = size as f32;
    RgbaImage::from_fn(size, size, |x, y| {
        let (fx, fy) = (x as f32 / s, y as f32 / s);
        let frame = border(x, y, size, size / 16 + 1);
        let leaf = (0.25..0.75).contains(&fx) && (0.15..0.85).contains(&fy) && border(
            x - (0.25 * s) as u32,
            y - (0.15 * s) as u32,
            (0.5 * s) as u32,
            size / 32 + 1,
        );
        let handle = (0.62..0.68).contains(&fx) && (0.42..0.58).contains(&fy);
        if frame || leaf || handle { INK } else { BUTTON }
    })
}

/// Four tiles standing for the swatch grid.
fn panel_icon(size: u32) -> RgbaImage {
    let cell = size / 2;
    let gap = size / 10;
    RgbaImage::from_fn(size, size, |x, y| {
        let (cx, cy) = (x % cell, y % cell);
        let tile = cx >= gap && cx < cell - gap && cy >= gap && cy < cell - gap;
        if tile { INK } else { BUTTON }
    })
}

/// A filled strip with a darker outline.
fn banner_image(colour: Rgba<u8>) -> RgbaImage {
    let (width, height) = (ICON_SIZE * 4, ICON_SIZE);
    let Rgba([r, g, b, a]) = colour;
    let outline = Rgba([r / 2, g / 2, b / 2, a]);
    RgbaImage::from_fn(width, height, |x, y| {
        if x < 2 || y < 2 || x >= width - 2 || y >= height - 2 {
            outline
        } else {
            colour
        }
    })
}

fn solid(colour: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(1, 1, colour)
}

/// Bind groups of the procedurally drawn shell elements.
struct Icons {
    door: wgpu::BindGroup,
    panel_button: wgpu::BindGroup,
    panel: wgpu::BindGroup,
    ring: wgpu::BindGroup,
    swatch_placeholder: wgpu::BindGroup,
    loading: wgpu::BindGroup,
    failed: wgpu::BindGroup,
    warning: wgpu::BindGroup,
}

impl Icons {
    fn new(ctx: &Context) -> anyhow::Result<Self> {
        let sampler = SamplerSettings {
            address_mode: wgpu::AddressMode::ClampToEdge,
            anisotropy: 1,
        };
        let upload = |image: RgbaImage, label: &str| -> anyhow::Result<wgpu::BindGroup> {
            let texture = Texture::from_image(
                &ctx.device,
                &ctx.queue,
                &DynamicImage::ImageRgba8(image),
                Some(label),
                sampler,
            )?;
            Ok(gui::mk_bind_group(
                &ctx.device,
                &texture,
                &ctx.pipelines.gui_texture_layout,
            ))
        };
        Ok(Self {
            door: upload(door_icon(ICON_SIZE), "door icon")?,
            panel_button: upload(panel_icon(ICON_SIZE), "panel icon")?,
            panel: upload(solid(PANEL), "panel")?,
            ring: upload(solid(ACCENT), "selection ring")?,
            swatch_placeholder: upload(solid(PLACEHOLDER), "swatch placeholder")?,
            loading: upload(banner_image(LOADING), "loading banner")?,
            failed: upload(banner_image(FAILED), "failed banner")?,
            warning: upload(banner_image(WARNING), "texture banner")?,
        })
    }

    fn banner(&self, banner: Banner) -> &wgpu::BindGroup {
        match banner {
            Banner::Loading => &self.loading,
            Banner::SceneFailed => &self.failed,
            Banner::TextureFailed => &self.warning,
        }
    }
}

struct Quad {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    group: wgpu::BindGroup,
    id: u32,
}

impl Quad {
    fn new(device: &wgpu::Device, corners: [[f32; 2]; 4], z: f32, group: wgpu::BindGroup, id: u32) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shell Vertex Buffer"),
            contents: bytemuck::cast_slice(&Vertex::quad(corners, z)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shell Index Buffer"),
            contents: bytemuck::cast_slice(&Vertex::QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            group,
            id,
        }
    }
}

pub struct ShellFlow {
    config: ConfiguratorConfig,
    init: InitContext,
    icons: Option<Icons>,
    thumbnails: Vec<Option<wgpu::BindGroup>>,
    logo: Option<wgpu::BindGroup>,
    layout: Option<ShellLayout>,
    size: (u32, u32),
    /// A texture arrived since the quads were built.
    dirty: bool,
    quads: Vec<Quad>,
}

impl ShellFlow {
    pub fn new(init: InitContext, config: ConfiguratorConfig) -> Self {
        Self {
            config,
            init,
            icons: None,
            thumbnails: vec![None; catalog::list().len()],
            logo: None,
            layout: None,
            size: (0, 0),
            dirty: true,
            quads: Vec::new(),
        }
    }

    /// Thumbnails come from the same files the binder loads for the cabinet.
    fn load_thumbnails(&self) -> Vec<Box<dyn Future<Output = ConfiguratorEvent>>> {
        catalog::list()
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let path = self.config.texture_path(record.id);
                let timeout = self.config.load_timeout;
                let InitContext { device, queue, .. } = self.init.clone();
                let load: Box<dyn Future<Output = ConfiguratorEvent>> = Box::new(async move {
                    let result = with_timeout(
                        &path,
                        timeout,
                        load_thumbnail(&path, THUMBNAIL_SIZE, &device, &queue),
                    )
                    .await;
                    ConfiguratorEvent::SwatchLoaded { index, result }
                });
                load
            })
            .collect()
    }

    fn load_logo(&self) -> Box<dyn Future<Output = ConfiguratorEvent>> {
        let path = self.config.logo_path.clone();
        let timeout = self.config.load_timeout;
        let InitContext { device, queue, .. } = self.init.clone();
        let sampler = SamplerSettings {
            address_mode: wgpu::AddressMode::ClampToEdge,
            anisotropy: 1,
        };
        Box::new(async move {
            let result =
                with_timeout(&path, timeout, load_texture(&path, &device, &queue, sampler)).await;
            ConfiguratorEvent::LogoLoaded(result)
        })
    }

    fn rebuild(&mut self, device: &wgpu::Device, layout: &ShellLayout) {
        let Some(icons) = &self.icons else {
            return;
        };
        let (width, height) = (self.size.0 as f32, self.size.1 as f32);
        let mut quads = Vec::new();
        let mut push = |rect: Rect, z: f32, group: &wgpu::BindGroup, id: u32| {
            quads.push(Quad::new(device, rect.to_ndc(width, height), z, group.clone(), id));
        };

        // back to front, the quads blend over each other
        if let Some(panel) = layout.panel {
            push(panel, Z_PANEL, &icons.panel, 0);
        }
        if let Some(ring) = layout.ring {
            push(ring, Z_RING, &icons.ring, 0);
        }
        for (index, swatch) in layout.swatches.iter().enumerate() {
            let group = self
                .thumbnails
                .get(index)
                .and_then(Option::as_ref)
                .unwrap_or(&icons.swatch_placeholder);
            push(swatch.thumbnail, Z_CONTROL, group, shell::SWATCH_BASE_ID + index as u32);
        }
        push(layout.door_button, Z_CONTROL, &icons.door, shell::DOOR_BUTTON_ID);
        push(layout.panel_button, Z_CONTROL, &icons.panel_button, shell::PANEL_BUTTON_ID);
        if let Some(logo) = &self.logo {
            push(layout.logo, Z_CONTROL, logo, shell::LOGO_ID);
        }
        if let Some((banner, rect)) = layout.banner {
            push(rect, Z_BANNER, icons.banner(banner), shell::BANNER_ID);
        }
        self.quads = quads;
    }
}

impl GraphicsFlow<Session, ConfiguratorEvent> for ShellFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut Session) -> Out<Session, ConfiguratorEvent> {
        match Icons::new(ctx) {
            Ok(icons) => self.icons = Some(icons),
            Err(e) => log::error!("Cannot create the shell icons, the controls stay hidden: {:#}", e),
        }
        let mut loads = self.load_thumbnails();
        loads.push(self.load_logo());
        Out::FutEvent(loads)
    }

    fn on_click(&mut self, _: &Context, state: &mut Session, id: u32) -> Out<Session, ConfiguratorEvent> {
        let Some(action) = shell::action_for(id) else {
            return Out::Empty;
        };
        log::debug!("Clicked {:?}", action);
        match shell::apply(action, state) {
            Some(event) => Out::FutEvent(vec![Box::new(async move { event })]),
            None => Out::Empty,
        }
    }

    fn on_update(&mut self, ctx: &Context, state: &mut Session, _: Duration) -> Out<Session, ConfiguratorEvent> {
        let size = (ctx.config.width, ctx.config.height);
        let layout = shell::layout(size.0 as f32, size.1 as f32, state);
        if self.dirty || size != self.size || self.layout.as_ref() != Some(&layout) {
            self.size = size;
            self.rebuild(&ctx.device, &layout);
            self.layout = Some(layout);
            self.dirty = false;
        }
        Out::Empty
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
        _: &mut Session,
        event: ConfiguratorEvent,
    ) -> Option<ConfiguratorEvent> {
        let bind = |texture: Texture| {
            gui::mk_bind_group(&ctx.device, &texture, &ctx.pipelines.gui_texture_layout)
        };
        match event {
            ConfiguratorEvent::SwatchLoaded { index, result } => {
                match result {
                    Ok(texture) => {
                        if let Some(slot) = self.thumbnails.get_mut(index) {
                            *slot = Some(bind(texture));
                            self.dirty = true;
                        }
                    }
                    Err(e) => log::warn!("Swatch {} keeps its placeholder: {:#}", index, e),
                }
                None
            }
            ConfiguratorEvent::LogoLoaded(result) => {
                match result {
                    Ok(texture) => {
                        self.logo = Some(bind(texture));
                        self.dirty = true;
                    }
                    Err(e) => log::warn!("No logo: {:#}", e),
                }
                None
            }
            other => Some(other),
        }
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(
            self.quads
                .iter()
                .map(|quad| {
                    Render::GUI(Flat {
                        vertex: &quad.vertex,
                        index: &quad.index,
                        group: &quad.group,
                        amount: Vertex::QUAD_INDICES.len(),
                        id: quad.id,
                    })
                })
                .collect(),
        )
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_icon_has_a_handle_and_a_light_face() {
        let icon = door_icon(ICON_SIZE);
        assert_eq!(*icon.get_pixel(41, 32), INK);
        assert_eq!(*icon.get_pixel(32, 32), BUTTON);
        assert_eq!(*icon.get_pixel(0, 0), INK);
    }

    #[test]
    fn panel_icon_shows_four_tiles() {
        let icon = panel_icon(ICON_SIZE);
        for (x, y) in [(16, 16), (48, 16), (16, 48), (48, 48)] {
            assert_eq!(*icon.get_pixel(x, y), INK);
        }
        assert_eq!(*icon.get_pixel(32, 32), BUTTON);
    }

    #[test]
    fn banner_outline_is_darker() {
        let banner = banner_image(FAILED);
        assert_eq!(*banner.get_pixel(0, 0), Rgba([96, 28, 21, 230]));
        assert_eq!(*banner.get_pixel(100, 30), FAILED);
    }
}
