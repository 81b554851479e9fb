//! Object picking and selection.
//!
//! This module implements GPU-based picking: the pickable objects are rendered with
//! unique IDs to an offscreen texture, then the pixel under the mouse cursor is read
//! back to determine which object was clicked.
//!
//! The picking pipeline works as follows:
//! 1. Render all GUI quads to an offscreen `R32Uint` texture, writing their ID per fragment
//! 2. Read the pixel at the mouse cursor position (scaled to the padded texture size)
//! 3. Map the pick ID back to the flows that own the object (determined by the render tree)
//!
//! Only those flows are invoked that were responsible for the selected object. ID 0
//! is the cleared background and never maps to a flow.
//!
//! The offscreen helpers are shared with the frame capture of the integration tests.

use std::{
    collections::{HashMap, HashSet},
    iter,
};

use anyhow::Context as _;

use crate::{
    context::Context,
    flow::GraphicsFlow,
    pipelines::pick_gui::PICK_DEPTH_FORMAT,
    render::Flat,
    resources::pick::load_pick_bind_group,
};

#[cfg(target_arch = "wasm32")]
use crate::flow::FlowEvent;

const BYTES_PER_TEXEL: u32 = 4;

/// Texture copies require rows aligned to 256, offscreen targets are padded accordingly.
pub(crate) fn padded(size: u32) -> u32 {
    size.max(1).next_multiple_of(256)
}

pub(crate) fn padded_extent(config: &wgpu::SurfaceConfiguration) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: padded(config.width),
        height: padded(config.height),
        depth_or_array_layers: 1,
    }
}

pub(crate) fn offscreen_texture(
    device: &wgpu::Device,
    extent: wgpu::Extent3d,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    label: &str,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

/// Records a copy of a 4 byte per texel `texture` into a new mappable buffer.
pub(crate) fn copy_to_buffer(
    device: &wgpu::Device,
    encoder: &mut wgpu::CommandEncoder,
    texture: &wgpu::Texture,
    extent: wgpu::Extent3d,
    label: &str,
) -> wgpu::Buffer {
    let bytes_per_row = BYTES_PER_TEXEL * extent.width;
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: wgpu::BufferAddress::from(bytes_per_row) * wgpu::BufferAddress::from(extent.height),
        // read back on the cpu
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(extent.height),
            },
        },
        extent,
    );
    buffer
}

/// Maps `buffer` for reading.
///
/// The mapping has to be requested before the device is polled, otherwise the
/// future never resolves.
pub(crate) async fn map_read(device: &wgpu::Device, buffer: &wgpu::Buffer) -> anyhow::Result<()> {
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
        // the receiver only goes away together with this future
        let _ = tx.send(result);
    });
    #[cfg(target_arch = "wasm32")]
    let polled = device.poll(wgpu::PollType::Poll);
    #[cfg(not(target_arch = "wasm32"))]
    let polled = device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    });
    polled?;
    rx.receive()
        .await
        .context("the map callback was dropped before it ran")??;
    Ok(())
}

/// Byte offset of the texel under `cursor`, or `None` outside the texture.
fn texel_offset(cursor: (f64, f64), extent: wgpu::Extent3d) -> Option<usize> {
    let (x, y) = cursor;
    if x < 0.0 || y < 0.0 || x >= f64::from(extent.width) || y >= f64::from(extent.height) {
        return None;
    }
    Some((y as usize * extent.width as usize + x as usize) * BYTES_PER_TEXEL as usize)
}

/// Draws every pickable quad with its ID and records which flows own each ID.
fn encode_pick_pass<State, Event>(
    ctx: &Context,
    flows: &[Box<dyn GraphicsFlow<State, Event>>],
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::Texture,
    depth: &wgpu::Texture,
) -> HashMap<u32, HashSet<usize>> {
    let mut owners: HashMap<u32, HashSet<usize>> = HashMap::new();
    let mut flats: Vec<Flat> = Vec::new();
    for (idx, flow) in flows.iter().enumerate() {
        let render = flow.on_render();
        render.map_ids(idx, &mut owners);
        render.set_pick_pipelines(&mut flats);
    }

    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Pick Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &target.create_view(&wgpu::TextureViewDescriptor::default()),
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &depth.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    render_pass.set_pipeline(&ctx.pipelines.gui_pick);
    for flat in flats {
        let Ok(amount) = u32::try_from(flat.amount) else {
            log::error!("Quad {} has more indices than a draw call supports", flat.id);
            continue;
        };
        let pick_group = load_pick_bind_group(flat.id, &ctx.device, &ctx.pipelines.pick_id_layout);
        render_pass.set_bind_group(0, &pick_group, &[]);
        render_pass.set_vertex_buffer(0, flat.vertex.slice(..));
        render_pass.set_index_buffer(flat.index.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..amount, 0, 0..1);
    }
    owners
}

async fn read_id(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    extent: wgpu::Extent3d,
    cursor: (f64, f64),
) -> Option<u32> {
    if let Err(e) = map_read(device, buffer).await {
        log::error!("Reading back the pick texture failed: {:#}", e);
        return None;
    }
    let id = {
        let data = buffer.slice(..).get_mapped_range();
        let offset = texel_offset(cursor, extent)?;
        let texel = data.get(offset..offset + BYTES_PER_TEXEL as usize)?;
        u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]])
    };
    buffer.unmap();

    log::debug!("Selected obj with id {}", id);
    (id != 0).then_some(id)
}

/// Render all flows to pick texture and determine which object was clicked.
///
/// # Arguments
///
/// * `async_runtime` using the tokio runtime to wait for the read back if not on WASM
/// * `flows` represent all active graphics flows with their renderable objects
/// * `ctx` is the rendering context, its mouse state holds the cursor at the time of the click
/// * `proxy` WASM futures can only resolve using the winit event loop proxy by sending events
///
/// # Returns
///
/// `Some((pick_id, flow_ids))` if an object was picked, or `None` if nothing was hit or
/// the result is delivered through the event loop.
pub fn draw_to_pick_buffer<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    flows: &[Box<dyn GraphicsFlow<State, Event>>],
    ctx: &Context,
    #[cfg(target_arch = "wasm32")] proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
) -> Option<(u32, HashSet<usize>)> {
    let extent = padded_extent(&ctx.config);
    let cursor = (
        ctx.mouse.coords.x * f64::from(extent.width) / f64::from(ctx.config.width.max(1)),
        ctx.mouse.coords.y * f64::from(extent.height) / f64::from(ctx.config.height.max(1)),
    );

    let target = offscreen_texture(
        &ctx.device,
        extent,
        wgpu::TextureFormat::R32Uint,
        wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        "Pick texture",
    );
    let depth = offscreen_texture(
        &ctx.device,
        extent,
        PICK_DEPTH_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT,
        "Pick depth texture",
    );

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pick Encoder"),
        });
    let owners = encode_pick_pass(ctx, flows, &mut encoder, &target, &depth);
    let buffer = copy_to_buffer(&ctx.device, &mut encoder, &target, extent, "Pick output buffer");
    ctx.queue.submit(iter::once(encoder.finish()));

    let device = ctx.device.clone();
    let lookup = async move {
        let id = read_id(&device, &buffer, extent, cursor).await?;
        owners.get(&id).map(|flow_ids| (id, flow_ids.clone()))
    };

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(picked) = lookup.await {
                if proxy.send_event(FlowEvent::Id(picked)).is_err() {
                    log::error!("The event loop closed before the pick result arrived");
                }
            }
        });
        return None;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        return async_runtime.block_on(lookup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(width: u32, height: u32) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    #[test]
    fn pads_to_the_copy_alignment() {
        assert_eq!(padded(800), 1024);
        assert_eq!(padded(512), 512);
        assert_eq!(padded(0), 256);
    }

    #[test]
    fn ignores_clicks_outside_the_texture() {
        assert_eq!(texel_offset((-1.0, 5.0), extent(256, 256)), None);
        assert_eq!(texel_offset((10.0, 256.0), extent(256, 256)), None);
        assert_eq!(texel_offset((1.0, 2.0), extent(256, 256)), Some((2 * 256 + 1) * 4));
    }
}
