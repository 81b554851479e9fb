use super::PipelineRecipe;
use crate::pipelines::gui::Vertex;

/// Format of the depth buffer used while picking.
pub const PICK_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// A single `u32` uniform holding the id of the quad being drawn.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[super::uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        label: Some("pick_bind_group_layout"),
    })
}

/// Same geometry and depth ordering as the GUI pipeline, writing ids instead of colour.
pub fn mk_gui_pick_pipeline(
    device: &wgpu::Device,
    pick_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    PipelineRecipe {
        label: "GUI Pick Pipeline",
        shader: wgpu::ShaderModuleDescriptor {
            label: Some("Pick Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("pick_gui.wgsl").into()),
        },
        bind_group_layouts: &[pick_bind_group_layout],
        buffers: &[Vertex::desc()],
        color: Some(wgpu::ColorTargetState {
            format: wgpu::TextureFormat::R32Uint,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        }),
        depth: super::depth_test(PICK_DEPTH_FORMAT, true),
        cull_mode: Some(wgpu::Face::Back),
    }
    .build(device)
}
