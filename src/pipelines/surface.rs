use super::PipelineRecipe;
use crate::data_structures::{
    instance::InstanceRaw,
    model::{ModelVertex, Vertex},
    texture::Texture,
};

/// Colour map, sampler and [`MaterialUniform`](crate::data_structures::model::MaterialUniform).
pub fn mk_material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let [texture, sampler] = super::sampled_texture_entries(0);
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[texture, sampler, super::uniform_entry(2, wgpu::ShaderStages::FRAGMENT)],
        label: Some("material_bind_group_layout"),
    })
}

fn mesh_pipeline(
    device: &wgpu::Device,
    label: &str,
    color: wgpu::ColorTargetState,
    depth_write_enabled: bool,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::RenderPipeline {
    PipelineRecipe {
        label,
        shader: wgpu::ShaderModuleDescriptor {
            label: Some("Surface Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("surface.wgsl").into()),
        },
        bind_group_layouts,
        buffers: &[ModelVertex::desc(), InstanceRaw::desc()],
        color: Some(color),
        depth: super::depth_test(Texture::DEPTH_FORMAT, depth_write_enabled),
        // glTF panels are often single sided planes
        cull_mode: None,
    }
    .build(device)
}

/// Bind groups: material, camera, light.
pub fn mk_surface_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    mesh_pipeline(
        device,
        "Surface Pipeline",
        wgpu::ColorTargetState {
            format: config.format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        },
        true,
        &[material_bind_group_layout, camera_bind_group_layout, light_bind_group_layout],
    )
}

/// Same shader as the surface pipeline, blended over the opaque parts without writing depth.
pub fn mk_glass_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    mesh_pipeline(
        device,
        "Glass Pipeline",
        wgpu::ColorTargetState {
            format: config.format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        },
        false,
        &[material_bind_group_layout, camera_bind_group_layout, light_bind_group_layout],
    )
}
