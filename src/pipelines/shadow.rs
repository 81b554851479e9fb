use super::PipelineRecipe;
use crate::data_structures::{
    instance::InstanceRaw,
    model::{ModelVertex, Vertex},
    texture::Texture,
};

/// Depth only rendering of the cabinet from the light's point of view.
pub fn mk_shadow_pipeline(
    device: &wgpu::Device,
    shadow_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    PipelineRecipe {
        label: "Shadow Pipeline",
        shader: wgpu::ShaderModuleDescriptor {
            label: Some("Shadow Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
        },
        bind_group_layouts: &[shadow_bind_group_layout],
        buffers: &[ModelVertex::desc(), InstanceRaw::desc()],
        color: None,
        depth: wgpu::DepthStencilState {
            depth_compare: wgpu::CompareFunction::LessEqual,
            // slope scaled bias against shadow acne on the flat cabinet panels
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
            ..super::depth_test(Texture::DEPTH_FORMAT, true)
        },
        cull_mode: None,
    }
    .build(device)
}
