use super::PipelineRecipe;
use crate::data_structures::texture::{self, Texture};

/// Quad corner of a shell element. `position` is already in NDC, z orders the quads.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }

    /// Two counter clockwise triangles over corners ordered top left, bottom left,
    /// bottom right, top right.
    pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

    pub fn quad(corners: [[f32; 2]; 4], z: f32) -> [Vertex; 4] {
        let uvs = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        let mut vertices = [Vertex {
            position: [0.0; 3],
            tex_coords: [0.0; 2],
        }; 4];
        for (vertex, ([x, y], uv)) in vertices.iter_mut().zip(corners.into_iter().zip(uvs)) {
            *vertex = Vertex {
                position: [x, y, z],
                tex_coords: uv,
            };
        }
        vertices
    }
}

pub fn mk_texture_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &super::sampled_texture_entries(0),
        label: Some("gui_texture_bind_group_layout"),
    })
}

/// Binds an icon, swatch or banner image. Keep them below 2048x2048, not every
/// browser backend handles larger textures.
pub fn mk_bind_group(
    device: &wgpu::Device,
    texture: &Texture,
    texture_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::BindGroup {
    let fallback_sampler;
    let sampler = match &texture.sampler {
        Some(sampler) => sampler,
        None => {
            fallback_sampler = texture::create_sampler(device, Default::default());
            &fallback_sampler
        }
    };
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: texture_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("gui_bind_group"),
    })
}

/// Screen quads blended over the scene. Each quad carries its own depth so the
/// ring sits on the panel and the banner on top of everything.
pub fn mk_gui_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    texture_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    PipelineRecipe {
        label: "GUI Pipeline",
        shader: wgpu::ShaderModuleDescriptor {
            label: Some("Icon Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("icon.wgsl").into()),
        },
        bind_group_layouts: &[texture_bind_group_layout],
        buffers: &[Vertex::desc()],
        color: Some(wgpu::ColorTargetState {
            format: config.format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        }),
        depth: super::depth_test(Texture::DEPTH_FORMAT, true),
        cull_mode: Some(wgpu::Face::Back),
    }
    .build(device)
}
