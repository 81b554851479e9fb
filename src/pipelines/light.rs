use cgmath::{Matrix4, Point3, Vector3};
use wgpu::util::DeviceExt;

use crate::{camera::OPENGL_TO_WGPU_MATRIX, config::LightingConfig, data_structures::texture::Texture};

/// Half extent of the orthographic volume the shadow map covers around the origin.
const SHADOW_EXTENT: f32 = 2.5;

/// Scene lighting as read by `surface.wgsl` and `shadow.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    view_proj: [[f32; 4]; 4],
    // xyz position, w intensity
    position: [f32; 4],
    // rgb colour, w ambient
    color: [f32; 4],
    // rgb sky colour, w environment strength
    sky: [f32; 4],
    // rgb ground colour, w exposure
    ground: [f32; 4],
}

impl LightUniform {
    pub fn new(config: &LightingConfig) -> Self {
        let [x, y, z] = config.directional_position;
        let [r, g, b] = config.directional_colour;
        let [sky_r, sky_g, sky_b] = config.sky_colour;
        let [ground_r, ground_g, ground_b] = config.ground_colour;
        Self {
            view_proj: light_view_proj(Point3::new(x, y, z)).into(),
            position: [x, y, z, config.directional_intensity],
            color: [r, g, b, config.ambient],
            sky: [sky_r, sky_g, sky_b, config.environment],
            ground: [ground_r, ground_g, ground_b, config.exposure],
        }
    }

    pub fn position(&self) -> [f32; 3] {
        [self.position[0], self.position[1], self.position[2]]
    }

    pub fn exposure(&self) -> f32 {
        self.ground[3]
    }
}

/// Directional light looking at the origin; the shadow map covers the cabinet volume.
fn light_view_proj(position: Point3<f32>) -> Matrix4<f32> {
    // a light straight above would make the up vector degenerate
    let up = if position.x.abs() < 1e-4 && position.z.abs() < 1e-4 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let view = Matrix4::look_at_rh(position, Point3::new(0.0, 0.0, 0.0), up);
    let distance = (position.x * position.x + position.y * position.y + position.z * position.z).sqrt();
    let projection = cgmath::ortho(
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        0.1,
        distance + SHADOW_EXTENT * 2.0,
    );
    OPENGL_TO_WGPU_MATRIX * projection * view
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub shadow_map: Texture,
    /// Uniform, shadow map and comparison sampler for the lit pipelines.
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Uniform only; the shadow pass renders into the shadow map and cannot sample it.
    pub shadow_bind_group: wgpu::BindGroup,
    pub shadow_bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, config: &LightingConfig) -> Self {
        let uniform = LightUniform::new(config);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let size = config.shadow_map_size;
        let shadow_map = Texture::create_depth_texture(device, [size, size], "shadow_map");

        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer, &shadow_map);
        let shadow_bind_group_layout = mk_shadow_bind_group_layout(device);
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &shadow_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("shadow_bind_group"),
        });

        Self {
            uniform,
            buffer,
            shadow_map,
            bind_group,
            bind_group_layout,
            shadow_bind_group,
            shadow_bind_group_layout,
        }
    }

    /// Applies new lighting settings. A different shadow map size reallocates the map.
    pub fn configure(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, config: &LightingConfig) {
        self.uniform = LightUniform::new(config);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        if self.shadow_map.texture.width() != config.shadow_map_size {
            let size = config.shadow_map_size;
            self.shadow_map = Texture::create_depth_texture(device, [size, size], "shadow_map");
            self.bind_group = mk_bind_group(device, &self.bind_group_layout, &self.buffer, &self.shadow_map);
        }
    }
}

/// Light uniform, shadow map and its comparison sampler.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            super::uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
            super::texture_entry(1, wgpu::TextureSampleType::Depth),
            super::sampler_entry(2, wgpu::SamplerBindingType::Comparison),
        ],
        label: Some("light_bind_group_layout"),
    })
}

fn mk_shadow_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[super::uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        label: Some("shadow_bind_group_layout"),
    })
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
    shadow_map: &Texture,
) -> wgpu::BindGroup {
    let fallback_sampler;
    let sampler = match &shadow_map.sampler {
        Some(sampler) => sampler,
        None => {
            fallback_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                compare: Some(wgpu::CompareFunction::LessEqual),
                ..Default::default()
            });
            &fallback_sampler
        }
    };
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&shadow_map.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("light_bind_group"),
    })
}
