//! Render pipelines and the bind group layouts they share.
//!
//! - `surface`: lit opaque meshes and the alpha blended glass variant
//! - `shadow`: depth only pass from the directional light
//! - `light`: light uniform and shadow map resources
//! - `gui`: textured screen quads of the shell
//! - `pick_gui`: screen quads writing their pick id

pub mod gui;
pub mod light;
pub mod pick_gui;
pub mod shadow;
pub mod surface;

pub(crate) fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type,
        },
        count: None,
    }
}

pub(crate) fn sampler_entry(binding: u32, ty: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

/// A filterable colour texture at `binding` and its sampler right after.
pub(crate) fn sampled_texture_entries(binding: u32) -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        texture_entry(binding, wgpu::TextureSampleType::Float { filterable: true }),
        sampler_entry(binding + 1, wgpu::SamplerBindingType::Filtering),
    ]
}

pub(crate) fn depth_test(format: wgpu::TextureFormat, depth_write_enabled: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format,
        depth_write_enabled,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// The parts in which the pipelines differ. All of them draw triangle lists from
/// `vs_main` and `fs_main` without multisampling.
pub(crate) struct PipelineRecipe<'a> {
    pub label: &'a str,
    pub shader: wgpu::ShaderModuleDescriptor<'a>,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub buffers: &'a [wgpu::VertexBufferLayout<'a>],
    /// `None` renders depth only.
    pub color: Option<wgpu::ColorTargetState>,
    pub depth: wgpu::DepthStencilState,
    pub cull_mode: Option<wgpu::Face>,
}

impl PipelineRecipe<'_> {
    pub(crate) fn build(self, device: &wgpu::Device) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(self.label),
            bind_group_layouts: self.bind_group_layouts,
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(self.shader);
        let targets = [self.color];
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: self.buffers,
                compilation_options: Default::default(),
            },
            fragment: targets[0].is_some().then(|| wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: self.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(self.depth),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

#[derive(Debug)]
pub struct Pipelines {
    pub surface: wgpu::RenderPipeline,
    pub glass: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    pub gui: wgpu::RenderPipeline,
    pub gui_pick: wgpu::RenderPipeline,
    pub material_layout: wgpu::BindGroupLayout,
    pub gui_texture_layout: wgpu::BindGroupLayout,
    pub pick_id_layout: wgpu::BindGroupLayout,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light: &light::LightResources,
    ) -> Self {
        let material_layout = surface::mk_material_bind_group_layout(device);
        let gui_texture_layout = gui::mk_texture_bind_group_layout(device);
        let pick_id_layout = pick_gui::mk_bind_group_layout(device);
        Self {
            surface: surface::mk_surface_pipeline(
                device,
                config,
                &material_layout,
                camera_bind_group_layout,
                &light.bind_group_layout,
            ),
            glass: surface::mk_glass_pipeline(
                device,
                config,
                &material_layout,
                camera_bind_group_layout,
                &light.bind_group_layout,
            ),
            shadow: shadow::mk_shadow_pipeline(device, &light.shadow_bind_group_layout),
            gui: gui::mk_gui_pipeline(device, config, &gui_texture_layout),
            gui_pick: pick_gui::mk_gui_pick_pipeline(device, &pick_id_layout),
            material_layout,
            gui_texture_layout,
            pick_id_layout,
        }
    }
}
