use wgpu::util::DeviceExt;

/**
 * Instead of texture RGBA values the pick pipeline writes a uniform ID per quad. When
 * backtracking the ID read from the pick texture we get pixel-perfect picking of the
 * GUI controls.
 */
pub fn load_pick_bind_group(
    id: u32,
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::BindGroup {
    // Current browsers don't support downscaling Uniform Buffers so I have to provide the full 16B
    let buf: [u32; 4] = [id, 0, 0, 0];
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Pick id buffer"),
        contents: bytemuck::cast_slice(&buf),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("pick_bind_group"),
    })
}
