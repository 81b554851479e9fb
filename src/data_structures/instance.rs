//! Node transformation data for GPU rendering.
//!
//! Each scene node keeps a local [`Instance`]. World matrices are composed on the
//! CPU and uploaded as [`InstanceRaw`] so the vertex shader only needs one matrix
//! multiplication per vertex.

use cgmath::{Matrix, Rad, SquareMatrix};

use crate::data_structures::model;

/// Local transformation: position, rotation (XYZ Euler angles) and scale.
///
/// Rotation is kept as Euler angles because the hinge animation works on the
/// rotation about the vertical axis alone (`rotation.y`), leaving the other two
/// axes as they came from the asset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Euler<Rad<f32>>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn yaw(&self) -> Rad<f32> {
        self.rotation.y
    }

    pub fn set_yaw(&mut self, yaw: Rad<f32>) {
        self.rotation.y = yaw;
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        let rotation: cgmath::Quaternion<f32> = self.rotation.into();
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

/// glTF decomposed transform: translation, rotation quaternion `[x, y, z, w]`, scale.
impl From<([f32; 3], [f32; 4], [f32; 3])> for Instance {
    fn from((translation, [x, y, z, w], scale): ([f32; 3], [f32; 4], [f32; 3])) -> Self {
        let rotation = cgmath::Quaternion::new(w, x, y, z);
        Instance {
            position: translation.into(),
            rotation: rotation.into(),
            scale: scale.into(),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    pub fn from_matrix(world: cgmath::Matrix4<f32>) -> Self {
        let upper = cgmath::Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
        // Non-uniform scale needs the inverse transpose to keep normals perpendicular
        let normal = upper
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(upper);
        Self {
            model: world.into(),
            normal: normal.into(),
        }
    }
}

/**
 * As we store vertex data directly in the GPU memory we need to tell what the bytes refer to:
 *
 * offset: zero as we want to use the full space.
 * stride: length of the world matrix plus the normal matrix
 *
 * Stride layout here: world matrix as four 4d vectors followed by the normal matrix as three 3d vectors
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Shaders only advance to the next entry when a new instance starts
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}
