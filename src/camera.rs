//! Orbit camera, projection and the camera uniform.
//!
//! The camera circles a target point. Right-drag rotates it around the target,
//! middle-drag pans the target and the mouse wheel changes the distance within the
//! configured bounds.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{MouseScrollDelta, WindowEvent};

use crate::config::CameraConfig;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_PITCH: f32 = FRAC_PI_2 - 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Point3<f32>,
    pub distance: f32,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitCamera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P, min_distance: f32, max_distance: f32) -> Self {
        let target = target.into();
        let offset = position.into() - target;
        let distance = offset.magnitude();
        let (yaw, pitch) = if distance > 0.0 {
            (
                Rad(offset.x.atan2(offset.z)),
                Rad((offset.y / distance).asin()),
            )
        } else {
            (Rad(0.0), Rad(0.0))
        };
        Self {
            target,
            distance: distance.clamp(min_distance, max_distance),
            yaw,
            pitch,
            min_distance,
            max_distance,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.position, config.target, config.min_distance, config.max_distance)
    }

    pub fn position(&self) -> Point3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        self.target + Vector3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }

    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance - amount).clamp(self.min_distance, self.max_distance);
    }

    pub fn rotate(&mut self, yaw: Rad<f32>, pitch: Rad<f32>) {
        self.yaw += yaw;
        self.pitch = Rad((self.pitch + pitch).0.clamp(-SAFE_PITCH, SAFE_PITCH));
    }

    /// Moves the target in the camera's screen plane.
    pub fn pan(&mut self, right: f32, up: f32) {
        let forward = (self.target - self.position()).normalize();
        let right_axis = forward.cross(Vector3::unit_y()).normalize();
        let up_axis = right_axis.cross(forward).normalize();
        self.target += right_axis * right + up_axis * up;
    }
}

pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn set_fovy<F: Into<Rad<f32>>>(&mut self, fovy: F) {
        self.fovy = fovy.into();
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("aspect", &self.aspect)
            .field("fovy", &self.fovy)
            .finish()
    }
}

/// Collects mouse input between frames and applies it in [`update`](Self::update).
#[derive(Debug)]
pub struct CameraController {
    rotate_horizontal: f32,
    rotate_vertical: f32,
    pan_horizontal: f32,
    pan_vertical: f32,
    scroll: f32,
    rotate_speed: f32,
    zoom_speed: f32,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            pan_horizontal: 0.0,
            pan_vertical: 0.0,
            scroll: 0.0,
            rotate_speed,
            zoom_speed,
        }
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.rotate_horizontal += dx as f32;
        self.rotate_vertical += dy as f32;
    }

    pub fn handle_pan(&mut self, dx: f64, dy: f64) {
        self.pan_horizontal += dx as f32;
        self.pan_vertical += dy as f32;
    }

    pub fn handle_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 50.0,
        };
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.handle_scroll(delta);
        }
    }

    /// Mouse deltas are pixels accumulated since the last frame, so `_dt` is not applied.
    pub fn update(&mut self, camera: &mut OrbitCamera, _dt: Duration) {
        let radians_per_pixel = self.rotate_speed * 0.01;
        camera.rotate(
            Rad(-self.rotate_horizontal * radians_per_pixel),
            Rad(self.rotate_vertical * radians_per_pixel),
        );
        let pan_scale = camera.distance * 0.001;
        camera.pan(-self.pan_horizontal * pan_scale, self.pan_vertical * pan_scale);
        camera.zoom(self.scroll * self.zoom_speed * 0.1);

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.pan_horizontal = 0.0;
        self.pan_vertical = 0.0;
        self.scroll = 0.0;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrbitCamera, projection: &Projection) {
        self.view_position = camera.position().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// The orbit camera together with its controller and GPU uniform.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: OrbitCamera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, config: &CameraConfig, projection: &Projection) -> Self {
        let camera = OrbitCamera::from_config(config);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[crate::pipelines::uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
            label: Some("camera_bind_group_layout"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller: CameraController::new(config.rotate_speed, config.zoom_speed),
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_the_configured_position() {
        let camera = OrbitCamera::from_config(&CameraConfig::default());
        let position = camera.position();
        assert!((position.x - 0.0).abs() < 1e-5);
        assert!((position.y - 0.5).abs() < 1e-5);
        assert!((position.z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn zoom_stays_outside_the_cabinet_and_within_range() {
        let mut camera = OrbitCamera::from_config(&CameraConfig::default());
        camera.zoom(100.0);
        assert_eq!(camera.distance, 1.2);
        camera.zoom(-100.0);
        assert_eq!(camera.distance, 5.0);
    }

    #[test]
    fn pitch_never_flips_over_the_pole() {
        let mut camera = OrbitCamera::from_config(&CameraConfig::default());
        camera.rotate(Rad(0.0), Rad(10.0));
        assert!(camera.pitch.0 < FRAC_PI_2);
        camera.rotate(Rad(0.0), Rad(-20.0));
        assert!(camera.pitch.0 > -FRAC_PI_2);
    }
}
