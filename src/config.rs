//! Configuration of the configurator: asset locations, animation constants, camera
//! and lighting of the render surface.
//!
//! Everything has a default that matches the shipped cabinet. Flows read the config
//! at construction and copy the render-surface parts into the [`Context`] during
//! `on_init`.
//!
//! [`Context`]: crate::context::Context

use std::time::Duration;

use cgmath::Deg;

#[derive(Clone, Debug)]
pub struct ConfiguratorConfig {
    /// glTF/GLB file of the cabinet, relative to the asset root.
    pub model_path: String,
    /// Directory holding one texture per catalog id.
    pub texture_root: String,
    pub texture_extension: String,
    pub logo_path: String,
    /// Exponential easing rate of the door hinges, per second.
    pub animation_rate: f32,
    pub door_open_angle: Deg<f32>,
    /// Upper bound for a single asset load before it is reported as failed.
    pub load_timeout: Duration,
    pub clear_colour: wgpu::Color,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
}

impl ConfiguratorConfig {
    /// `<texture_root>/<id>.<ext>`
    pub fn texture_path(&self, material_id: &str) -> String {
        format!(
            "{}/{}.{}",
            self.texture_root.trim_end_matches('/'),
            material_id,
            self.texture_extension
        )
    }
}

impl Default for ConfiguratorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/cabinet.glb".to_string(),
            texture_root: "textures".to_string(),
            texture_extension: "jpg".to_string(),
            logo_path: "logo.png".to_string(),
            animation_rate: 5.0,
            door_open_angle: Deg(90.0),
            load_timeout: Duration::from_secs(30),
            // #b2b2b2
            clear_colour: wgpu::Color {
                r: 0.698,
                g: 0.698,
                b: 0.698,
                a: 1.0,
            },
            camera: CameraConfig::default(),
            lighting: LightingConfig::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Closest orbit distance; keeps the camera outside the cabinet volume.
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.5, 2.0],
            target: [0.0, 0.0, 0.0],
            fovy: Deg(50.0),
            znear: 0.1,
            zfar: 100.0,
            min_distance: 1.2,
            max_distance: 5.0,
            rotate_speed: 0.4,
            zoom_speed: 2.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LightingConfig {
    pub ambient: f32,
    pub directional_position: [f32; 3],
    pub directional_intensity: f32,
    pub directional_colour: [f32; 3],
    /// Strength of the sky/ground hemisphere term standing in for the environment map.
    pub environment: f32,
    pub sky_colour: [f32; 3],
    pub ground_colour: [f32; 3],
    pub shadow_map_size: u32,
    pub exposure: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient: 0.2,
            directional_position: [2.0, 4.0, 0.0],
            directional_intensity: 1.0,
            directional_colour: [1.0, 1.0, 1.0],
            environment: 0.5,
            sky_colour: [1.0, 1.0, 1.0],
            // #bbbbff
            ground_colour: [0.733, 0.733, 1.0],
            shadow_map_size: 1024,
            exposure: 0.5,
        }
    }
}
