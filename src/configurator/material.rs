//! Shading parameters of the two materials the configurator creates itself.

use crate::data_structures::model::MaterialUniform;

/// Name fragments of parts that keep their authored material.
const HARDWARE_KEYWORDS: [&str; 3] = ["handle", "hinge", "hardware"];

/// Catalog surfaces: a wood/stone colour map tiled once across each part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceParams {
    pub roughness: f32,
    pub metalness: f32,
    pub uv_repeat: [f32; 2],
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            roughness: 0.6,
            metalness: 0.05,
            uv_repeat: [1.0, 1.0],
        }
    }
}

impl From<SurfaceParams> for MaterialUniform {
    fn from(params: SurfaceParams) -> Self {
        MaterialUniform {
            uv_repeat: params.uv_repeat,
            roughness: params.roughness,
            metalness: params.metalness,
            ..Default::default()
        }
    }
}

/// The one glass material shared by every glass part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlassParams {
    pub roughness: f32,
    pub transmission: f32,
    /// Thin shell; only used to damp the transmitted tint.
    pub thickness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub opacity: f32,
}

impl Default for GlassParams {
    fn default() -> Self {
        Self {
            roughness: 0.0,
            transmission: 0.9,
            thickness: 0.05,
            clearcoat: 1.0,
            clearcoat_roughness: 0.1,
            opacity: 0.5,
        }
    }
}

impl From<GlassParams> for MaterialUniform {
    fn from(params: GlassParams) -> Self {
        let tint = 1.0 - params.thickness;
        MaterialUniform {
            base_color: [tint, tint, tint, 1.0],
            roughness: params.roughness,
            metalness: 0.0,
            opacity: params.opacity,
            transmission: params.transmission,
            clearcoat: params.clearcoat,
            clearcoat_roughness: params.clearcoat_roughness,
            ..Default::default()
        }
    }
}

/// Handles, hinges and other fittings are never re-skinned with a catalog surface.
pub fn is_hardware(name: &str) -> bool {
    let name = name.to_lowercase();
    HARDWARE_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_names_match_case_insensitively() {
        assert!(is_hardware("Door_Handle_L"));
        assert!(is_hardware("HINGE.001"));
        assert!(is_hardware("cabinet_hardware"));
        assert!(!is_hardware("LeftDoor"));
    }

    #[test]
    fn glass_uniform_is_half_transparent() {
        let uniform: MaterialUniform = GlassParams::default().into();
        assert_eq!(uniform.opacity, 0.5);
        assert_eq!(uniform.base_color[3], 1.0);
        assert_eq!(uniform.transmission, 0.9);
        assert_eq!(uniform.roughness, 0.0);
    }

    #[test]
    fn surface_uniform_keeps_white_base_colour() {
        let uniform: MaterialUniform = SurfaceParams::default().into();
        assert_eq!(uniform.base_color, [1.0; 4]);
        assert_eq!(uniform.roughness, 0.6);
        assert_eq!(uniform.metalness, 0.05);
        assert_eq!(uniform.uv_repeat, [1.0, 1.0]);
    }
}
