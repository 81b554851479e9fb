use anyhow::Context;

use crate::{
    data_structures::texture::{SamplerSettings, Texture},
    resources::load_binary,
};

fn extension(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    sampler: SamplerSettings,
) -> anyhow::Result<Texture> {
    let data = load_binary(file_name).await?;
    Texture::from_bytes(device, queue, &data, file_name, extension(file_name), sampler)
        .with_context(|| format!("decoding {}", file_name))
}

/// Loads an image and scales it down to fit `size`x`size` before uploading.
pub async fn load_thumbnail(
    file_name: &str,
    size: u32,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = load_binary(file_name).await?;
    let img = image::load_from_memory(&data).with_context(|| format!("decoding {}", file_name))?;
    let thumbnail = img.thumbnail(size, size);
    let sampler = SamplerSettings {
        address_mode: wgpu::AddressMode::ClampToEdge,
        anisotropy: 1,
    };
    Texture::from_image(device, queue, &thumbnail, Some(file_name), sampler)
}

#[cfg(test)]
mod tests {
    use super::extension;

    #[test]
    fn takes_the_extension_from_the_last_dot() {
        assert_eq!(extension("textures/Nocturne-Oak.jpg"), Some("jpg"));
        assert_eq!(extension("models/cabinet.v2.glb"), Some("glb"));
        assert_eq!(extension("logo"), None);
    }
}
