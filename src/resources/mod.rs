//! Loading of external files: the cabinet scene, textures and pick ids.
//!
//! Everything here stays on the CPU except [`texture`] and [`pick`], so scene
//! parsing can run inside a future and be tested without a GPU. Native builds read
//! from `./assets`, WASM builds fetch from `<origin>/assets`.

use std::{future::Future, time::Duration};

use anyhow::{Context as _, bail};
use image::DynamicImage;

use crate::{
    data_structures::{
        instance::Instance,
        model::ModelVertex,
        scene_graph::{Aabb, Geometry, MaterialSlot, NodeId, SceneGraph, SourceMaterial},
    },
    error::ConfiguratorError,
};

pub mod pick;
pub mod texture;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("the page has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

/// Fails with [`ConfiguratorError::LoadTimeout`] when `fut` takes longer than `timeout`.
///
/// Browsers enforce their own request timeouts, so on WASM the future runs unbounded.
pub async fn with_timeout<T>(
    path: &str,
    timeout: Duration,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ConfiguratorError::LoadTimeout {
                path: path.to_string(),
                timeout,
            }
            .into()),
        }
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = (path, timeout);
        fut.await
    }
}

/// Material of the asset, as far as the surface shader can express it.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    pub alpha_blend: bool,
    pub transmission: f32,
    /// Index into [`SceneData::images`].
    pub base_color_image: Option<usize>,
}

/// One triangle list of a mesh node.
#[derive(Clone, Debug)]
pub struct PrimitiveData {
    pub node: NodeId,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

/// A parsed glTF asset, ready to be uploaded.
#[derive(Debug, Default)]
pub struct SceneData {
    pub graph: SceneGraph,
    pub primitives: Vec<PrimitiveData>,
    pub materials: Vec<SceneMaterial>,
    /// Decoded images by glTF image index; `None` when decoding failed.
    pub images: Vec<Option<DynamicImage>>,
}

impl SceneData {
    pub fn primitives_of(&self, node: NodeId) -> impl Iterator<Item = &PrimitiveData> + '_ {
        self.primitives.iter().filter(move |primitive| primitive.node == node)
    }
}

/// Loads a `.gltf` or `.glb` file including external buffers and images.
///
/// External files are resolved relative to the directory of `file_name`.
pub async fn load_scene(file_name: &str) -> anyhow::Result<SceneData> {
    let bytes = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&bytes).with_context(|| format!("parsing {}", file_name))?;
    let directory = match file_name.rfind('/') {
        Some(idx) => &file_name[..=idx],
        None => "",
    };

    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .with_context(|| format!("{} references a missing binary chunk", file_name))?,
            gltf::buffer::Source::Uri(uri) => external(directory, uri).await?,
        };
        buffers.push(data);
    }

    let mut images = Vec::new();
    for image in gltf.images() {
        let decoded = match image.source() {
            gltf::image::Source::View { view, .. } => decode_view(&buffers, &view),
            gltf::image::Source::Uri { uri, .. } => match external(directory, uri).await {
                Ok(bytes) => image::load_from_memory(&bytes).map_err(anyhow::Error::from),
                Err(e) => Err(e),
            },
        };
        images.push(keep_decoded(image.index(), decoded));
    }

    Ok(build_scene(&gltf, &buffers, images))
}

/// Parses a self-contained GLB. External buffers or images are not followed.
pub fn parse_glb(bytes: &[u8]) -> anyhow::Result<SceneData> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                buffers.push(gltf.blob.clone().context("missing binary chunk")?)
            }
            gltf::buffer::Source::Uri(uri) => bail!("external buffer {} in a GLB", uri),
        }
    }
    let images = gltf
        .images()
        .map(|image| {
            let decoded = match image.source() {
                gltf::image::Source::View { view, .. } => decode_view(&buffers, &view),
                gltf::image::Source::Uri { uri, .. } => Err(anyhow::anyhow!("external image {}", uri)),
            };
            keep_decoded(image.index(), decoded)
        })
        .collect();
    Ok(build_scene(&gltf, &buffers, images))
}

async fn external(directory: &str, uri: &str) -> anyhow::Result<Vec<u8>> {
    if uri.starts_with("data:") {
        bail!("embedded data URIs are not supported");
    }
    load_binary(&format!("{}{}", directory, uri)).await
}

fn decode_view(buffers: &[Vec<u8>], view: &gltf::buffer::View) -> anyhow::Result<DynamicImage> {
    let buffer = buffers
        .get(view.buffer().index())
        .context("image view points to a missing buffer")?;
    let bytes = buffer
        .get(view.offset()..view.offset() + view.length())
        .context("image view exceeds its buffer")?;
    Ok(image::load_from_memory(bytes)?)
}

fn keep_decoded(index: usize, decoded: anyhow::Result<DynamicImage>) -> Option<DynamicImage> {
    match decoded {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("Image {} could not be decoded, using its base colour: {:#}", index, e);
            None
        }
    }
}

fn build_scene(gltf: &gltf::Document, buffers: &[Vec<u8>], images: Vec<Option<DynamicImage>>) -> SceneData {
    let materials = gltf
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            SceneMaterial {
                name: material.name().unwrap_or("material").to_string(),
                base_color: pbr.base_color_factor(),
                alpha_blend: material.alpha_mode() == gltf::material::AlphaMode::Blend,
                transmission: material
                    .transmission()
                    .map(|transmission| transmission.transmission_factor())
                    .unwrap_or(0.0),
                base_color_image: pbr
                    .base_color_texture()
                    .map(|info| info.texture().source().index()),
            }
        })
        .collect();

    let mut scene = SceneData {
        materials,
        images,
        ..Default::default()
    };
    let Some(root) = gltf.default_scene().or_else(|| gltf.scenes().next()) else {
        log::warn!("The asset contains no scene");
        return scene;
    };
    for node in root.nodes() {
        add_node(&mut scene, buffers, &node, None);
    }
    log::debug!(
        "Parsed {} nodes with {} primitives",
        scene.graph.len(),
        scene.primitives.len()
    );
    scene
}

fn add_node(scene: &mut SceneData, buffers: &[Vec<u8>], node: &gltf::Node, parent: Option<NodeId>) {
    let name = node
        .name()
        .or_else(|| node.mesh().and_then(|mesh| mesh.name()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()));
    let local: Instance = node.transform().decomposed().into();

    let mut primitives = Vec::new();
    let mut source = SourceMaterial::default();
    if let Some(mesh) = node.mesh() {
        for (idx, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("Skipping non-triangle primitive {} of {}", idx, name);
                continue;
            }
            if primitives.is_empty() {
                source = source_material(&scene.materials, primitive.material().index());
            }
            match read_primitive(buffers, &primitive) {
                Some((vertices, indices)) => {
                    primitives.push((vertices, indices, primitive.material().index()))
                }
                None => log::warn!("Primitive {} of {} has no positions", idx, name),
            }
        }
    }

    let bounds = Aabb::from_points(
        primitives
            .iter()
            .flat_map(|(vertices, _, _)| vertices.iter().map(|vertex| vertex.position)),
    );
    let geometry = bounds.map(|bounds| Geometry { bounds });
    let id = scene
        .graph
        .add_node(parent, name, local, geometry, MaterialSlot::Source(source));
    scene
        .primitives
        .extend(primitives.into_iter().map(|(vertices, indices, material)| PrimitiveData {
            node: id,
            vertices,
            indices,
            material,
        }));

    for child in node.children() {
        add_node(scene, buffers, &child, Some(id));
    }
}

fn source_material(materials: &[SceneMaterial], index: Option<usize>) -> SourceMaterial {
    match index.and_then(|idx| materials.get(idx)) {
        Some(material) => SourceMaterial {
            index,
            base_color: material.base_color,
            alpha_blend: material.alpha_blend,
            transmission: material.transmission,
        },
        None => SourceMaterial::default(),
    }
}

fn read_primitive(buffers: &[Vec<u8>], primitive: &gltf::Primitive) -> Option<(Vec<ModelVertex>, Vec<u32>)> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }
    let mut tex_coords = reader.read_tex_coords(0).map(|coords| coords.into_f32());
    let mut normals = reader.read_normals();
    let vertices = positions
        .iter()
        .map(|position| ModelVertex {
            position: *position,
            tex_coords: tex_coords
                .as_mut()
                .and_then(Iterator::next)
                .unwrap_or([0.0, 0.0]),
            normal: normals
                .as_mut()
                .and_then(Iterator::next)
                .unwrap_or([0.0, 1.0, 0.0]),
        })
        .collect();
    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    Some((vertices, indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_data_that_is_not_gltf() {
        assert!(parse_glb(b"definitely not a cabinet").is_err());
    }

    #[test]
    fn reports_the_path_of_a_timed_out_load() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result: anyhow::Result<()> = runtime.block_on(with_timeout(
            "models/cabinet.glb",
            Duration::from_millis(5),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        ));
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfiguratorError>(),
            Some(ConfiguratorError::LoadTimeout { .. })
        ));
        assert!(err.to_string().contains("models/cabinet.glb"));
    }
}
