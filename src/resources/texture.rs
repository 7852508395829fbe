use std::io::{BufReader, Cursor};

use image::RgbaImage;

use crate::data_structures::{
    model::{self, MaterialUniform},
    texture,
};

/// Shininess every OBJ material is lit with.
pub const MODEL_SHININESS: f32 = 32.0;

/// Group 0 of the lit passes: diffuse map, its sampler, specular map, its
/// sampler and the [`MaterialUniform`].
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let map = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let sampler = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            map(0),
            sampler(1),
            map(2),
            sampler(3),
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    use anyhow::Context;

    let window = web_sys::window().context("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = crate::config::asset_root().join(file_name);
        std::fs::read_to_string(path)?
    };

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = crate::config::asset_root().join(file_name);
        std::fs::read(path)?
    };

    Ok(data)
}

/// Resolves `relative` against the directory `file_name` lives in.
pub fn sibling(file_name: &str, relative: &str) -> String {
    match file_name.rfind('/') {
        Some(idx) => format!("{}/{}", &file_name[..idx], relative),
        None => relative.to_string(),
    }
}

pub async fn load_texture(
    file_name: &str,
    is_linear: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    format: Option<&str>,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(file_name).await?;
    texture::Texture::from_bytes(device, queue, &data, file_name, format, is_linear)
}

/// The two per-material maps an OBJ can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapKind {
    Diffuse,
    Specular,
}

impl MapKind {
    fn name(self) -> &'static str {
        match self {
            MapKind::Diffuse => "diffuse",
            MapKind::Specular => "specular",
        }
    }

    /// Diffuse maps hold colour, specular maps hold intensities that the
    /// shader reads as-is.
    fn is_linear(self) -> bool {
        matches!(self, MapKind::Specular)
    }
}

/// Loads a material map, logging and substituting white if it is absent.
async fn load_map_or_white(
    path: Option<&str>,
    kind: MapKind,
    material: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> texture::Texture {
    let white = |label: &str| texture::Texture::create_solid(device, queue, [255; 4], label);
    let Some(path) = path else {
        log::warn!("material {material} has no {} map, using white", kind.name());
        return white(kind.name());
    };
    match load_texture(path, kind.is_linear(), device, queue, None).await {
        Ok(texture) => texture,
        Err(err) => {
            log::error!("failed to load {} map {path} for {material}: {err:#}", kind.name());
            white(path)
        }
    }
}

pub async fn load_textures(
    file_name: &str,
    queue: &wgpu::Queue,
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<(Vec<model::Material>, Vec<tobj::Model>)> {
    let obj_text: String = load_string(file_name).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            let mtl_path = sibling(file_name, &p);
            match load_string(&mtl_path).await {
                Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                Err(err) => {
                    log::error!("failed to read material library {mtl_path}: {err:#}");
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        },
    )
    .await?;

    let obj_materials = obj_materials.unwrap_or_else(|err| {
        log::error!("materials of {file_name} could not be parsed: {err}");
        Vec::new()
    });

    let mut materials = Vec::new();
    for m in obj_materials {
        let diffuse_path = m.diffuse_texture.as_deref().map(|t| sibling(file_name, t));
        let specular_path = m.specular_texture.as_deref().map(|t| sibling(file_name, t));
        let diffuse_texture =
            load_map_or_white(diffuse_path.as_deref(), MapKind::Diffuse, &m.name, device, queue).await;
        let specular_texture =
            load_map_or_white(specular_path.as_deref(), MapKind::Specular, &m.name, device, queue).await;
        materials.push(model::Material::new(
            device,
            &m.name,
            diffuse_texture,
            specular_texture,
            MaterialUniform::textured(MODEL_SHININESS),
            layout,
        ));
    }

    if materials.is_empty() {
        log::warn!("{file_name} defines no materials, drawing it plain white");
        materials.push(model::Material::solid(
            device,
            queue,
            file_name,
            MaterialUniform::textured(MODEL_SHININESS),
            layout,
        ));
    }

    Ok((materials, models))
}

/// Loads the six faces of a cubemap concurrently. Faces that cannot be read
/// or decoded come back as `None` after an error log.
pub async fn load_cubemap_faces(paths: &[String; 6]) -> [Option<RgbaImage>; 6] {
    let loads = paths.iter().map(|path| async move {
        let decoded = load_binary(path)
            .await
            .and_then(|bytes| Ok(image::load_from_memory(&bytes)?.to_rgba8()));
        match decoded {
            Ok(face) => Some(face),
            Err(err) => {
                log::error!("cubemap face {path} failed to load: {err:#}");
                None
            }
        }
    });
    let faces = futures::future::join_all(loads).await;

    let mut out: [Option<RgbaImage>; 6] = Default::default();
    for (slot, face) in out.iter_mut().zip(faces) {
        *slot = face;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siblings_resolve_next_to_the_obj() {
        assert_eq!(sibling("backpack/backpack.obj", "diffuse.jpg"), "backpack/diffuse.jpg");
        assert_eq!(sibling("a/b/c.obj", "c.mtl"), "a/b/c.mtl");
        assert_eq!(sibling("cube.obj", "cube.mtl"), "cube.mtl");
    }

    #[test]
    fn specular_maps_skip_srgb_decoding() {
        assert!(MapKind::Specular.is_linear());
        assert!(!MapKind::Diffuse.is_linear());
        assert_eq!(MapKind::Specular.name(), "specular");
    }
}
