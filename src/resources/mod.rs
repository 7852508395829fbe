//! Loading meshes, textures and cubemap faces from the asset root.

use crate::data_structures::model;

pub mod mesh;
pub mod texture;

pub use texture::{load_binary, load_cubemap_faces, load_string, material_layout};

/// Loads an OBJ with its MTL and texture maps. Paths inside the OBJ and MTL
/// are resolved next to `file_name`.
pub async fn load_model_obj(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<model::Model> {
    let (materials, models) = texture::load_textures(file_name, queue, device, layout).await?;
    let meshes = mesh::load_meshes(&models, file_name, device);
    if meshes.is_empty() {
        anyhow::bail!("{file_name} contains no usable meshes");
    }
    log::info!(
        "loaded {file_name}: {} meshes, {} materials",
        meshes.len(),
        materials.len()
    );

    Ok(model::Model { meshes, materials })
}
