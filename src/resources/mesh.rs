use crate::{data_structures::model, primitives::Geometry};

/// Converts tobj meshes into vertex data. Texture coordinates are flipped
/// vertically since OBJ puts v = 0 at the bottom.
pub fn to_geometry(mesh: &tobj::Mesh) -> Geometry {
    let vertices = (0..mesh.positions.len() / 3)
        .map(|i| model::ModelVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            tex_coords: [
                mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        })
        .collect::<Vec<_>>();

    Geometry {
        vertices,
        indices: mesh.indices.clone(),
    }
}

/// Geometry of `model`, or `None` with a warning if it cannot be drawn.
fn usable_geometry(model: &tobj::Model, file_name: &str) -> Option<Geometry> {
    if model.mesh.indices.is_empty() {
        log::warn!("mesh {} in {} has no indices, skipping", model.name, file_name);
        return None;
    }
    let geometry = to_geometry(&model.mesh);
    let out_of_range = geometry
        .indices
        .iter()
        .any(|&i| i as usize >= geometry.vertices.len());
    if out_of_range {
        log::warn!("mesh {} in {} has indices past its vertices, skipping", model.name, file_name);
        return None;
    }
    Some(geometry)
}

pub fn load_meshes(models: &[tobj::Model], file_name: &str, device: &wgpu::Device) -> Vec<model::Mesh> {
    models
        .iter()
        .filter_map(|m| {
            let geometry = usable_geometry(m, file_name)?;
            Some(model::Mesh::from_geometry(
                device,
                &format!("{file_name}:{}", m.name),
                &geometry,
                m.mesh.material_id.unwrap_or(0),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obj_texture_coordinates_are_flipped() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.25, 0.0, 1.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let geometry = to_geometry(&mesh);
        assert_eq!(geometry.vertices.len(), 3);
        assert_eq!(geometry.vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(geometry.vertices[1].tex_coords, [1.0, 0.75]);
        assert_eq!(geometry.vertices[2].normal, [0.0, 0.0, 1.0]);
        assert_eq!(geometry.indices, vec![0, 1, 2]);
    }

    #[test]
    fn missing_attributes_default_to_zero() {
        let mesh = tobj::Mesh {
            positions: vec![1.0, 2.0, 3.0],
            indices: vec![0],
            ..Default::default()
        };
        let geometry = to_geometry(&mesh);
        assert_eq!(geometry.vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(geometry.vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(geometry.vertices[0].normal, [0.0; 3]);
    }

    fn triangle() -> tobj::Mesh {
        tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        }
    }

    #[test]
    fn meshes_without_indices_are_skipped() {
        let mut mesh = triangle();
        mesh.indices.clear();
        let model = tobj::Model::new(mesh, "empty".to_string());
        assert!(usable_geometry(&model, "test.obj").is_none());
    }

    #[test]
    fn indices_past_the_vertices_are_skipped() {
        let mut mesh = triangle();
        mesh.indices = vec![0, 1, 3];
        let model = tobj::Model::new(mesh, "broken".to_string());
        assert!(usable_geometry(&model, "test.obj").is_none());
    }

    #[test]
    fn well_formed_meshes_are_kept() {
        let model = tobj::Model::new(triangle(), "triangle".to_string());
        let geometry = usable_geometry(&model, "test.obj").unwrap();
        assert_eq!(geometry.vertices.len(), 3);
        assert_eq!(geometry.indices, vec![0, 1, 2]);
    }
}
