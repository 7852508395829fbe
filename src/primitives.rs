//! Procedural meshes: the UV sphere, the unit cube and the skybox cube.

use std::f32::consts::PI;

use cgmath::Vector3;

use crate::data_structures::model::ModelVertex;

pub const SPHERE_SEGMENTS: u32 = 64;

/// CPU-side indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

/// Unit sphere with `x_segments` around the equator and `y_segments` from
/// pole to pole. The seam column is duplicated so texture coordinates wrap.
pub fn uv_sphere(x_segments: u32, y_segments: u32) -> Geometry {
    let x_segments = x_segments.max(3);
    let y_segments = y_segments.max(2);

    let mut vertices = Vec::with_capacity(((x_segments + 1) * (y_segments + 1)) as usize);
    for y in 0..=y_segments {
        for x in 0..=x_segments {
            let u = x as f32 / x_segments as f32;
            let v = y as f32 / y_segments as f32;
            let (sin_theta, cos_theta) = (2.0 * PI * u).sin_cos();
            let (sin_phi, cos_phi) = (PI * v).sin_cos();
            let position = [cos_theta * sin_phi, cos_phi, sin_theta * sin_phi];
            vertices.push(ModelVertex {
                position,
                tex_coords: [u, v],
                normal: position,
            });
        }
    }

    let row = x_segments + 1;
    let mut indices = Vec::with_capacity((6 * x_segments * y_segments) as usize);
    for y in 0..y_segments {
        for x in 0..x_segments {
            let top_left = y * row + x;
            let bottom_left = top_left + row;
            let top_right = top_left + 1;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[
                top_left,
                top_right,
                bottom_left,
                top_right,
                bottom_right,
                bottom_left,
            ]);
        }
    }

    Geometry { vertices, indices }
}

/// Outward normal plus two in-plane axes with `u × v = normal`.
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

/// Corners of one face of a cube with half-extent `h`, counter-clockwise
/// seen from outside.
fn face_corners(face: &([f32; 3], [f32; 3], [f32; 3]), h: f32) -> [Vector3<f32>; 4] {
    let n = Vector3::from(face.0) * h;
    let u = Vector3::from(face.1) * h;
    let v = Vector3::from(face.2) * h;
    [n - u - v, n + u - v, n + u + v, n - u + v]
}

/// Cube of edge 1 centred on the origin, four vertices per face.
pub fn cube() -> Geometry {
    const TEX_COORDS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut geometry = Geometry::default();
    for face in &CUBE_FACES {
        let base = geometry.vertices.len() as u32;
        for (corner, tex_coords) in face_corners(face, 0.5).iter().zip(TEX_COORDS) {
            geometry.vertices.push(ModelVertex {
                position: (*corner).into(),
                tex_coords,
                normal: face.0,
            });
        }
        geometry
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    geometry
}

/// Non-indexed positions of the `[-1, 1]³` cube the skybox is drawn on.
pub fn skybox_vertices() -> Vec<[f32; 3]> {
    CUBE_FACES
        .iter()
        .flat_map(|face| {
            let c = face_corners(face, 1.0);
            [c[0], c[1], c[2], c[0], c[2], c[3]]
        })
        .map(Into::into)
        .collect()
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    fn assert_outward(geometry: &Geometry) {
        for tri in geometry.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vector3::from(geometry.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            // Pole rows collapse to slivers with no orientation
            if normal.magnitude() < 1e-6 {
                continue;
            }
            let center = (a + b + c) / 3.0;
            assert!(normal.dot(center) > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn sphere_counts() {
        let sphere = uv_sphere(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
        assert_eq!(sphere.vertices.len(), 65 * 65);
        assert_eq!(sphere.indices.len(), 6 * 64 * 64);
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertices.len()));
    }

    #[test]
    fn sphere_vertices_lie_on_the_unit_sphere() {
        let sphere = uv_sphere(16, 8);
        for v in &sphere.vertices {
            let p = Vector3::from(v.position);
            assert!((p.magnitude() - 1.0).abs() < 1e-5);
            assert_eq!(v.position, v.normal);
        }
        assert_eq!(sphere.vertices[0].position[1], 1.0);
    }

    #[test]
    fn sphere_faces_outwards() {
        assert_outward(&uv_sphere(16, 8));
    }

    #[test]
    fn cube_has_six_closed_faces() {
        let cube = cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for v in &cube.vertices {
            assert!(v.position.iter().all(|c| c.abs() == 0.5));
            assert!((Vector3::from(v.normal).magnitude() - 1.0).abs() < 1e-6);
            // corner lies on the face its normal names
            assert_eq!(Vector3::from(v.position).dot(Vector3::from(v.normal)), 0.5);
        }
        assert_outward(&cube);
    }

    #[test]
    fn skybox_covers_the_clip_cube() {
        let positions = skybox_vertices();
        assert_eq!(positions.len(), 36);
        assert!(positions.iter().flatten().all(|c| c.abs() == 1.0));
    }
}
