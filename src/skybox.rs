//! Rotating day/night skybox.
//!
//! Two cubemaps are bound at once and blended in the shader by the clock's
//! day weight. The view matrix loses its translation so the box stays
//! centred on the camera, and an extra rotation about Y turns the sky slowly.

use cgmath::{Deg, Matrix3, Matrix4, Rad, SquareMatrix};
use image::{Rgba, RgbaImage, imageops::FilterType};
use instant::Duration;
use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, Projection},
    clock::DayClock,
    data_structures::texture::Texture,
    pipelines::skybox::{mk_skybox_layout, mk_skybox_pipeline},
    primitives,
    resources,
};

pub const DEGREES_PER_SECOND: f32 = 10.0;
const PLACEHOLDER: Rgba<u8> = Rgba([255, 0, 255, 255]);

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniform {
    view_proj: [[f32; 4]; 4],
    /// x: day weight.
    params: [f32; 4],
}

impl SkyUniform {
    pub fn new(camera: &Camera, projection: &Projection, rotation: Rad<f32>, day_weight: f32) -> Self {
        let view = camera.calc_matrix();
        let rotation_only = Matrix3::from_cols(view.x.truncate(), view.y.truncate(), view.z.truncate());
        let view = Matrix4::from(rotation_only) * Matrix4::from_angle_y(rotation);
        Self {
            view_proj: (projection.calc_matrix() * view).into(),
            params: [day_weight, 0.0, 0.0, 0.0],
        }
    }
}

/// Turns up to six decoded faces into a complete set of square faces.
///
/// The side is the longer edge of the first loaded face and every face is
/// resized to it. Gaps become solid magenta so a missing file is obvious on
/// screen, 1x1 if nothing loaded at all.
pub fn assemble_faces(faces: [Option<RgbaImage>; 6], label: &str) -> [RgbaImage; 6] {
    let side = faces
        .iter()
        .flatten()
        .next()
        .map(|face| face.width().max(face.height()))
        .unwrap_or(1);

    faces.map(|face| match face {
        Some(face) if face.dimensions() == (side, side) => face,
        Some(face) => {
            log::warn!(
                "{label}: resizing face from {:?} to {:?}",
                face.dimensions(),
                (side, side)
            );
            image::imageops::resize(&face, side, side, FilterType::Triangle)
        }
        None => RgbaImage::from_pixel(side, side, PLACEHOLDER),
    })
}

pub struct Skybox {
    pub day: Texture,
    pub night: Texture,
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    pub uniform: SkyUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub pipeline: wgpu::RenderPipeline,
    rotation: Rad<f32>,
}

impl Skybox {
    pub async fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        day_faces: &[String; 6],
        night_faces: &[String; 6],
    ) -> anyhow::Result<Self> {
        let (day, night) = futures::join!(
            resources::load_cubemap_faces(day_faces),
            resources::load_cubemap_faces(night_faces)
        );
        let day = Texture::create_cubemap(device, queue, &assemble_faces(day, "day sky"), "day sky")?;
        let night =
            Texture::create_cubemap(device, queue, &assemble_faces(night, "night sky"), "night sky")?;

        let vertices = primitives::skybox_vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform = SkyUniform {
            view_proj: Matrix4::identity().into(),
            params: [0.0; 4],
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = mk_skybox_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&day.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&night.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&day.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: Some("skybox_bind_group"),
        });
        let pipeline = mk_skybox_pipeline(device, color_format, &layout);

        Ok(Self {
            day,
            night,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            uniform,
            buffer,
            bind_group,
            pipeline,
            rotation: Rad(0.0),
        })
    }

    pub fn rotation(&self) -> Rad<f32> {
        self.rotation
    }

    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        camera: &Camera,
        projection: &Projection,
        clock: &DayClock,
        dt: Duration,
    ) {
        self.rotation = advance_rotation(self.rotation, dt);
        self.uniform = SkyUniform::new(camera, projection, self.rotation, clock.day_weight());
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

fn advance_rotation(rotation: Rad<f32>, dt: Duration) -> Rad<f32> {
    let next = rotation + Rad::from(Deg(DEGREES_PER_SECOND * dt.as_secs_f32()));
    Rad(next.0.rem_euclid(std::f32::consts::TAU))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(size: u32, value: u8) -> Option<RgbaImage> {
        Some(RgbaImage::from_pixel(size, size, Rgba([value, value, value, 255])))
    }

    #[test]
    fn missing_faces_become_magenta_of_the_shared_size() {
        let faces = [None, face(4, 10), face(4, 20), None, face(4, 30), face(4, 40)];
        let faces = assemble_faces(faces, "test");
        assert!(faces.iter().all(|f| f.dimensions() == (4, 4)));
        assert_eq!(*faces[0].get_pixel(0, 0), PLACEHOLDER);
        assert_eq!(*faces[3].get_pixel(3, 3), PLACEHOLDER);
        assert_eq!(faces[1].get_pixel(0, 0)[0], 10);
    }

    #[test]
    fn nothing_loaded_gives_one_pixel_faces() {
        let faces = assemble_faces(Default::default(), "test");
        assert!(faces.iter().all(|f| f.dimensions() == (1, 1)));
        assert!(faces.iter().all(|f| *f.get_pixel(0, 0) == PLACEHOLDER));
    }

    #[test]
    fn mismatched_faces_are_resized_to_the_first() {
        let faces = [face(2, 1), face(8, 2), face(2, 3), face(2, 4), face(2, 5), face(2, 6)];
        let faces = assemble_faces(faces, "test");
        assert!(faces.iter().all(|f| f.dimensions() == (2, 2)));
        assert_eq!(faces[1].get_pixel(1, 1)[0], 2);
    }

    #[test]
    fn non_square_faces_become_square() {
        let wide = Some(RgbaImage::from_pixel(4, 2, Rgba([7, 7, 7, 255])));
        let faces = [wide, face(4, 2), None, face(3, 4), face(4, 5), face(4, 6)];
        let faces = assemble_faces(faces, "test");
        assert!(faces.iter().all(|f| f.dimensions() == (4, 4)));
        assert_eq!(faces[0].get_pixel(3, 3)[0], 7);
        assert_eq!(*faces[2].get_pixel(0, 0), PLACEHOLDER);
    }

    #[test]
    fn rotation_advances_ten_degrees_per_second_and_wraps() {
        let rotation = advance_rotation(Rad(0.0), Duration::from_secs(9));
        assert!((Deg::from(rotation).0 - 90.0).abs() < 1e-3);
        let rotation = advance_rotation(rotation, Duration::from_secs(36));
        assert!((Deg::from(rotation).0 - 90.0).abs() < 1e-2);
    }

    #[test]
    fn sky_uniform_ignores_camera_translation() {
        let projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        let near = Camera::home();
        let mut far = Camera::home();
        far.position = cgmath::Point3::new(50.0, -20.0, 7.0);
        let a = SkyUniform::new(&near, &projection, Rad(0.3), 0.5);
        let b = SkyUniform::new(&far, &projection, Rad(0.3), 0.5);
        for (col_a, col_b) in a.view_proj.iter().zip(b.view_proj.iter()) {
            for (x, y) in col_a.iter().zip(col_b.iter()) {
                assert!((x - y).abs() < 1e-5);
            }
        }
        assert_eq!(a.params[0], 0.5);
    }
}
