use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::{Instance, InstanceRaw},
        model::{Mesh, Model, ModelVertex, Vertex},
    },
    lighting::PointLight,
    pipelines::basic::{depth_state, mk_render_pipeline, opaque_target},
    primitives,
};

pub const MAX_POINT_LIGHTS: usize = 4;
pub const MAX_SPOT_LIGHTS: usize = 2;

const MARKER_SCALE: f32 = 0.2;

// Every field is a vec4 so the layout matches WGSL uniform alignment
// without explicit padding.

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirLightRaw {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub attenuation: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightRaw {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub attenuation: [f32; 4],
    /// x: cos(inner), y: cos(outer).
    pub cone: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub view_position: [f32; 4],
    pub directional: DirLightRaw,
    pub point_lights: [PointLightRaw; MAX_POINT_LIGHTS],
    pub spot_lights: [SpotLightRaw; MAX_SPOT_LIGHTS],
    /// Point count, spot count, Blinn-Phong flag, unused.
    pub counts: [u32; 4],
    /// Shininess scale, specular strength, unused, unused.
    pub tuning: [f32; 4],
}

pub struct LightResources {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub marker: Model,
    pub marker_instances: wgpu::Buffer,
    pub marker_count: u32,
    pub marker_pipeline: wgpu::RenderPipeline,
}

impl LightResources {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        uniform: LightsUniform,
    ) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);

        let marker = Model {
            meshes: vec![Mesh::from_geometry(device, "light marker", &primitives::cube(), 0)],
            materials: Vec::new(),
        };
        let marker_instances = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Marker Instances"),
            size: (MAX_POINT_LIGHTS * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let marker_pipeline = mk_marker_pipeline(device, color_format, camera_bind_group_layout);

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
            marker,
            marker_instances,
            marker_count: 0,
            marker_pipeline,
        }
    }

    pub fn write_uniform(&mut self, queue: &wgpu::Queue, uniform: LightsUniform) {
        self.uniform = uniform;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }

    /// Places a small cube on every point light.
    pub fn write_markers(&mut self, queue: &wgpu::Queue, lights: &[PointLight]) {
        let raw: Vec<InstanceRaw> = lights
            .iter()
            .take(MAX_POINT_LIGHTS)
            .map(|light| {
                Instance::from(cgmath::Vector3::new(
                    light.position.x,
                    light.position.y,
                    light.position.z,
                ))
                .with_uniform_scale(MARKER_SCALE)
                .to_raw()
            })
            .collect();
        self.marker_count = raw.len() as u32;
        if !raw.is_empty() {
            queue.write_buffer(&self.marker_instances, 0, bytemuck::cast_slice(&raw));
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, uniform: LightsUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Lights Uniform Buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<LightsUniform>() as u64),
            },
            count: None,
        }],
        label: Some("lights_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("lights_bind_group"),
    })
}

/// Unlit markers, tested against the scene's depth but drawn after it.
pub fn mk_marker_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Light Marker Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Light Marker Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("light_marker.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        "Light Marker Pipeline",
        &layout,
        &[opaque_target(color_format)],
        Some(depth_state(true, wgpu::CompareFunction::Less)),
        Some(wgpu::Face::Back),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}
