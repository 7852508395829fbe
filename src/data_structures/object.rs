//! A model placed in the world with its own instance buffer.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::{MaterialUniform, Model},
    },
    primitives,
};

#[derive(Debug)]
pub struct SceneObject {
    pub model: Model,
    pub instance: Instance,
    pub instance_buffer: wgpu::Buffer,
}

impl SceneObject {
    pub fn from_model(device: &wgpu::Device, model: Model, instance: Instance) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&[instance.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            model,
            instance,
            instance_buffer,
        }
    }

    /// A 64x64 UV sphere with a solid material.
    pub fn sphere(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        material: MaterialUniform,
        instance: Instance,
    ) -> Self {
        let geometry = primitives::uv_sphere(primitives::SPHERE_SEGMENTS, primitives::SPHERE_SEGMENTS);
        let model = Model::from_geometry(device, queue, "sphere", &geometry, material, layout);
        Self::from_model(device, model, instance)
    }

    pub fn cube(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        material: MaterialUniform,
        instance: Instance,
    ) -> Self {
        let model = Model::from_geometry(device, queue, "cube", &primitives::cube(), material, layout);
        Self::from_model(device, model, instance)
    }

    pub fn set_instance(&mut self, instance: Instance) {
        self.instance = instance;
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.instance.to_raw()]),
        );
    }
}
