//! Two-pass deferred shading.
//!
//! The geometry pass writes world position, normal and albedo into a
//! [`GBuffer`], sharing the frame's depth buffer. The lighting pass then
//! runs the same shading code as the forward path once per covered pixel.

use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{
        LIGHTING_SHADER, MODEL_SHADER, compose_wgsl, depth_state, mk_render_pipeline,
        opaque_target,
    },
};

pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug)]
pub struct GBuffer {
    pub position: Texture,
    pub normal: Texture,
    pub albedo: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl GBuffer {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, size: [u32; 2]) -> Self {
        let position = Texture::create_render_target(device, size, POSITION_FORMAT, "gbuffer position");
        let normal = Texture::create_render_target(device, size, NORMAL_FORMAT, "gbuffer normal");
        let albedo = Texture::create_render_target(device, size, ALBEDO_FORMAT, "gbuffer albedo");

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&position.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&albedo.view),
                },
            ],
            label: Some("gbuffer_bind_group"),
        });

        Self {
            position,
            normal,
            albedo,
            bind_group,
        }
    }

    /// Attachments for the geometry pass. Everything clears to zero so the
    /// lighting pass can tell background pixels by `position.w`.
    pub fn color_attachments(&self) -> [Option<wgpu::RenderPassColorAttachment<'_>>; 3] {
        [&self.position, &self.normal, &self.albedo].map(|target| {
            Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })
        })
    }
}

pub fn mk_gbuffer_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[entry(0), entry(1), entry(2)],
        label: Some("gbuffer_bind_group_layout"),
    })
}

pub struct DeferredPipelines {
    pub geometry: wgpu::RenderPipeline,
    pub lighting: wgpu::RenderPipeline,
    pub gbuffer_layout: wgpu::BindGroupLayout,
    pub gbuffer: GBuffer,
}

impl DeferredPipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        material_bind_group_layout: &wgpu::BindGroupLayout,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
        size: [u32; 2],
    ) -> Self {
        let gbuffer_layout = mk_gbuffer_layout(device);
        let gbuffer = GBuffer::new(device, &gbuffer_layout, size);

        let geometry_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("GBuffer Pipeline Layout"),
            bind_group_layouts: &[material_bind_group_layout, camera_bind_group_layout],
            push_constant_ranges: &[],
        });
        let geometry = mk_render_pipeline(
            device,
            "GBuffer Pipeline",
            &geometry_layout,
            &[
                opaque_target(POSITION_FORMAT),
                opaque_target(NORMAL_FORMAT),
                opaque_target(ALBEDO_FORMAT),
            ],
            Some(depth_state(true, wgpu::CompareFunction::Less)),
            Some(wgpu::Face::Back),
            &[ModelVertex::desc(), InstanceRaw::desc()],
            compose_wgsl("GBuffer Shader", &[MODEL_SHADER, include_str!("gbuffer.wgsl")]),
        );

        let lighting_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Deferred Lighting Pipeline Layout"),
            bind_group_layouts: &[&gbuffer_layout, light_bind_group_layout],
            push_constant_ranges: &[],
        });
        let lighting = mk_render_pipeline(
            device,
            "Deferred Lighting Pipeline",
            &lighting_layout,
            &[opaque_target(color_format)],
            None,
            None,
            &[],
            compose_wgsl(
                "Deferred Lighting Shader",
                &[LIGHTING_SHADER, include_str!("deferred_lighting.wgsl")],
            ),
        );

        Self {
            geometry,
            lighting,
            gbuffer_layout,
            gbuffer,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        self.gbuffer = GBuffer::new(device, &self.gbuffer_layout, size);
    }
}
