//! Per-frame state and draw submission.
//!
//! [`Renderer`] owns every GPU resource that is not tied to a window: the
//! camera and lights with their uniforms, the skybox, the depth buffer, the
//! G-buffer and all pipelines. It renders into any texture view, which keeps
//! it usable without a surface.

use instant::Duration;

use crate::{
    camera::{Camera, CameraController, CameraResources, Projection},
    clock::DayClock,
    config::{RenderPath, Settings},
    data_structures::{
        model::{DrawLight, DrawModel},
        texture::Texture,
    },
    lighting::{Lighting, ShadingControls},
    pipelines::{basic::mk_forward_pipeline, deferred::DeferredPipelines, light::LightResources},
    render::Instanced,
    resources,
    skybox::Skybox,
};

pub const CAMERA_SPEED: f32 = 2.5;
pub const MOUSE_SENSITIVITY: f32 = 0.1;

/// Mutable view of the camera, zoom, shading and render path. None of it
/// needs the GPU.
pub struct ViewControls<'a> {
    pub camera: &'a mut Camera,
    pub controller: &'a mut CameraController,
    pub projection: &'a mut Projection,
    pub shading: &'a mut ShadingControls,
    pub render_path: &'a mut RenderPath,
}

impl ViewControls<'_> {
    pub fn toggle_render_path(&mut self) {
        *self.render_path = self.render_path.toggled();
        log::info!("render path: {:?}", self.render_path);
    }

    /// Home camera, default zoom, free flight and default shading. The clock
    /// keeps running.
    pub fn reset_view(&mut self) {
        self.controller.reset(self.camera, self.projection);
        self.shading.reset();
        log::info!("view reset");
    }
}

pub struct Renderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub color_format: wgpu::TextureFormat,
    pub camera: CameraResources,
    pub projection: Projection,
    pub lighting: Lighting,
    pub lights: LightResources,
    pub shading: ShadingControls,
    pub clock: DayClock,
    pub skybox: Skybox,
    pub render_path: RenderPath,
    pub clear_colour: wgpu::Color,
    pub material_layout: wgpu::BindGroupLayout,
    depth_texture: Texture,
    forward: wgpu::RenderPipeline,
    deferred: DeferredPipelines,
    size: [u32; 2],
}

impl Renderer {
    pub async fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        settings: &Settings,
    ) -> anyhow::Result<Self> {
        let size = [width.max(1), height.max(1)];

        let projection = Projection::new(
            size[0],
            size[1],
            cgmath::Deg(settings.fov_degrees),
            settings.znear,
            settings.zfar,
        );
        let camera = CameraResources::new(
            &device,
            Camera::home(),
            CameraController::new(CAMERA_SPEED, MOUSE_SENSITIVITY),
            &projection,
        );

        let clock = DayClock::new(settings.time_scale);
        let shading = ShadingControls::default();
        let lighting = Lighting::default();
        let mut lights = LightResources::new(
            &device,
            color_format,
            &camera.bind_group_layout,
            lighting.to_uniform(&clock, &camera.camera, &shading),
        );
        lights.write_markers(&queue, lighting.point_lights());

        let material_layout = resources::material_layout(&device);
        let forward = mk_forward_pipeline(
            &device,
            color_format,
            &material_layout,
            &camera.bind_group_layout,
            &lights.bind_group_layout,
        );
        let deferred = DeferredPipelines::new(
            &device,
            color_format,
            &material_layout,
            &camera.bind_group_layout,
            &lights.bind_group_layout,
            size,
        );
        let depth_texture = Texture::create_depth_texture(&device, size, "depth_texture");

        let skybox = Skybox::load(
            &device,
            &queue,
            color_format,
            &settings.day_faces,
            &settings.night_faces,
        )
        .await?;

        Ok(Self {
            device,
            queue,
            color_format,
            camera,
            projection,
            lighting,
            lights,
            shading,
            clock,
            skybox,
            render_path: settings.render_path,
            clear_colour: settings.clear_colour,
            material_layout,
            depth_texture,
            forward,
            deferred,
            size,
        })
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Recreates the size-dependent targets. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = [width, height];
        self.projection.resize(width, height);
        self.depth_texture = Texture::create_depth_texture(&self.device, self.size, "depth_texture");
        self.deferred.resize(&self.device, self.size);
    }

    /// Borrows the state that key commands change.
    pub fn controls(&mut self) -> ViewControls<'_> {
        ViewControls {
            camera: &mut self.camera.camera,
            controller: &mut self.camera.controller,
            projection: &mut self.projection,
            shading: &mut self.shading,
            render_path: &mut self.render_path,
        }
    }

    pub fn toggle_render_path(&mut self) {
        self.controls().toggle_render_path();
    }

    pub fn reset_view(&mut self) {
        self.controls().reset_view();
    }

    /// Advances time, moves the camera and uploads every per-frame uniform.
    pub fn update(&mut self, dt: Duration) {
        self.clock.advance(dt);

        let camera = &mut self.camera;
        camera.controller.update(&mut camera.camera, &mut self.projection, dt);
        camera.write_to_buffer(&self.queue, &self.projection);

        let uniform = self
            .lighting
            .to_uniform(&self.clock, &self.camera.camera, &self.shading);
        self.lights.write_uniform(&self.queue, uniform);
        self.lights.write_markers(&self.queue, self.lighting.point_lights());

        self.skybox.update(
            &self.queue,
            &self.camera.camera,
            &self.projection,
            &self.clock,
            dt,
        );
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, draws: &[Instanced<'_>]) {
        match self.render_path {
            RenderPath::Forward => self.render_forward(encoder, view, draws),
            RenderPath::Deferred => self.render_deferred(encoder, view, draws),
        }
    }

    fn render_forward(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, draws: &[Instanced<'_>]) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(self.depth_attachment(wgpu::LoadOp::Clear(1.0))),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.forward);
        for draw in draws {
            render_pass.set_vertex_buffer(1, draw.instance.slice(..));
            render_pass.draw_model_instanced(
                draw.model,
                0..draw.amount as u32,
                &self.camera.bind_group,
                Some(&self.lights.bind_group),
            );
        }
        self.draw_overlays(&mut render_pass);
    }

    fn render_deferred(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, draws: &[Instanced<'_>]) {
        {
            let color_attachments = self.deferred.gbuffer.color_attachments();
            let mut geometry_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Geometry Pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment: Some(self.depth_attachment(wgpu::LoadOp::Clear(1.0))),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            geometry_pass.set_pipeline(&self.deferred.geometry);
            for draw in draws {
                geometry_pass.set_vertex_buffer(1, draw.instance.slice(..));
                geometry_pass.draw_model_instanced(
                    draw.model,
                    0..draw.amount as u32,
                    &self.camera.bind_group,
                    None,
                );
            }
        }

        {
            let mut lighting_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Deferred Lighting Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            lighting_pass.set_pipeline(&self.deferred.lighting);
            lighting_pass.set_bind_group(0, &self.deferred.gbuffer.bind_group, &[]);
            lighting_pass.set_bind_group(1, &self.lights.bind_group, &[]);
            // One triangle covering the screen
            lighting_pass.draw(0..3, 0..1);
        }

        let mut overlay_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(self.depth_attachment(wgpu::LoadOp::Load)),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        self.draw_overlays(&mut overlay_pass);
    }

    fn depth_attachment(&self, load: wgpu::LoadOp<f32>) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_texture.view,
            depth_ops: Some(wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }

    /// Light markers, then the sky behind everything.
    fn draw_overlays<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if self.lights.marker_count > 0 {
            render_pass.set_pipeline(&self.lights.marker_pipeline);
            render_pass.set_vertex_buffer(1, self.lights.marker_instances.slice(..));
            render_pass.draw_light_model_instanced(
                &self.lights.marker,
                0..self.lights.marker_count,
                &self.camera.bind_group,
            );
        }
        self.skybox.draw(render_pass);
    }
}
