use std::{iter, time::Duration};

use anyhow::Context as _;
use dusk_ngin::{
    config::{RenderPath, Settings},
    render::Instanced,
    renderer::Renderer,
};

pub(crate) const SIZE: u32 = 256;
pub(crate) const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
/// Colour of a cubemap face whose image could not be loaded.
pub(crate) const MAGENTA: image::Rgba<u8> = image::Rgba([255, 0, 255, 255]);

/// Settings whose sky faces never resolve, so the whole sky is magenta.
pub(crate) fn headless_settings(render_path: RenderPath) -> Settings {
    let missing = ["px", "nx", "py", "ny", "pz", "nz"].map(|face| format!("missing/{face}.png"));
    Settings {
        render_path,
        day_faces: missing.clone(),
        night_faces: missing,
        ..Default::default()
    }
}

pub(crate) async fn headless_renderer(settings: &Settings) -> anyhow::Result<Renderer> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .context("no graphics adapter available for offscreen rendering")?;
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor::default())
        .await?;
    let mut renderer = Renderer::new(device, queue, FORMAT, SIZE, SIZE, settings).await?;
    renderer.update(Duration::ZERO);
    Ok(renderer)
}

/// Renders one frame into an offscreen texture and reads it back.
pub(crate) async fn render_to_image(
    renderer: &Renderer,
    draws: &[Instanced<'_>],
) -> anyhow::Result<image::RgbaImage> {
    let extent = wgpu::Extent3d {
        width: SIZE,
        height: SIZE,
        depth_or_array_layers: 1,
    };
    let texture = renderer.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Test Target"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = renderer
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Test Encoder"),
        });
    renderer.render(&mut encoder, &view, draws);

    // 256 pixels * 4 bytes already satisfies the 256 byte row alignment
    let bytes_per_row = 4 * SIZE;
    let output_buffer = renderer.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Offscreen Test Readback"),
        size: (bytes_per_row * SIZE) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE),
            },
        },
        extent,
    );
    renderer.queue.submit(iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    renderer.device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: Some(Duration::from_secs(3)),
    })?;
    rx.receive().await.context("readback was dropped")??;

    let data = buffer_slice.get_mapped_range().to_vec();
    output_buffer.unmap();
    image::RgbaImage::from_raw(SIZE, SIZE, data).context("readback has the wrong size")
}
