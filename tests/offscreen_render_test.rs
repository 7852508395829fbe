#![cfg(feature = "integration-tests")]

mod common;

use common::test_utils::{MAGENTA, SIZE, headless_renderer, headless_settings, render_to_image};
use dusk_ngin::{
    camera::Camera,
    clock::DayPhase,
    config::RenderPath,
    data_structures::{instance::Instance, object::SceneObject},
    lighting::ShadingControls,
    render::Instanced,
    scene::green_material,
};

#[tokio::test]
async fn forward_path_shows_only_sky_without_objects() -> anyhow::Result<()> {
    let renderer = headless_renderer(&headless_settings(RenderPath::Forward)).await?;
    let image = render_to_image(&renderer, &[]).await?;
    for pixel in image.pixels() {
        assert_eq!(*pixel, MAGENTA);
    }
    Ok(())
}

#[tokio::test]
async fn deferred_path_shows_only_sky_without_objects() -> anyhow::Result<()> {
    let renderer = headless_renderer(&headless_settings(RenderPath::Deferred)).await?;
    let image = render_to_image(&renderer, &[]).await?;
    for pixel in image.pixels() {
        assert_eq!(*pixel, MAGENTA);
    }
    Ok(())
}

#[tokio::test]
async fn both_paths_shade_a_cube_in_front_of_the_camera() -> anyhow::Result<()> {
    let mut renderer = headless_renderer(&headless_settings(RenderPath::Forward)).await?;
    let cube = SceneObject::cube(
        &renderer.device,
        &renderer.queue,
        &renderer.material_layout,
        green_material(),
        Instance::new(),
    );
    let draws = [Instanced::from(&cube)];

    for path in [RenderPath::Forward, RenderPath::Deferred] {
        assert_eq!(renderer.render_path, path);
        let image = render_to_image(&renderer, &draws).await?;

        let center = *image.get_pixel(SIZE / 2, SIZE / 2);
        assert_ne!(center, MAGENTA, "{path:?}: the cube should cover the centre");
        assert!(
            center[1] >= center[0] && center[1] >= center[2],
            "{path:?}: expected a green surface, got {center:?}"
        );
        // The cube is small enough that the corners still show sky
        assert_eq!(*image.get_pixel(0, 0), MAGENTA, "{path:?}");

        renderer.toggle_render_path();
    }
    Ok(())
}

#[tokio::test]
async fn reset_view_keeps_the_clock_and_render_path() -> anyhow::Result<()> {
    let mut renderer = headless_renderer(&headless_settings(RenderPath::Forward)).await?;
    renderer.clock.set_time(21500.0);
    renderer.shading.toggle_blinn();
    renderer.toggle_render_path();
    let clock = renderer.clock;

    renderer.reset_view();
    assert_eq!(renderer.clock, clock);
    assert_eq!(renderer.clock.phase(), DayPhase::Dusk(0.5));
    assert_eq!(renderer.shading, ShadingControls::default());
    assert_eq!(renderer.camera.camera, Camera::home());
    assert_eq!(renderer.render_path, RenderPath::Deferred);
    Ok(())
}
