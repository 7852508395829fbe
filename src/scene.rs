//! The demo scene: a textured backpack, two blue spheres (one swinging
//! along X and carrying the reflector spotlight) and a green cube.

use cgmath::{EuclideanSpace, Point3};
use instant::Duration;
use winit::{
    event::{DeviceEvent, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::{
    camera::CameraMode,
    context::{Context, InitContext},
    data_structures::{instance::Instance, model::MaterialUniform, object::SceneObject},
    flow::{FlowConstructor, GraphicsFlow, Out},
    lighting::reflector_pose,
    render::Render,
    renderer::ViewControls,
    resources,
};

pub const SPHERE_SCALE: f32 = 0.5;
pub const STATIC_SPHERE_POSITION: Point3<f32> = Point3::new(0.0, 0.0, 5.0);
pub const MOVING_SPHERE_REST: Point3<f32> = Point3::new(5.0, 0.0, 0.0);
/// Peak distance of the moving sphere from its rest centre.
pub const MOVING_SPHERE_SWING: f32 = 2.0;
pub const CUBE_POSITION: Point3<f32> = Point3::new(10.0, 0.0, 0.0);
pub const CUBE_SCALE: f32 = 2.0;
/// Where the reflector aims. Short of the cube centre, so the beam lands on
/// the near face.
pub const REFLECTOR_TARGET: Point3<f32> = Point3::new(8.0, 0.0, 0.0);

pub fn blue_material() -> MaterialUniform {
    MaterialUniform::solid([0.2, 0.2, 0.8], [0.3, 0.3, 0.8], [1.0, 1.0, 1.0], 32.0)
}

pub fn green_material() -> MaterialUniform {
    MaterialUniform::solid([0.1, 0.7, 0.1], [0.3, 0.7, 0.3], [1.0, 1.0, 1.0], 50.0)
}

/// Centre of the moving sphere `seconds` after start-up.
pub fn moving_sphere_center(seconds: f32) -> Point3<f32> {
    Point3::new(
        MOVING_SPHERE_REST.x + seconds.sin() * MOVING_SPHERE_SWING,
        MOVING_SPHERE_REST.y,
        MOVING_SPHERE_REST.z,
    )
}

fn placed_at(position: Point3<f32>, scale: f32) -> Instance {
    Instance::from(position.to_vec()).with_uniform_scale(scale)
}

/// Discrete key commands. Movement keys are handled by the camera controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleFollow,
    ToggleOrbit,
    ToggleOverview,
    SharpenHighlights,
    SoftenHighlights,
    BrightenSpecular,
    DimSpecular,
    ToggleBlinn,
    Reset,
    ToggleRenderPath,
    Quit,
}

impl Command {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        let command = match key {
            KeyCode::KeyF => Command::ToggleFollow,
            KeyCode::KeyG => Command::ToggleOrbit,
            KeyCode::KeyH => Command::ToggleOverview,
            KeyCode::KeyU => Command::SharpenHighlights,
            KeyCode::KeyI => Command::SoftenHighlights,
            KeyCode::KeyJ => Command::BrightenSpecular,
            KeyCode::KeyK => Command::DimSpecular,
            KeyCode::KeyB => Command::ToggleBlinn,
            KeyCode::KeyR => Command::Reset,
            KeyCode::KeyP => Command::ToggleRenderPath,
            KeyCode::Escape => Command::Quit,
            _ => return None,
        };
        Some(command)
    }

    pub fn apply(self, ctx: &mut Context) {
        self.apply_to(&mut ctx.renderer.controls());
    }

    pub fn apply_to(self, controls: &mut ViewControls<'_>) {
        match self {
            Command::ToggleFollow => controls.controller.toggle_mode(CameraMode::Follow),
            Command::ToggleOrbit => controls.controller.toggle_mode(CameraMode::Orbit),
            Command::ToggleOverview => controls.controller.toggle_mode(CameraMode::Overview),
            Command::SharpenHighlights => controls.shading.sharpen(),
            Command::SoftenHighlights => controls.shading.soften(),
            Command::BrightenSpecular => controls.shading.brighten(),
            Command::DimSpecular => controls.shading.dim(),
            Command::ToggleBlinn => controls.shading.toggle_blinn(),
            Command::Reset => controls.reset_view(),
            Command::ToggleRenderPath => controls.toggle_render_path(),
            Command::Quit => (),
        }
    }
}

pub struct DemoScene {
    backpack: Option<SceneObject>,
    static_sphere: SceneObject,
    moving_sphere: SceneObject,
    cube: SceneObject,
    queue: wgpu::Queue,
    elapsed: f32,
}

impl DemoScene {
    pub async fn new(init: InitContext) -> Self {
        let InitContext {
            device,
            queue,
            material_layout,
            settings,
        } = init;

        let backpack = match resources::load_model_obj(
            &settings.model,
            &device,
            &queue,
            &material_layout,
        )
        .await
        {
            Ok(model) => Some(SceneObject::from_model(&device, model, Instance::new())),
            Err(e) => {
                log::error!("skipping model {}: {e:#}", settings.model);
                None
            }
        };

        let static_sphere = SceneObject::sphere(
            &device,
            &queue,
            &material_layout,
            blue_material(),
            placed_at(STATIC_SPHERE_POSITION, SPHERE_SCALE),
        );
        let moving_sphere = SceneObject::sphere(
            &device,
            &queue,
            &material_layout,
            blue_material(),
            placed_at(moving_sphere_center(0.0), SPHERE_SCALE),
        );
        let cube = SceneObject::cube(
            &device,
            &queue,
            &material_layout,
            green_material(),
            placed_at(CUBE_POSITION, CUBE_SCALE),
        );

        Self {
            backpack,
            static_sphere,
            moving_sphere,
            cube,
            queue,
            elapsed: 0.0,
        }
    }

    pub fn constructor() -> FlowConstructor {
        Box::new(|init: InitContext| {
            Box::pin(async move { Box::new(DemoScene::new(init).await) as Box<dyn GraphicsFlow> })
        })
    }
}

/// Points the follow camera at the moving sphere and mounts the reflector on it.
fn track_moving_sphere(ctx: &mut Context, center: Point3<f32>) {
    ctx.renderer.camera.controller.set_follow_target(center);
    let (position, direction) =
        reflector_pose(center, MOVING_SPHERE_REST, SPHERE_SCALE, REFLECTOR_TARGET);
    ctx.renderer.lighting.place_reflector(position, direction);
}

impl GraphicsFlow for DemoScene {
    fn on_init(&mut self, ctx: &mut Context) -> Out {
        log::info!(
            "controls: WASD move, mouse look, scroll zoom, F/G/H camera modes, \
             U/I shininess, J/K specular, B Blinn-Phong, P render path, R reset, Esc quit"
        );
        track_moving_sphere(ctx, moving_sphere_center(self.elapsed));
        Out::Empty
    }

    fn on_update(&mut self, _ctx: &Context, dt: Duration) -> Out {
        self.elapsed += dt.as_secs_f32();
        let center = moving_sphere_center(self.elapsed);
        self.moving_sphere.set_instance(placed_at(center, SPHERE_SCALE));
        self.moving_sphere.write_to_buffer(&self.queue);
        Out::Configure(Box::new(move |ctx: &mut Context| {
            track_moving_sphere(ctx, center)
        }))
    }

    fn on_window_events(&mut self, _ctx: &Context, event: &WindowEvent) -> Out {
        let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state,
                    repeat: false,
                    ..
                },
            ..
        } = event
        else {
            return Out::Empty;
        };
        if !state.is_pressed() {
            return Out::Empty;
        }
        match Command::from_key(*key) {
            Some(Command::Quit) => Out::Exit,
            Some(command) => Out::Configure(Box::new(move |ctx: &mut Context| command.apply(ctx))),
            None => Out::Empty,
        }
    }

    fn on_device_events(&mut self, _ctx: &Context, _event: &DeviceEvent) -> Out {
        Out::Empty
    }

    fn on_render(&self) -> Render<'_> {
        Render::Composed(vec![
            self.backpack.as_ref().into(),
            Render::Defaults(vec![
                (&self.static_sphere).into(),
                (&self.moving_sphere).into(),
                (&self.cube).into(),
            ]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        camera::{Camera, CameraController, Projection},
        config::RenderPath,
        lighting::ShadingControls,
    };
    use cgmath::{Deg, InnerSpace};

    #[test]
    fn letter_keys_map_to_commands() {
        assert_eq!(Command::from_key(KeyCode::KeyF), Some(Command::ToggleFollow));
        assert_eq!(Command::from_key(KeyCode::KeyG), Some(Command::ToggleOrbit));
        assert_eq!(Command::from_key(KeyCode::KeyH), Some(Command::ToggleOverview));
        assert_eq!(Command::from_key(KeyCode::KeyU), Some(Command::SharpenHighlights));
        assert_eq!(Command::from_key(KeyCode::KeyI), Some(Command::SoftenHighlights));
        assert_eq!(Command::from_key(KeyCode::KeyJ), Some(Command::BrightenSpecular));
        assert_eq!(Command::from_key(KeyCode::KeyK), Some(Command::DimSpecular));
        assert_eq!(Command::from_key(KeyCode::KeyB), Some(Command::ToggleBlinn));
        assert_eq!(Command::from_key(KeyCode::KeyR), Some(Command::Reset));
        assert_eq!(Command::from_key(KeyCode::KeyP), Some(Command::ToggleRenderPath));
        assert_eq!(Command::from_key(KeyCode::Escape), Some(Command::Quit));
    }

    #[test]
    fn movement_keys_are_left_to_the_camera() {
        for key in [KeyCode::KeyW, KeyCode::KeyA, KeyCode::KeyS, KeyCode::KeyD, KeyCode::Space] {
            assert_eq!(Command::from_key(key), None);
        }
    }

    #[test]
    fn moving_sphere_swings_around_its_rest_centre() {
        assert_eq!(moving_sphere_center(0.0), MOVING_SPHERE_REST);
        let peak = moving_sphere_center(std::f32::consts::FRAC_PI_2);
        assert!((peak.x - 7.0).abs() < 1e-5);
        assert_eq!((peak.y, peak.z), (0.0, 0.0));
        let trough = moving_sphere_center(3.0 * std::f32::consts::FRAC_PI_2);
        assert!((trough.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn materials_keep_their_shininess() {
        assert_eq!(blue_material().shininess(), 32.0);
        assert_eq!(green_material().shininess(), 50.0);
    }

    #[test]
    fn reflector_aims_at_the_near_face_of_the_cube() {
        let (position, direction) = reflector_pose(
            MOVING_SPHERE_REST,
            MOVING_SPHERE_REST,
            SPHERE_SCALE,
            REFLECTOR_TARGET,
        );
        assert_eq!(position, Point3::new(5.5, 0.0, 0.0));
        assert!((direction - cgmath::Vector3::unit_x()).magnitude() < 1e-5);
        assert!(REFLECTOR_TARGET.x < CUBE_POSITION.x);
    }

    struct View {
        camera: Camera,
        controller: CameraController,
        projection: Projection,
        shading: ShadingControls,
        render_path: RenderPath,
    }

    impl View {
        fn new() -> Self {
            Self {
                camera: Camera::home(),
                controller: CameraController::new(2.5, 0.1),
                projection: Projection::new(800, 600, Deg(45.0), 0.1, 100.0),
                shading: ShadingControls::default(),
                render_path: RenderPath::Forward,
            }
        }

        fn run(&mut self, command: Command) {
            command.apply_to(&mut ViewControls {
                camera: &mut self.camera,
                controller: &mut self.controller,
                projection: &mut self.projection,
                shading: &mut self.shading,
                render_path: &mut self.render_path,
            });
        }
    }

    #[test]
    fn mode_commands_toggle_the_camera() {
        let mut view = View::new();
        for (command, mode) in [
            (Command::ToggleFollow, CameraMode::Follow),
            (Command::ToggleOrbit, CameraMode::Orbit),
            (Command::ToggleOverview, CameraMode::Overview),
        ] {
            view.run(command);
            assert_eq!(view.controller.mode(), mode);
            view.run(command);
            assert_eq!(view.controller.mode(), CameraMode::Free);
        }
    }

    #[test]
    fn shading_commands_adjust_highlights() {
        let mut view = View::new();
        view.run(Command::SharpenHighlights);
        assert_eq!(view.shading.shininess_scale, 2.0);
        view.run(Command::SoftenHighlights);
        view.run(Command::SoftenHighlights);
        assert_eq!(view.shading.shininess_scale, 0.5);

        view.run(Command::BrightenSpecular);
        assert!((view.shading.specular_strength - 1.1).abs() < 1e-5);
        view.run(Command::DimSpecular);
        view.run(Command::DimSpecular);
        assert!((view.shading.specular_strength - 0.9).abs() < 1e-5);

        view.run(Command::ToggleBlinn);
        assert!(view.shading.blinn);
        view.run(Command::ToggleBlinn);
        assert!(!view.shading.blinn);
    }

    #[test]
    fn render_path_command_flips_the_path() {
        let mut view = View::new();
        view.run(Command::ToggleRenderPath);
        assert_eq!(view.render_path, RenderPath::Deferred);
        view.run(Command::ToggleRenderPath);
        assert_eq!(view.render_path, RenderPath::Forward);
    }

    #[test]
    fn reset_restores_the_view_but_not_the_render_path() {
        let mut view = View::new();
        view.camera.position = Point3::new(3.0, 4.0, 5.0);
        view.camera.look_at(Point3::new(0.0, 0.0, 0.0));
        view.projection.zoom(20.0);
        view.run(Command::ToggleOrbit);
        view.run(Command::SharpenHighlights);
        view.run(Command::BrightenSpecular);
        view.run(Command::ToggleBlinn);
        view.run(Command::ToggleRenderPath);

        view.run(Command::Reset);
        assert_eq!(view.camera, Camera::home());
        assert_eq!(view.controller.mode(), CameraMode::Free);
        assert_eq!(
            view.projection,
            Projection::new(800, 600, Deg(45.0), 0.1, 100.0)
        );
        assert_eq!(view.shading, ShadingControls::default());
        assert_eq!(view.render_path, RenderPath::Deferred);
    }

    #[test]
    fn quit_leaves_the_view_alone() {
        let mut view = View::new();
        view.run(Command::Quit);
        assert_eq!(view.camera, Camera::home());
        assert_eq!(view.shading, ShadingControls::default());
        assert_eq!(view.render_path, RenderPath::Forward);
    }
}
