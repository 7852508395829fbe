//! Camera, projection and the controller that moves them.
//!
//! The camera is a yaw/pitch fly camera. The [`CameraController`] turns
//! keyboard, mouse and scroll input into movement while in
//! [`CameraMode::Free`], and drives the camera along scripted paths in the
//! other modes.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const MAX_PITCH_DEGREES: f32 = 89.0;
const MIN_FOV_DEGREES: f32 = 1.0;
const MAX_FOV_DEGREES: f32 = 45.0;

pub const HOME_POSITION: [f32; 3] = [0.0, 0.0, 3.0];
pub const HOME_YAW_DEGREES: f32 = -90.0;
pub const HOME_PITCH_DEGREES: f32 = 0.0;

const FOLLOW_OFFSET: Vector3<f32> = Vector3::new(0.0, 2.0, 6.0);
const ORBIT_RADIUS: f32 = 15.0;
const ORBIT_HEIGHT: f32 = 4.0;
const ORBIT_DEGREES_PER_SECOND: f32 = 20.0;
const OVERVIEW_POSITION: Point3<f32> = Point3::new(5.0, 18.0, 12.0);
const OVERVIEW_TARGET: Point3<f32> = Point3::new(5.0, 0.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// The pose the demo starts in and returns to on reset.
    pub fn home() -> Self {
        Self::new(
            HOME_POSITION,
            cgmath::Deg(HOME_YAW_DEGREES),
            cgmath::Deg(HOME_PITCH_DEGREES),
        )
    }

    pub fn front(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.front().cross(Vector3::unit_y()).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front(), Vector3::unit_y())
    }

    /// Turns the camera towards `target`. Does nothing if it sits on the camera.
    pub fn look_at(&mut self, target: Point3<f32>) {
        let direction = target - self.position;
        let distance = direction.magnitude();
        if distance <= f32::EPSILON {
            return;
        }
        self.yaw = Rad(direction.z.atan2(direction.x));
        self.pitch = Rad((direction.y / distance).asin());
        self.clamp_pitch();
    }

    fn clamp_pitch(&mut self) {
        let limit = Rad::from(cgmath::Deg(MAX_PITCH_DEGREES));
        if self.pitch < -limit {
            self.pitch = -limit;
        } else if self.pitch > limit {
            self.pitch = limit;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    aspect: f32,
    pub fovy: Rad<f32>,
    default_fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let fovy = fovy.into();
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy,
            default_fovy: fovy,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Narrows the field of view by `degrees`, clamped to 1°..45°.
    pub fn zoom(&mut self, degrees: f32) {
        let fovy = cgmath::Deg::from(self.fovy).0 - degrees;
        self.fovy = cgmath::Deg(fovy.clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES)).into();
    }

    pub fn reset_zoom(&mut self) {
        self.fovy = self.default_fovy;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    Free,
    /// Trails the moving sphere.
    Follow,
    /// Circles the scene.
    Orbit,
    /// Fixed high vantage point.
    Overview,
}

#[derive(Debug)]
pub struct CameraController {
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_up: f32,
    amount_down: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    speed: f32,
    sensitivity: f32,
    mode: CameraMode,
    follow_target: Point3<f32>,
    orbit_angle: Rad<f32>,
}

impl CameraController {
    /// `speed` is in units per second, `sensitivity` in degrees per pixel.
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            speed,
            sensitivity,
            mode: CameraMode::Free,
            follow_target: Point3::new(0.0, 0.0, 0.0),
            orbit_angle: Rad(0.0),
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Switches to `mode`, or back to free flight if `mode` is already active.
    pub fn toggle_mode(&mut self, mode: CameraMode) {
        self.mode = if self.mode == mode {
            CameraMode::Free
        } else {
            mode
        };
        log::info!("camera mode: {:?}", self.mode);
    }

    pub fn set_follow_target(&mut self, target: Point3<f32>) {
        self.follow_target = target;
    }

    pub fn reset(&mut self, camera: &mut Camera, projection: &mut Projection) {
        *camera = Camera::home();
        projection.reset_zoom();
        self.mode = CameraMode::Free;
        self.orbit_angle = Rad(0.0);
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.scroll = 0.0;
    }

    /// Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        let amount = if state.is_pressed() { 1.0 } else { 0.0 };
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.amount_forward = amount;
                true
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.amount_backward = amount;
                true
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.amount_left = amount;
                true
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.amount_right = amount;
                true
            }
            KeyCode::Space => {
                self.amount_up = amount;
                true
            }
            KeyCode::ShiftLeft => {
                self.amount_down = amount;
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        self.rotate_horizontal += mouse_dx as f32;
        self.rotate_vertical += mouse_dy as f32;
    }

    pub fn handle_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => *lines,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
        };
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                self.handle_key(*key, *state);
            }
            WindowEvent::MouseWheel { delta, .. } => self.handle_scroll(delta),
            _ => (),
        }
    }

    pub fn update(&mut self, camera: &mut Camera, projection: &mut Projection, dt: Duration) {
        let dt = dt.as_secs_f32();

        projection.zoom(self.scroll);
        self.scroll = 0.0;

        match self.mode {
            CameraMode::Free => {
                let velocity = self.speed * dt;
                let front = camera.front();
                let right = camera.right();
                camera.position += front * (self.amount_forward - self.amount_backward) * velocity;
                camera.position += right * (self.amount_right - self.amount_left) * velocity;
                camera.position.y += (self.amount_up - self.amount_down) * velocity;

                // Mouse up is a negative delta and should raise the view
                camera.yaw += Rad::from(cgmath::Deg(self.rotate_horizontal * self.sensitivity));
                camera.pitch -= Rad::from(cgmath::Deg(self.rotate_vertical * self.sensitivity));
                camera.clamp_pitch();
            }
            CameraMode::Follow => {
                camera.position = self.follow_target + FOLLOW_OFFSET;
                camera.look_at(self.follow_target);
            }
            CameraMode::Orbit => {
                self.orbit_angle += Rad::from(cgmath::Deg(ORBIT_DEGREES_PER_SECOND * dt));
                self.orbit_angle = Rad(self.orbit_angle.0.rem_euclid(TAU));
                let (sin, cos) = self.orbit_angle.0.sin_cos();
                camera.position = Point3::new(ORBIT_RADIUS * cos, ORBIT_HEIGHT, ORBIT_RADIUS * sin);
                camera.look_at(Point3::new(0.0, 0.0, 0.0));
            }
            CameraMode::Overview => {
                camera.position = OVERVIEW_POSITION;
                camera.look_at(OVERVIEW_TARGET);
            }
        }

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: Camera,
        controller: CameraController,
        projection: &Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, EuclideanSpace};

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    fn projection() -> Projection {
        Projection::new(800, 600, Deg(45.0), 0.1, 100.0)
    }

    #[test]
    fn home_camera_looks_down_negative_z() {
        let camera = Camera::home();
        assert!(approx(camera.front(), Vector3::new(0.0, 0.0, -1.0)));
        assert!(approx(camera.right(), Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn look_at_points_front_at_target() {
        let mut camera = Camera::home();
        let target = Point3::new(4.0, 1.0, -2.0);
        camera.look_at(target);
        let expected = (target - camera.position).normalize();
        assert!(approx(camera.front(), expected));
    }

    #[test]
    fn look_at_ignores_own_position() {
        let mut camera = Camera::home();
        camera.look_at(camera.position);
        assert_eq!(camera, Camera::home());
    }

    #[test]
    fn forward_key_moves_along_front() {
        let mut camera = Camera::home();
        let mut projection = projection();
        let mut controller = CameraController::new(2.5, 0.1);
        controller.handle_key(KeyCode::KeyW, ElementState::Pressed);
        controller.update(&mut camera, &mut projection, Duration::from_secs(2));
        assert!(approx(camera.position.to_vec(), Vector3::new(0.0, 0.0, -2.0)));

        controller.handle_key(KeyCode::KeyW, ElementState::Released);
        controller.update(&mut camera, &mut projection, Duration::from_secs(2));
        assert!(approx(camera.position.to_vec(), Vector3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn mouse_up_raises_pitch_and_is_clamped() {
        let mut camera = Camera::home();
        let mut projection = projection();
        let mut controller = CameraController::new(2.5, 0.1);
        controller.handle_mouse(0.0, -100.0);
        controller.update(&mut camera, &mut projection, Duration::from_millis(16));
        assert!((Deg::from(camera.pitch).0 - 10.0).abs() < 1e-3);

        controller.handle_mouse(0.0, -10_000.0);
        controller.update(&mut camera, &mut projection, Duration::from_millis(16));
        assert!((Deg::from(camera.pitch).0 - MAX_PITCH_DEGREES).abs() < 1e-3);
    }

    #[test]
    fn scroll_zoom_is_clamped() {
        let mut camera = Camera::home();
        let mut projection = projection();
        let mut controller = CameraController::new(2.5, 0.1);
        controller.handle_scroll(&MouseScrollDelta::LineDelta(0.0, 5.0));
        controller.update(&mut camera, &mut projection, Duration::ZERO);
        assert!((Deg::from(projection.fovy).0 - 40.0).abs() < 1e-4);

        controller.handle_scroll(&MouseScrollDelta::LineDelta(0.0, 100.0));
        controller.update(&mut camera, &mut projection, Duration::ZERO);
        assert!((Deg::from(projection.fovy).0 - MIN_FOV_DEGREES).abs() < 1e-4);

        controller.handle_scroll(&MouseScrollDelta::LineDelta(0.0, -100.0));
        controller.update(&mut camera, &mut projection, Duration::ZERO);
        assert!((Deg::from(projection.fovy).0 - MAX_FOV_DEGREES).abs() < 1e-4);
    }

    #[test]
    fn toggling_the_active_mode_returns_to_free() {
        let mut controller = CameraController::new(2.5, 0.1);
        controller.toggle_mode(CameraMode::Follow);
        assert_eq!(controller.mode(), CameraMode::Follow);
        controller.toggle_mode(CameraMode::Orbit);
        assert_eq!(controller.mode(), CameraMode::Orbit);
        controller.toggle_mode(CameraMode::Orbit);
        assert_eq!(controller.mode(), CameraMode::Free);
    }

    #[test]
    fn follow_mode_trails_target_and_ignores_keys() {
        let mut camera = Camera::home();
        let mut projection = projection();
        let mut controller = CameraController::new(2.5, 0.1);
        let target = Point3::new(6.0, 0.0, 0.0);
        controller.set_follow_target(target);
        controller.toggle_mode(CameraMode::Follow);
        controller.handle_key(KeyCode::KeyW, ElementState::Pressed);
        controller.update(&mut camera, &mut projection, Duration::from_secs(1));

        assert!(approx(camera.position.to_vec(), Vector3::new(6.0, 2.0, 6.0)));
        assert!(approx(camera.front(), (target - camera.position).normalize()));
    }

    #[test]
    fn orbit_mode_stays_on_its_circle() {
        let mut camera = Camera::home();
        let mut projection = projection();
        let mut controller = CameraController::new(2.5, 0.1);
        controller.toggle_mode(CameraMode::Orbit);
        for _ in 0..10 {
            controller.update(&mut camera, &mut projection, Duration::from_millis(500));
            let horizontal = Vector3::new(camera.position.x, 0.0, camera.position.z).magnitude();
            assert!((horizontal - ORBIT_RADIUS).abs() < 1e-3);
            assert_eq!(camera.position.y, ORBIT_HEIGHT);
        }
    }

    #[test]
    fn reset_restores_home_pose_and_zoom() {
        let mut camera = Camera::new((3.0, 3.0, 3.0), Deg(10.0), Deg(10.0));
        let mut projection = projection();
        projection.zoom(20.0);
        let mut controller = CameraController::new(2.5, 0.1);
        controller.toggle_mode(CameraMode::Overview);
        controller.reset(&mut camera, &mut projection);

        assert_eq!(camera, Camera::home());
        assert_eq!(projection.fovy, Rad::from(Deg(45.0)));
        assert_eq!(controller.mode(), CameraMode::Free);
    }
}
