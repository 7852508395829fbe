//! Light sources and the shading knobs the demo exposes.
//!
//! Everything here is plain CPU-side state. [`Lighting::to_uniform`] packs it
//! into the [`LightsUniform`] the shaders read, once per frame.

use bytemuck::Zeroable;
use cgmath::{InnerSpace, Point3, Vector3};

use crate::{
    camera::Camera,
    clock::DayClock,
    pipelines::light::{
        DirLightRaw, LightsUniform, MAX_POINT_LIGHTS, PointLightRaw, SpotLightRaw,
    },
};

pub const DEFAULT_POINT_LIGHT: Point3<f32> = Point3::new(0.7, 0.2, 2.0);

const SUN_DIRECTION: Vector3<f32> = Vector3::new(-0.2, -1.0, -0.3);
const SPOT_CUT_OFF_DEGREES: f32 = 12.5;
const SPOT_OUTER_CUT_OFF_DEGREES: f32 = 15.0;

const MIN_SHININESS_SCALE: f32 = 1.0 / 16.0;
const MAX_SHININESS_SCALE: f32 = 16.0;
const SPECULAR_STEP: f32 = 0.1;
const MAX_SPECULAR_STRENGTH: f32 = 4.0;

fn vec4(v: Vector3<f32>, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

/// `a` at `w = 0`, exactly `b` at `w = 1`.
fn mix(a: Vector3<f32>, b: Vector3<f32>, w: f32) -> Vector3<f32> {
    a * (1.0 - w) + b * w
}

fn splat(v: f32) -> Vector3<f32> {
    Vector3::new(v, v, v)
}

/// Distance falloff `1 / (constant + linear * d + quadratic * d²)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    /// Reaches roughly fifty units.
    pub const MEDIUM: Self = Self {
        constant: 1.0,
        linear: 0.09,
        quadratic: 0.032,
    };

    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    fn to_raw(self) -> [f32; 4] {
        [self.constant, self.linear, self.quadratic, 0.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl DirectionalLight {
    pub fn night() -> Self {
        Self {
            direction: SUN_DIRECTION,
            ambient: Vector3::new(0.01, 0.01, 0.02),
            diffuse: Vector3::new(0.1, 0.1, 0.15),
            specular: Vector3::new(0.2, 0.2, 0.3),
        }
    }

    pub fn day() -> Self {
        Self {
            direction: SUN_DIRECTION,
            ambient: Vector3::new(0.03, 0.03, 0.04),
            diffuse: Vector3::new(1.0, 0.95, 0.8),
            specular: Vector3::new(1.0, 0.9, 0.7),
        }
    }

    /// The sun for the clock's time of day.
    pub fn at(clock: &DayClock) -> Self {
        let night = Self::night();
        let day = Self::day();
        let w = clock.day_weight();
        Self {
            direction: SUN_DIRECTION,
            ambient: mix(night.ambient, day.ambient, w),
            diffuse: mix(night.diffuse, day.diffuse, w),
            specular: mix(night.specular, day.specular, w),
        }
    }

    fn to_raw(self) -> DirLightRaw {
        DirLightRaw {
            direction: vec4(self.direction, 0.0),
            ambient: vec4(self.ambient, 1.0),
            diffuse: vec4(self.diffuse, 1.0),
            specular: vec4(self.specular, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Point3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub attenuation: Attenuation,
}

impl PointLight {
    pub fn at(position: Point3<f32>) -> Self {
        Self {
            position,
            ambient: splat(0.05),
            diffuse: splat(0.8),
            specular: splat(1.0),
            attenuation: Attenuation::MEDIUM,
        }
    }

    fn to_raw(self) -> PointLightRaw {
        PointLightRaw {
            position: [self.position.x, self.position.y, self.position.z, 1.0],
            ambient: vec4(self.ambient, 1.0),
            diffuse: vec4(self.diffuse, 1.0),
            specular: vec4(self.specular, 1.0),
            attenuation: self.attenuation.to_raw(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub attenuation: Attenuation,
    /// Cosine of the inner cone half-angle.
    pub cut_off: f32,
    /// Cosine of the outer cone half-angle.
    pub outer_cut_off: f32,
}

impl SpotLight {
    fn cone(
        position: Point3<f32>,
        direction: Vector3<f32>,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
    ) -> Self {
        Self {
            position,
            direction,
            ambient,
            diffuse,
            specular: splat(1.0),
            attenuation: Attenuation::MEDIUM,
            cut_off: SPOT_CUT_OFF_DEGREES.to_radians().cos(),
            outer_cut_off: SPOT_OUTER_CUT_OFF_DEGREES.to_radians().cos(),
        }
    }

    /// The blue lamp riding on the moving sphere.
    pub fn reflector(position: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self::cone(
            position,
            direction,
            Vector3::new(0.2, 0.2, 0.8),
            Vector3::new(0.3, 0.3, 0.8),
        )
    }

    /// The white torch held by the camera.
    pub fn flashlight(position: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self::cone(position, direction, splat(0.0), splat(1.0))
    }

    fn to_raw(self) -> SpotLightRaw {
        SpotLightRaw {
            position: [self.position.x, self.position.y, self.position.z, 1.0],
            direction: vec4(self.direction, 0.0),
            ambient: vec4(self.ambient, 1.0),
            diffuse: vec4(self.diffuse, 1.0),
            specular: vec4(self.specular, 1.0),
            attenuation: self.attenuation.to_raw(),
            cone: [self.cut_off, self.outer_cut_off, 0.0, 0.0],
        }
    }
}

/// Runtime material tweaks bound to B, U, I, J and K.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingControls {
    pub blinn: bool,
    pub shininess_scale: f32,
    pub specular_strength: f32,
}

impl Default for ShadingControls {
    fn default() -> Self {
        Self {
            blinn: false,
            shininess_scale: 1.0,
            specular_strength: 1.0,
        }
    }
}

impl ShadingControls {
    pub fn toggle_blinn(&mut self) {
        self.blinn = !self.blinn;
        log::info!("blinn-phong: {}", self.blinn);
    }

    pub fn sharpen(&mut self) {
        self.scale_shininess(2.0);
    }

    pub fn soften(&mut self) {
        self.scale_shininess(0.5);
    }

    pub fn brighten(&mut self) {
        self.shift_specular(SPECULAR_STEP);
    }

    pub fn dim(&mut self) {
        self.shift_specular(-SPECULAR_STEP);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn scale_shininess(&mut self, factor: f32) {
        self.shininess_scale =
            (self.shininess_scale * factor).clamp(MIN_SHININESS_SCALE, MAX_SHININESS_SCALE);
        log::info!("shininess scale: {}", self.shininess_scale);
    }

    fn shift_specular(&mut self, delta: f32) {
        self.specular_strength = (self.specular_strength + delta).clamp(0.0, MAX_SPECULAR_STRENGTH);
        log::info!("specular strength: {:.1}", self.specular_strength);
    }
}

/// Where the reflector sits on a sphere of `radius` centred at `center`, and
/// where it points. The lamp is on the side the sphere moved towards.
pub fn reflector_pose(
    center: Point3<f32>,
    rest_center: Point3<f32>,
    radius: f32,
    target: Point3<f32>,
) -> (Point3<f32>, Vector3<f32>) {
    let offset = center - rest_center;
    let outward = if offset.magnitude2() > f32::EPSILON {
        offset.normalize()
    } else {
        Vector3::unit_x()
    };
    let position = center + outward * radius;
    let aim = target - position;
    let direction = if aim.magnitude2() > f32::EPSILON {
        aim.normalize()
    } else {
        outward
    };
    (position, direction)
}

#[derive(Debug, Clone)]
pub struct Lighting {
    point_lights: Vec<PointLight>,
    pub reflector: SpotLight,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            point_lights: vec![PointLight::at(DEFAULT_POINT_LIGHT)],
            reflector: SpotLight::reflector(Point3::new(0.0, 0.0, 0.0), -Vector3::unit_z()),
        }
    }
}

impl Lighting {
    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    /// Returns false and drops the light once the shader's limit is reached.
    pub fn add_point_light(&mut self, light: PointLight) -> bool {
        if self.point_lights.len() >= MAX_POINT_LIGHTS {
            log::warn!(
                "ignoring point light at {:?}, at most {} are supported",
                light.position,
                MAX_POINT_LIGHTS
            );
            return false;
        }
        self.point_lights.push(light);
        true
    }

    pub fn place_reflector(&mut self, position: Point3<f32>, direction: Vector3<f32>) {
        self.reflector.position = position;
        self.reflector.direction = direction;
    }

    pub fn to_uniform(
        &self,
        clock: &DayClock,
        camera: &Camera,
        shading: &ShadingControls,
    ) -> LightsUniform {
        let mut uniform = LightsUniform::zeroed();
        uniform.view_position = [camera.position.x, camera.position.y, camera.position.z, 1.0];
        uniform.directional = DirectionalLight::at(clock).to_raw();

        let mut point_count = 0;
        for (slot, light) in uniform.point_lights.iter_mut().zip(&self.point_lights) {
            *slot = light.to_raw();
            point_count += 1;
        }

        let flashlight = SpotLight::flashlight(camera.position, camera.front());
        uniform.spot_lights = [self.reflector.to_raw(), flashlight.to_raw()];

        uniform.counts = [
            point_count,
            uniform.spot_lights.len() as u32,
            shading.blinn as u32,
            0,
        ];
        uniform.tuning = [shading.shininess_scale, shading.specular_strength, 0.0, 0.0];
        uniform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    fn clock_at(time: f32) -> DayClock {
        let mut clock = DayClock::default();
        clock.set_time(time);
        clock
    }

    #[test]
    fn sun_follows_day_weight() {
        assert_eq!(DirectionalLight::at(&clock_at(1000.0)), DirectionalLight::night());
        assert_eq!(DirectionalLight::at(&clock_at(12000.0)), DirectionalLight::day());

        let dawn = DirectionalLight::at(&clock_at(5500.0));
        let expected = (DirectionalLight::night().diffuse + DirectionalLight::day().diffuse) / 2.0;
        assert!(close(dawn.diffuse, expected));
        assert_eq!(dawn.direction, SUN_DIRECTION);
    }

    #[test]
    fn attenuation_is_one_at_the_source() {
        assert_eq!(Attenuation::MEDIUM.factor(0.0), 1.0);
        assert!(Attenuation::MEDIUM.factor(10.0) < Attenuation::MEDIUM.factor(5.0));
    }

    #[test]
    fn spot_cones_are_nested() {
        let spot = SpotLight::flashlight(Point3::new(0.0, 0.0, 0.0), -Vector3::unit_z());
        assert!(spot.cut_off > spot.outer_cut_off);
        assert!((spot.cut_off - 12.5f32.to_radians().cos()).abs() < 1e-6);
    }

    #[test]
    fn reflector_sits_on_the_leading_side() {
        let rest = Point3::new(5.0, 0.0, 0.0);
        let center = Point3::new(6.5, 0.0, 0.0);
        let target = Point3::new(10.0, 0.0, 0.0);
        let (position, direction) = reflector_pose(center, rest, 0.5, target);
        assert!(close(position - rest, Vector3::new(2.0, 0.0, 0.0)));
        assert!(close(direction, Vector3::unit_x()));

        let center = Point3::new(3.5, 0.0, 0.0);
        let (position, _) = reflector_pose(center, rest, 0.5, target);
        assert!(close(position - rest, Vector3::new(-2.0, 0.0, 0.0)));
    }

    #[test]
    fn reflector_without_offset_uses_positive_x() {
        let rest = Point3::new(5.0, 0.0, 0.0);
        let (position, direction) = reflector_pose(rest, rest, 0.5, Point3::new(10.0, 0.0, 0.0));
        assert_eq!(position, Point3::new(5.5, 0.0, 0.0));
        assert!((direction.magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shading_controls_clamp() {
        let mut shading = ShadingControls::default();
        for _ in 0..10 {
            shading.sharpen();
        }
        assert_eq!(shading.shininess_scale, MAX_SHININESS_SCALE);
        for _ in 0..20 {
            shading.soften();
        }
        assert_eq!(shading.shininess_scale, MIN_SHININESS_SCALE);

        for _ in 0..20 {
            shading.dim();
        }
        assert_eq!(shading.specular_strength, 0.0);
        for _ in 0..50 {
            shading.brighten();
        }
        assert_eq!(shading.specular_strength, MAX_SPECULAR_STRENGTH);

        shading.toggle_blinn();
        assert!(shading.blinn);
        shading.reset();
        assert_eq!(shading, ShadingControls::default());
    }

    #[test]
    fn point_lights_are_capped() {
        let mut lighting = Lighting::default();
        for i in 1..MAX_POINT_LIGHTS {
            assert!(lighting.add_point_light(PointLight::at(Point3::new(i as f32, 0.0, 0.0))));
        }
        assert!(!lighting.add_point_light(PointLight::at(Point3::new(9.0, 0.0, 0.0))));
        assert_eq!(lighting.point_lights().len(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn uniform_carries_counts_and_flashlight() {
        let lighting = Lighting::default();
        let camera = Camera::home();
        let mut shading = ShadingControls::default();
        shading.toggle_blinn();
        shading.sharpen();

        let uniform = lighting.to_uniform(&clock_at(12000.0), &camera, &shading);
        assert_eq!(uniform.counts, [1, 2, 1, 0]);
        assert_eq!(uniform.tuning[0], 2.0);
        assert_eq!(uniform.view_position, [0.0, 0.0, 3.0, 1.0]);
        assert_eq!(uniform.point_lights[0].position, [0.7, 0.2, 2.0, 1.0]);
        assert_eq!(uniform.spot_lights[1].position, [0.0, 0.0, 3.0, 1.0]);
        assert_eq!(uniform.spot_lights[1].ambient, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.directional.diffuse, [1.0, 0.95, 0.8, 1.0]);
    }
}
