//! Start-up settings.
//!
//! [`Settings::default`] reproduces the demo's stock configuration. The `dusk`
//! binary overrides individual fields from the command line before handing
//! the settings to [`crate::flow::run`].

use std::path::PathBuf;

use crate::clock::DEFAULT_TIME_SCALE;

/// Environment variable that overrides the asset root directory.
pub const ASSETS_ENV: &str = "DUSK_NGIN_ASSETS";

/// Which pipeline lights the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPath {
    #[default]
    Forward,
    Deferred,
}

impl RenderPath {
    pub fn toggled(self) -> Self {
        match self {
            RenderPath::Forward => RenderPath::Deferred,
            RenderPath::Deferred => RenderPath::Forward,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub render_path: RenderPath,
    /// Clock units per real second, a day is 24000 units.
    pub time_scale: f32,
    pub fov_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub clear_colour: wgpu::Color,
    pub capture_cursor: bool,
    pub model: String,
    pub day_faces: [String; 6],
    pub night_faces: [String; 6],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "dusk-ngin".to_string(),
            width: 800,
            height: 600,
            render_path: RenderPath::Forward,
            time_scale: DEFAULT_TIME_SCALE,
            fov_degrees: 45.0,
            znear: 0.1,
            zfar: 100.0,
            clear_colour: wgpu::Color {
                r: 0.7,
                g: 0.7,
                b: 0.7,
                a: 1.0,
            },
            capture_cursor: true,
            model: "backpack/backpack.obj".to_string(),
            // +X, -X, +Y, -Y, +Z, -Z
            day_faces: [
                "skybox/right.jpg",
                "skybox/left.jpg",
                "skybox/top.jpg",
                "skybox/bottom.jpg",
                "skybox/front.jpg",
                "skybox/back.jpg",
            ]
            .map(String::from),
            night_faces: [
                "skybox/nightRight.jpg",
                "skybox/nightLeft.jpg",
                "skybox/nightTop.jpg",
                "skybox/nightBottom.jpg",
                "skybox/nightFront.jpg",
                "skybox/nightBack.jpg",
            ]
            .map(String::from),
        }
    }
}

/// Directory all asset paths are resolved against.
pub fn asset_root() -> PathBuf {
    match std::env::var_os(ASSETS_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from("./").join("assets"),
    }
}
