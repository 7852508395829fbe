//! dusk-ngin
//!
//! A small wgpu renderer built around a day/night cycle. A directional
//! light and a blended day/night skybox follow a looping clock, while point
//! lights and two spotlights (one riding a moving sphere, one attached to
//! the camera) light the scene through either a forward or a deferred path.
//!
//! High-level modules
//! - `camera`: camera types, the free/follow/orbit/overview controller and uniforms
//! - `clock`: the looping day clock and its day weight
//! - `config`: start-up settings and the asset root
//! - `context`: window, surface and renderer handed to flows
//! - `data_structures`: models, materials, textures, instances and scene objects
//! - `flow`: the winit event loop and the `GraphicsFlow` scene trait
//! - `lighting`: light definitions, shading controls and uniform packing
//! - `pipelines`: forward, deferred, light marker and skybox pipelines
//! - `primitives`: sphere and cube geometry
//! - `render`: render composition handed from flows to the renderer
//! - `renderer`: per-frame updates and draw submission
//! - `resources`: helpers to load models, textures and cubemap faces
//! - `scene`: the demo scene
//! - `skybox`: the rotating, blended cubemap background
//!

pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod lighting;
pub mod pipelines;
pub mod primitives;
pub mod render;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod skybox;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu::*;
