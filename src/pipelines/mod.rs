//! Render pipelines and the GPU resources only they use.
//!
//! - `basic` composes the WGSL sources and builds the forward pipeline
//! - `deferred` owns the G-buffer plus the geometry and lighting pipelines
//! - `light` packs the lights uniform and draws the point light markers
//! - `skybox` builds the cubemap background pipeline

pub mod basic;
pub mod deferred;
pub mod light;
pub mod skybox;
