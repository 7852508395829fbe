//! Engine data structures: models, textures, objects and instances.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data
//! - `object` pairs a model with its placement in the world

pub mod instance;
pub mod model;
pub mod object;
pub mod texture;
