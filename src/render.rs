//! Render composition.
//!
//! Flows describe what they want drawn by returning a [`Render`] from
//! `on_render`. The renderer flattens everything into one list of
//! [`Instanced`] draws and feeds it to whichever lit path is active, so
//! flows never deal with render passes.

use crate::data_structures::{model::Model, object::SceneObject};

/// A model plus the instance buffer that places it.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

/// - `None` renders nothing
/// - `Default(Instanced)` renders a single lit instanced object
/// - `Defaults(Vec<Instanced>)` renders a batch of lit objects
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn flatten_into(self, out: &mut Vec<Instanced<'a>>) {
        match self {
            Render::None => (),
            Render::Default(instanced) => out.push(instanced),
            Render::Defaults(mut vec) => out.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.flatten_into(out)),
        }
    }
}

impl<'a> From<&'a SceneObject> for Instanced<'a> {
    fn from(object: &'a SceneObject) -> Self {
        Instanced {
            instance: &object.instance_buffer,
            model: &object.model,
            amount: 1,
        }
    }
}

impl<'a> From<&'a SceneObject> for Render<'a> {
    fn from(object: &'a SceneObject) -> Self {
        Render::Default(object.into())
    }
}

impl<'a> From<Option<&'a SceneObject>> for Render<'a> {
    fn from(object: Option<&'a SceneObject>) -> Self {
        object.map_or(Render::None, Render::from)
    }
}
