//! Components attachable to entities
//!
//! Components are a closed set of variants, so the scene classifies them by
//! matching on the tag instead of inspecting types at runtime.

use std::fmt;

use crate::foundation::collections::EntityId;
use crate::scene::{Behaviour, BehaviourSlot, Camera, Debugger, Light, MeshRenderer};

/// Discriminant of a [`Component`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// [`Camera`]
    Camera,
    /// [`Light`]
    Light,
    /// [`MeshRenderer`]
    MeshRenderer,
    /// [`Debugger`]
    Debugger,
    /// A [`Behaviour`]
    Behaviour,
}

impl ComponentKind {
    /// Singular kinds may be attached at most once per entity
    pub const fn is_singular(self) -> bool {
        !matches!(self, Self::Behaviour)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Camera => "camera",
            Self::Light => "light",
            Self::MeshRenderer => "mesh renderer",
            Self::Debugger => "debugger",
            Self::Behaviour => "behaviour",
        };
        f.write_str(name)
    }
}

/// A component attached to an entity
#[derive(Debug)]
pub enum Component {
    /// Viewpoint
    Camera(Camera),
    /// Light source
    Light(Light),
    /// Drawable mesh
    MeshRenderer(MeshRenderer),
    /// Debug drawing
    Debugger(Debugger),
    /// Scripted behaviour
    Behaviour(BehaviourSlot),
}

impl Component {
    /// Wrap a behaviour into an enabled component
    pub fn behaviour(behaviour: impl Behaviour + 'static) -> Self {
        Self::Behaviour(BehaviourSlot::new(behaviour))
    }

    /// Kind of the wrapped component
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Camera(_) => ComponentKind::Camera,
            Self::Light(_) => ComponentKind::Light,
            Self::MeshRenderer(_) => ComponentKind::MeshRenderer,
            Self::Debugger(_) => ComponentKind::Debugger,
            Self::Behaviour(_) => ComponentKind::Behaviour,
        }
    }
}

impl From<Camera> for Component {
    fn from(camera: Camera) -> Self {
        Self::Camera(camera)
    }
}

impl From<Light> for Component {
    fn from(light: Light) -> Self {
        Self::Light(light)
    }
}

impl From<MeshRenderer> for Component {
    fn from(renderer: MeshRenderer) -> Self {
        Self::MeshRenderer(renderer)
    }
}

impl From<Debugger> for Component {
    fn from(debugger: Debugger) -> Self {
        Self::Debugger(debugger)
    }
}

/// A component together with the entity it is attached to
#[derive(Debug)]
pub(crate) struct ComponentSlot {
    pub(crate) owner: EntityId,
    pub(crate) component: Component,
}
