//! Scene graph, components and per-frame orchestration

mod behaviour;
mod camera;
mod component;
mod context;
mod debugger;
mod frame;
mod game_object;
mod graph;
mod light;
mod mesh_renderer;
mod project;
mod skybox;
mod transform;

pub use behaviour::{Behaviour, BehaviourSlot};
pub use camera::{Camera, Viewport};
pub use component::{Component, ComponentKind};
pub(crate) use component::ComponentSlot;
pub use context::RuntimeContext;
pub use debugger::{DebugFlags, Debugger};
pub use game_object::GameObject;
pub use graph::{Scene, TransformMut};
pub use light::{Light, LightType};
pub use mesh_renderer::MeshRenderer;
pub use project::Project;
pub use skybox::{SkyBox, SkyBoxFace};
pub use transform::{Space, TransformArena, TransformNode};
