//! # Scene Engine
//!
//! A real-time 3D scene engine: a transform hierarchy, an octree for
//! visibility and ray queries, and a per-frame render pipeline with static
//! batching, behind a pluggable render backend.
//!
//! ## Features
//!
//! - **Transform hierarchy**: world-space storage with local views, parent
//!   motion carried to children, static entities frozen while running
//! - **Octree**: fixed-depth spatial index with frustum culling and two-phase raycasts
//! - **Static batching**: static meshes merged per material at start-up
//! - **Render statistics**: rolling frame times, draw calls and FPS
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut scene = Scene::new("main");
//!     let camera = scene.create_entity("camera");
//!     scene.add_component(camera, Camera::perspective())?;
//!
//!     let mut project = Project::new("demo");
//!     project.add_scene(scene);
//!
//!     let mut context = RuntimeContext::new(RecordingBackend::new(), EngineConfig::default());
//!     context.load_project(project)?;
//!     context.start()?;
//!     context.tick(1.0 / 60.0)?;
//!     context.stop();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod error;
pub mod foundation;
pub mod geometry;
pub mod render;
pub mod scene;
pub mod spatial;

pub use error::EngineError;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig, RenderConfig},
        foundation::{
            collections::{ComponentId, EntityId},
            math::{Mat4, Quat, Vec3},
        },
        geometry::{BoundingBox, Frustum, Mesh, Ray, Segment},
        render::{Color, Material, RecordingBackend, RenderBackend, RenderingManager, ShaderType},
        scene::{
            Behaviour, Camera, Component, DebugFlags, Debugger, Light, LightType, MeshRenderer, Project,
            RuntimeContext, Scene, SkyBox, Space,
        },
        spatial::{OctreeConfig, RaycastHit},
        EngineError,
    };
}
