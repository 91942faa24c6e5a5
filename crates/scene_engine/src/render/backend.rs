//! Backend abstraction for the renderer
//!
//! The scene never talks to a graphics API directly. It issues the calls of
//! [`RenderBackend`] in frame order and the backend turns them into GPU work.

use std::any::Any;

use crate::foundation::collections::EntityId;
use crate::foundation::math::{Mat4, Vec3};
use crate::geometry::{Frustum, Mesh, Segment};
use crate::render::{Color, Material};
use crate::scene::{Light, SkyBox};

/// What the backend needs to know about the active camera
#[derive(Debug, Clone)]
pub struct CameraView {
    /// Entity carrying the camera
    pub entity: EntityId,
    /// World position of the eye
    pub position: Vec3,
    /// Projection · view
    pub view_projection: Mat4,
    /// Viewing volume used for culling
    pub frustum: Frustum,
}

/// An enabled light resolved to world space
#[derive(Debug, Clone)]
pub struct LightView {
    /// Entity carrying the light
    pub entity: EntityId,
    /// Light parameters
    pub light: Light,
    /// World position
    pub position: Vec3,
    /// World direction the light faces
    pub direction: Vec3,
}

/// Rendering backend trait
///
/// Calls are issued synchronously from the render thread. Transforms form a
/// stack: every `push_transform` is matched by a `pop_transform` within the
/// same frame.
pub trait RenderBackend {
    /// Bind camera uniforms for the frame
    fn set_active_camera(&mut self, camera: &CameraView);

    /// Bind the enabled lights and the ambient color for the frame
    fn set_active_lights(&mut self, lights: &[LightView], ambient: Color);

    /// Push a model matrix
    fn push_transform(&mut self, matrix: &Mat4);

    /// Pop the last pushed model matrix
    fn pop_transform(&mut self);

    /// Bind a material for the following draws
    fn bind_material(&mut self, material: &Material);

    /// Draw a mesh with the current transform and material
    fn draw_mesh(&mut self, mesh: &Mesh);

    /// Draw a skybox with the current transform
    fn draw_skybox(&mut self, skybox: &SkyBox);

    /// Draw debug line segments in world space
    fn draw_debug_lines(&mut self, segments: &[Segment], color: Color, thickness: f32);

    /// Downcast to the concrete backend type
    fn as_any(&self) -> &dyn Any;
}

/// A call received by a [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// Camera bound for the frame
    SetActiveCamera(EntityId),
    /// Lights bound for the frame
    SetActiveLights(Vec<EntityId>),
    /// Transform pushed onto the stack
    PushTransform(Mat4),
    /// Transform popped
    PopTransform,
    /// Material bound
    BindMaterial(Material),
    /// Mesh drawn
    DrawMesh {
        /// Mesh name
        name: String,
        /// Vertex count
        vertices: usize,
    },
    /// Skybox drawn
    DrawSkybox(SkyBox),
    /// Debug lines drawn
    DrawDebugLines {
        /// Number of segments
        segments: usize,
        /// Line color
        color: Color,
    },
}

/// Headless backend that records every call
///
/// Used by tests and tools that need to inspect what a frame submitted.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    transform_depth: usize,
}

impl RecordingBackend {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, oldest first
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Forget the recorded calls
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Number of transforms currently pushed
    pub const fn transform_depth(&self) -> usize {
        self.transform_depth
    }

    /// Names of the meshes drawn, in order
    pub fn drawn_meshes(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::DrawMesh { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn set_active_camera(&mut self, camera: &CameraView) {
        self.calls.push(BackendCall::SetActiveCamera(camera.entity));
    }

    fn set_active_lights(&mut self, lights: &[LightView], _ambient: Color) {
        self.calls.push(BackendCall::SetActiveLights(lights.iter().map(|light| light.entity).collect()));
    }

    fn push_transform(&mut self, matrix: &Mat4) {
        self.transform_depth += 1;
        self.calls.push(BackendCall::PushTransform(*matrix));
    }

    fn pop_transform(&mut self) {
        self.transform_depth = self.transform_depth.saturating_sub(1);
        self.calls.push(BackendCall::PopTransform);
    }

    fn bind_material(&mut self, material: &Material) {
        self.calls.push(BackendCall::BindMaterial(material.clone()));
    }

    fn draw_mesh(&mut self, mesh: &Mesh) {
        log::trace!("draw {} ({} vertices)", mesh.name(), mesh.vertex_count());
        self.calls.push(BackendCall::DrawMesh {
            name: mesh.name().to_owned(),
            vertices: mesh.vertex_count(),
        });
    }

    fn draw_skybox(&mut self, skybox: &SkyBox) {
        self.calls.push(BackendCall::DrawSkybox(skybox.clone()));
    }

    fn draw_debug_lines(&mut self, segments: &[Segment], color: Color, _thickness: f32) {
        self.calls.push(BackendCall::DrawDebugLines {
            segments: segments.len(),
            color,
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
