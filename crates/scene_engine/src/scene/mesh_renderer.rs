//! Mesh renderer component

use std::sync::Arc;

use crate::geometry::Mesh;
use crate::render::Material;

/// Draws a shared mesh with a material at the owning entity's transform
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    mesh: Arc<Mesh>,
    material: Material,
    enabled: bool,
    last_frame: Option<u64>,
}

impl MeshRenderer {
    /// Renderer for `mesh` with the default material
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self::with_material(mesh, Material::default())
    }

    /// Renderer with an explicit material
    pub fn with_material(mesh: Arc<Mesh>, material: Material) -> Self {
        Self {
            mesh,
            material,
            enabled: true,
            last_frame: None,
        }
    }

    /// Shared mesh
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Shared handle to the mesh
    pub fn mesh_handle(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Material used to draw the mesh
    pub const fn material(&self) -> &Material {
        &self.material
    }

    /// Material used to draw the mesh, mutably
    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    /// Whether the renderer is drawn
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Draw the renderer again
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop drawing the renderer
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Replace the material
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    /// Replacing the mesh changes the owning entity's bounds; go through
    /// `Scene::set_mesh` for attached renderers
    pub(crate) fn set_mesh(&mut self, mesh: Arc<Mesh>) {
        self.mesh = mesh;
    }

    /// Frame in which this renderer was last drawn
    pub const fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    /// Record a draw in `frame`; returns false if it was already drawn in that frame
    pub(crate) fn mark_drawn(&mut self, frame: u64) -> bool {
        if self.last_frame == Some(frame) {
            return false;
        }
        self.last_frame = Some(frame);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_drawn_once_per_frame() {
        let mesh = Arc::new(Mesh::from_positions(
            "tri",
            &[Vec3::zeros(), Vec3::x(), Vec3::y()],
        ));
        let mut renderer = MeshRenderer::new(mesh);
        assert!(renderer.mark_drawn(3));
        assert!(!renderer.mark_drawn(3));
        assert!(renderer.mark_drawn(4));
        assert_eq!(renderer.last_frame(), Some(4));
    }
}
