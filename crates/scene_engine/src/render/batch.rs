//! Static geometry batching
//!
//! Static renderers never move once the engine runs, so their meshes are
//! merged into one world-space mesh per material at scene initialization.
//! Each batch is then a single draw call.

use crate::foundation::math::{Mat3, Mat4};
use crate::geometry::{intersect, BoundingBox, Frustum, Mesh, MeshVertex};
use crate::render::{Material, RenderBackend};

/// One static renderer handed to [`StaticBatcher::build`]
#[derive(Debug, Clone, Copy)]
pub struct BatchSource<'a> {
    /// Material of the renderer
    pub material: &'a Material,
    /// Object-space mesh
    pub mesh: &'a Mesh,
    /// World matrix of the owning entity
    pub matrix: Mat4,
}

/// Merged world-space geometry sharing one material
#[derive(Debug, Clone)]
pub struct RendererBatch {
    material: Material,
    mesh: Mesh,
    members: usize,
}

impl RendererBatch {
    /// Material shared by every member
    pub const fn material(&self) -> &Material {
        &self.material
    }

    /// Merged geometry, already in world space
    pub const fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// World-space bounds of the merged geometry
    pub const fn bounds(&self) -> &BoundingBox {
        self.mesh.bounds()
    }

    /// Number of renderers merged into this batch
    pub const fn members(&self) -> usize {
        self.members
    }

    /// Size of the merged vertex data in bytes
    pub fn size_in_bytes(&self) -> usize {
        self.mesh.as_bytes().len()
    }

    /// Drawn in the opaque pass
    pub const fn is_opaque(&self) -> bool {
        !self.material.is_transparent()
    }

    /// Drawn in the transparent pass; fully transparent batches are never drawn
    pub fn is_visible_transparent(&self) -> bool {
        self.material.is_transparent() && self.material.opacity() > 0.0
    }

    fn is_visible(&self, frustum: Option<&Frustum>) -> bool {
        frustum.map_or(true, |frustum| {
            intersect::aabb_and_aabb(frustum.bounding_box(), self.bounds())
                && intersect::frustum_and_aabb(frustum, self.bounds())
        })
    }
}

/// Builds and draws the static batches of a scene
#[derive(Debug, Default)]
pub struct StaticBatcher {
    batches: Vec<RendererBatch>,
}

impl StaticBatcher {
    /// Empty batcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the batches with ones built from `sources`
    ///
    /// Renderers are grouped by exact material equality, in first-seen
    /// order. Positions are moved to world space and normals are rotated by
    /// the inverse transpose of the world matrix.
    pub fn build<'a>(&mut self, sources: impl IntoIterator<Item = BatchSource<'a>>) {
        let mut groups: Vec<(Material, Vec<MeshVertex>, usize)> = Vec::new();

        for source in sources {
            let normal_matrix = source
                .matrix
                .fixed_view::<3, 3>(0, 0)
                .into_owned()
                .try_inverse()
                .map_or_else(Mat3::identity, |inverse| inverse.transpose());
            let vertices = source
                .mesh
                .vertices()
                .iter()
                .map(|vertex| vertex.transformed(&source.matrix, &normal_matrix));

            match groups.iter_mut().find(|(material, _, _)| material == source.material) {
                Some((_, merged, members)) => {
                    merged.extend(vertices);
                    *members += 1;
                }
                None => groups.push((source.material.clone(), vertices.collect(), 1)),
            }
        }

        self.batches = groups
            .into_iter()
            .enumerate()
            .map(|(index, (material, vertices, members))| RendererBatch {
                material,
                mesh: Mesh::new(format!("static batch {index}"), vertices),
                members,
            })
            .collect();
    }

    /// Batches in build order
    pub fn batches(&self) -> &[RendererBatch] {
        &self.batches
    }

    /// Number of batches
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Total size of merged vertex data in bytes
    pub fn batch_size(&self) -> usize {
        self.batches.iter().map(RendererBatch::size_in_bytes).sum()
    }

    /// Drop every batch
    pub fn clear(&mut self) {
        self.batches.clear();
    }

    /// Draw the opaque batches, skipping those outside `frustum`; returns the draw count
    pub fn draw_opaque(&self, backend: &mut dyn RenderBackend, frustum: Option<&Frustum>) -> u32 {
        self.draw_where(backend, frustum, RendererBatch::is_opaque)
    }

    /// Draw the transparent batches, skipping those outside `frustum`; returns the draw count
    pub fn draw_transparent(&self, backend: &mut dyn RenderBackend, frustum: Option<&Frustum>) -> u32 {
        self.draw_where(backend, frustum, RendererBatch::is_visible_transparent)
    }

    fn draw_where(&self, backend: &mut dyn RenderBackend, frustum: Option<&Frustum>, pass: impl Fn(&RendererBatch) -> bool) -> u32 {
        let mut draws = 0;
        backend.push_transform(&Mat4::identity());
        for batch in self.batches.iter().filter(|batch| pass(batch) && batch.is_visible(frustum)) {
            backend.bind_material(&batch.material);
            backend.draw_mesh(&batch.mesh);
            draws += 1;
        }
        backend.pop_transform();
        draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{axis_angle_degrees, compose_matrix, world_up, Quat, Vec3};
    use crate::geometry::Projection;
    use crate::render::{BackendCall, Color, RecordingBackend, ShaderType};
    use approx::assert_relative_eq;

    fn triangle() -> Mesh {
        Mesh::from_positions(
            "tri",
            &[Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
        )
    }

    fn translated(x: f32, z: f32) -> Mat4 {
        compose_matrix(&Vec3::new(x, 0.0, z), &Quat::identity(), &Vec3::new(1.0, 1.0, 1.0))
    }

    fn transparent(opacity: f32) -> Material {
        let mut material = Material::with_diffuse(Color::BLUE);
        material.set_shader(ShaderType::StandardTransparent);
        material.set_opacity(opacity);
        material
    }

    #[test]
    fn test_groups_by_material() {
        let mesh = triangle();
        let red = Material::with_diffuse(Color::RED);
        let green = Material::with_diffuse(Color::GREEN);
        let mut batcher = StaticBatcher::new();
        batcher.build([
            BatchSource { material: &red, mesh: &mesh, matrix: translated(0.0, 0.0) },
            BatchSource { material: &green, mesh: &mesh, matrix: translated(5.0, 0.0) },
            BatchSource { material: &red, mesh: &mesh, matrix: translated(10.0, 0.0) },
        ]);

        assert_eq!(batcher.batch_count(), 2);
        let first = &batcher.batches()[0];
        assert_eq!(first.material(), &red);
        assert_eq!(first.members(), 2);
        assert_eq!(first.mesh().vertex_count(), 6);
        assert_relative_eq!(first.bounds().max(), Vec3::new(11.0, 1.0, 0.0), epsilon = 1e-5);
        assert_eq!(batcher.batch_size(), 9 * std::mem::size_of::<MeshVertex>());
    }

    #[test]
    fn test_normals_follow_rotation() {
        let mesh = triangle();
        let material = Material::default();
        let matrix = compose_matrix(&Vec3::zeros(), &axis_angle_degrees(&world_up(), 90.0), &Vec3::new(2.0, 2.0, 2.0));
        let mut batcher = StaticBatcher::new();
        batcher.build([BatchSource { material: &material, mesh: &mesh, matrix }]);

        // Face normal +Z turns to +X and stays unit length despite the scale
        let normal = batcher.batches()[0].mesh().vertices()[0].normal();
        assert_relative_eq!(normal, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_passes_split_by_shader_and_opacity() {
        let mesh = triangle();
        let opaque = Material::default();
        let glass = transparent(0.5);
        let invisible = transparent(0.0);
        let mut batcher = StaticBatcher::new();
        batcher.build([
            BatchSource { material: &opaque, mesh: &mesh, matrix: translated(0.0, 0.0) },
            BatchSource { material: &glass, mesh: &mesh, matrix: translated(0.0, 0.0) },
            BatchSource { material: &invisible, mesh: &mesh, matrix: translated(0.0, 0.0) },
        ]);

        let mut backend = RecordingBackend::new();
        assert_eq!(batcher.draw_opaque(&mut backend, None), 1);
        assert_eq!(batcher.draw_transparent(&mut backend, None), 1);
        let bound: Vec<_> = backend
            .calls()
            .iter()
            .filter_map(|call| match call {
                BackendCall::BindMaterial(material) => Some(material.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(bound, vec![opaque, glass]);
        assert_eq!(backend.transform_depth(), 0);
    }

    #[test]
    fn test_frustum_rejects_batches_out_of_view() {
        let mesh = triangle();
        let near = Material::with_diffuse(Color::RED);
        let behind = Material::with_diffuse(Color::GREEN);
        let mut batcher = StaticBatcher::new();
        batcher.build([
            BatchSource { material: &near, mesh: &mesh, matrix: translated(0.0, 10.0) },
            BatchSource { material: &behind, mesh: &mesh, matrix: translated(0.0, -10.0) },
        ]);

        let projection = Projection::Perspective { fov_degrees: 60.0, aspect: 1.0, near: 0.1, far: 100.0 };
        let frustum = Frustum::new(&Vec3::zeros(), &Quat::identity(), &projection);
        let mut backend = RecordingBackend::new();
        assert_eq!(batcher.draw_opaque(&mut backend, Some(&frustum)), 1);
        assert_eq!(backend.drawn_meshes(), vec!["static batch 0"]);
    }
}
