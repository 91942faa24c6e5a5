//! Triangle meshes as consumed by the scene
//!
//! Meshes are produced by loaders and primitive generators outside the engine
//! core; the scene only reads their vertices for bounds, raycasts and batching.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat3, Mat4, Vec3, transform_point};
use crate::geometry::BoundingBox;

/// Interleaved vertex as uploaded to the GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MeshVertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinate (third component reserved for cube maps)
    pub tex_coord: [f32; 3],
}

impl MeshVertex {
    /// Create a vertex
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec3) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            tex_coord: tex_coord.into(),
        }
    }

    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Normal as a vector
    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }

    /// Copy of this vertex moved into the space described by `matrix`
    ///
    /// `normal_matrix` is the inverse transpose of the upper 3x3 of `matrix`.
    pub fn transformed(&self, matrix: &Mat4, normal_matrix: &Mat3) -> Self {
        let normal = (normal_matrix * self.normal())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::zeros);
        Self {
            position: transform_point(matrix, &self.position()).into(),
            normal: normal.into(),
            tex_coord: self.tex_coord,
        }
    }
}

/// Non-indexed triangle list with cached bounds
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    name: String,
    vertices: Vec<MeshVertex>,
    bounds: BoundingBox,
}

impl Mesh {
    /// Create a mesh from a triangle list (three vertices per triangle)
    pub fn new(name: impl Into<String>, vertices: Vec<MeshVertex>) -> Self {
        let bounds = BoundingBox::from_points(&vertices.iter().map(MeshVertex::position).collect::<Vec<_>>());
        Self {
            name: name.into(),
            vertices,
            bounds,
        }
    }

    /// Create a mesh from bare positions, deriving flat face normals
    pub fn from_positions(name: impl Into<String>, positions: &[Vec3]) -> Self {
        let vertices = positions
            .chunks_exact(3)
            .flat_map(|tri| {
                let normal = (tri[1] - tri[0])
                    .cross(&(tri[2] - tri[0]))
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vec3::zeros);
                tri.iter().map(move |p| MeshVertex::new(*p, normal, Vec3::zeros()))
            })
            .collect();
        Self::new(name, vertices)
    }

    /// Mesh name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All vertices, three per triangle
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    /// Object-space bounds
    pub const fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of complete triangles
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Object-space triangles
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|tri| [tri[0].position(), tri[1].position(), tri[2].position()])
    }

    /// Raw vertex bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
