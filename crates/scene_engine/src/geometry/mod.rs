//! Geometry primitives and intersection tests
//!
//! Immutable value types shared by the spatial index, the scene and the
//! debug renderer. Everything here is expressed in world space unless a
//! type says otherwise.

mod bounding_box;
mod frustum;
pub mod intersect;
mod mesh;
mod plane;
mod ray;
mod segment;

pub use bounding_box::BoundingBox;
pub use frustum::{Frustum, Projection};
pub use mesh::{Mesh, MeshVertex};
pub use plane::{Plane, PlaneSide, PLANE_TOLERANCE};
pub use ray::Ray;
pub use segment::Segment;
