//! Spatial partitioning data structures
//!
//! Provides the octree used for frustum culling and ray casting.

mod octree;

pub use octree::{MeshSource, NodeId, Octree, OctreeConfig, OctreeItem, OctreeNode, RaycastHit};
