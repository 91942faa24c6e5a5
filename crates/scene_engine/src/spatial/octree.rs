//! Octree spatial partitioning structure
//!
//! The tree is built once, eagerly, to a fixed depth: every non-leaf node
//! has exactly eight children and only leaves hold objects. An object is
//! claimed by every leaf its bounding box overlaps, so objects straddling
//! a boundary live in several leaves at once. Objects that overlap no leaf
//! are tracked separately as outliers.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::foundation::math::{transform_point, Mat4, Vec3};
use crate::foundation::time::Stopwatch;
use crate::geometry::{intersect, BoundingBox, Frustum, Mesh, Ray};

/// Deepest supported tree. Every level is built eagerly, so depth 6 already
/// means 8^5 leaves.
const DEPTH_LIMIT: u32 = 6;

/// Configuration for octree behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Number of levels including the root; leaves sit at `max_depth - 1`
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self { max_depth: 4 }
    }
}

/// Stable address of a node: its level plus the octant taken at each level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    level: u32,
    path: u32,
}

impl NodeId {
    const ROOT: Self = Self { level: 0, path: 0 };

    fn child(self, octant: usize) -> Self {
        Self {
            level: self.level + 1,
            path: (self.path << 3) | octant as u32,
        }
    }

    /// Depth of the addressed node (0 = root)
    pub const fn level(self) -> u32 {
        self.level
    }
}

/// What the octree needs to know about an object when indexing it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeItem {
    /// World-space bounds
    pub bounds: BoundingBox,
    /// Static objects are indexed but never returned by frustum queries
    pub is_static: bool,
}

/// Access to renderable geometry for the exact phase of a raycast
pub trait MeshSource<K> {
    /// Mesh and world matrix of `key`, or `None` if it has nothing to hit
    fn world_mesh(&self, key: K) -> Option<(&Mesh, Mat4)>;
}

/// Result of a successful raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit<K> {
    /// The object that was hit
    pub entity: K,
    /// World-space hit point
    pub point: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Single node in the octree hierarchy
#[derive(Debug)]
pub struct OctreeNode<K> {
    /// World-space bounds of this node
    bounds: BoundingBox,

    /// Address of this node
    id: NodeId,

    /// Objects claimed by this node (leaves only)
    entities: Vec<K>,

    /// Child nodes (8 octants), None if this is a leaf
    children: Option<Box<[OctreeNode<K>; 8]>>,
}

impl<K: Copy + Eq> OctreeNode<K> {
    /// Build a cube node and, above the leaf level, its whole subtree
    fn build(id: NodeId, center: Vec3, size: f32, max_depth: u32) -> Self {
        let half = size * 0.5;
        let bounds = BoundingBox::from_center_extents(center, Vec3::new(half, half, half));

        let children = (id.level + 1 < max_depth).then(|| {
            let offset = size * 0.25;
            Box::new(std::array::from_fn(|octant| {
                // Octant layout:
                // 0: -X, -Y, -Z    4: -X, -Y, +Z
                // 1: +X, -Y, -Z    5: +X, -Y, +Z
                // 2: -X, +Y, -Z    6: -X, +Y, +Z
                // 3: +X, +Y, -Z    7: +X, +Y, +Z
                let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
                let child_center = center + Vec3::new(sign(1), sign(2), sign(4)) * offset;
                Self::build(id.child(octant), child_center, half, max_depth)
            }))
        });

        Self {
            bounds,
            id,
            entities: Vec::new(),
            children,
        }
    }

    fn empty() -> Self {
        Self {
            bounds: BoundingBox::default(),
            id: NodeId::ROOT,
            entities: Vec::new(),
            children: None,
        }
    }

    /// World-space bounds of this node
    pub const fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Address of this node
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Depth in the tree (0 = root)
    pub const fn level(&self) -> u32 {
        self.id.level
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Child nodes, empty for leaves
    pub fn children(&self) -> &[OctreeNode<K>] {
        match self.children.as_deref() {
            Some(children) => children,
            None => &[],
        }
    }

    /// Objects claimed by this node
    pub fn entities(&self) -> &[K] {
        &self.entities
    }

    fn add(&mut self, key: K, bounds: &BoundingBox, claimed: &mut Vec<NodeId>) {
        if !intersect::aabb_and_aabb(&self.bounds, bounds) {
            return;
        }

        match self.children.as_deref_mut() {
            Some(children) => {
                for child in children {
                    child.add(key, bounds, claimed);
                }
            }
            None => {
                if !self.entities.contains(&key) {
                    self.entities.push(key);
                }
                claimed.push(self.id);
            }
        }
    }

    fn remove(&mut self, key: K) {
        self.entities.retain(|entity| *entity != key);
        if let Some(children) = self.children.as_deref_mut() {
            for child in children {
                child.remove(key);
            }
        }
    }

    fn collect_visible<F: FnMut(K)>(&self, frustum: &Frustum, emit: &mut F) {
        if !intersect::aabb_and_aabb(frustum.bounding_box(), &self.bounds)
            || !intersect::frustum_and_aabb(frustum, &self.bounds)
        {
            return;
        }

        match self.children.as_deref() {
            Some(children) => {
                for child in children {
                    child.collect_visible(frustum, emit);
                }
            }
            None => self.entities.iter().copied().for_each(&mut *emit),
        }
    }

    fn collect_ray_leaves<'a>(&'a self, ray: &Ray, leaves: &mut Vec<(f32, &'a Self)>) {
        let Some(t) = intersect::ray_and_aabb(ray, &self.bounds) else {
            return;
        };

        match self.children.as_deref() {
            Some(children) => {
                for child in children {
                    child.collect_ray_leaves(ray, leaves);
                }
            }
            None => leaves.push((t, self)),
        }
    }
}

/// Octree spatial partitioning structure
#[derive(Debug)]
pub struct Octree<K> {
    /// Root node containing the entire indexed volume
    root: OctreeNode<K>,

    /// Configuration
    config: OctreeConfig,

    initialized: bool,

    /// Every indexed object, whether claimed by leaves or an outlier
    items: HashMap<K, OctreeItem>,

    /// Leaves claiming each object
    mapping: HashMap<K, Vec<NodeId>>,

    /// Objects that no leaf claims
    outliers: HashSet<K>,
}

impl<K: Copy + Eq + Hash> Default for Octree<K> {
    fn default() -> Self {
        Self::new(OctreeConfig::default())
    }
}

impl<K: Copy + Eq + Hash> Octree<K> {
    /// Create an empty, uninitialized octree
    pub fn new(config: OctreeConfig) -> Self {
        let max_depth = config.max_depth.clamp(1, DEPTH_LIMIT);
        if max_depth != config.max_depth {
            log::warn!("Octree depth {} out of range, using {}", config.max_depth, max_depth);
        }
        Self {
            root: OctreeNode::empty(),
            config: OctreeConfig { max_depth },
            initialized: false,
            items: HashMap::new(),
            mapping: HashMap::new(),
            outliers: HashSet::new(),
        }
    }

    /// Configuration in effect
    pub const fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Whether [`Octree::initialize`] has run
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Root node
    pub const fn root(&self) -> &OctreeNode<K> {
        &self.root
    }

    /// Build the tree around the union of the items' bounds and index them
    ///
    /// Can only be called once; later calls are logged and ignored.
    pub fn initialize(&mut self, items: impl IntoIterator<Item = (K, OctreeItem)>) {
        let items: Vec<_> = items.into_iter().collect();
        let volume = items
            .iter()
            .map(|(_, item)| item.bounds)
            .reduce(|acc, bounds| acc.union(&bounds))
            .unwrap_or_default();
        self.initialize_with_bounds(items, &volume);
    }

    /// Build the tree around an explicit volume and index the items
    ///
    /// The root is a cube centered on `volume` whose side is the largest
    /// extent of `volume`.
    pub fn initialize_with_bounds(&mut self, items: impl IntoIterator<Item = (K, OctreeItem)>, volume: &BoundingBox) {
        if self.initialized {
            log::error!("Octree is already initialized; ignoring repeated initialization");
            return;
        }

        let stopwatch = Stopwatch::start_new();
        let extent = volume.extent();
        let size = extent.x.max(extent.y).max(extent.z);
        self.root = OctreeNode::build(NodeId::ROOT, volume.mid(), size, self.config.max_depth);
        self.initialized = true;

        for (key, item) in items {
            self.add(key, item);
        }

        log::debug!(
            "Octree built in {:.2} ms: depth {}, root size {:.2}, {} objects, {} outliers",
            stopwatch.elapsed_millis(),
            self.config.max_depth,
            size,
            self.items.len(),
            self.outliers.len()
        );
    }

    /// Index an object; ignored before initialization
    pub fn add(&mut self, key: K, item: OctreeItem) {
        if !self.initialized {
            return;
        }

        let mut claimed = Vec::new();
        self.root.add(key, &item.bounds, &mut claimed);
        if claimed.is_empty() {
            self.outliers.insert(key);
        } else {
            self.mapping.insert(key, claimed);
        }
        self.items.insert(key, item);
    }

    /// Remove an object from every leaf, the mapping and the outliers
    pub fn remove(&mut self, key: K) {
        if !self.initialized {
            return;
        }

        self.root.remove(key);
        self.mapping.remove(&key);
        self.outliers.remove(&key);
        self.items.remove(&key);
    }

    /// Re-index an object after it moved or changed shape
    pub fn update(&mut self, key: K, item: OctreeItem) {
        self.remove(key);
        self.add(key, item);
    }

    /// Leaves claiming `key`, or `None` for unknown objects and outliers
    pub fn find(&self, key: K) -> Option<&[NodeId]> {
        self.mapping.get(&key).map(Vec::as_slice)
    }

    /// Whether `key` is indexed outside the tree
    pub fn is_outlier(&self, key: K) -> bool {
        self.outliers.contains(&key)
    }

    /// Objects indexed outside the tree
    pub fn outliers(&self) -> impl Iterator<Item = K> + '_ {
        self.outliers.iter().copied()
    }

    /// Number of indexed objects
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolve a node address
    pub fn node(&self, id: NodeId) -> Option<&OctreeNode<K>> {
        let mut node = &self.root;
        for level in (0..id.level).rev() {
            let octant = ((id.path >> (3 * level)) & 0b111) as usize;
            node = node.children.as_deref()?.get(octant)?;
        }
        Some(node)
    }

    /// Non-static objects in leaves overlapping the frustum, plus visible outliers
    ///
    /// Each object is reported once even if several visible leaves claim it.
    pub fn intersect(&self, frustum: &Frustum) -> Vec<K> {
        let mut visible = Vec::new();
        let mut seen = HashSet::new();
        let is_dynamic = |key: &K| self.items.get(key).is_some_and(|item| !item.is_static);

        self.root.collect_visible(frustum, &mut |key| {
            if is_dynamic(&key) && seen.insert(key) {
                visible.push(key);
            }
        });

        for key in &self.outliers {
            let Some(item) = self.items.get(key) else { continue };
            if !item.is_static && intersect::frustum_and_aabb(frustum, &item.bounds) && seen.insert(*key) {
                visible.push(*key);
            }
        }

        visible
    }

    /// Leaves pierced by the ray, nearest entry first
    pub fn intersecting_leaves(&self, ray: &Ray) -> Vec<(f32, &OctreeNode<K>)> {
        let mut leaves = Vec::new();
        if self.initialized {
            self.root.collect_ray_leaves(ray, &mut leaves);
        }
        leaves.sort_by(|a, b| a.0.total_cmp(&b.0));
        leaves
    }

    /// Cast a ray against the indexed meshes
    ///
    /// Candidates are the renderable objects whose world bounds the ray
    /// enters, visited in order of entry distance (ties keep discovery
    /// order). The first candidate with a hit triangle wins, so a farther
    /// object is never preferred, but an object whose bounds are entered
    /// later yet whose surface is closer can be shadowed by an overlapping
    /// neighbour.
    ///
    /// Within the winning candidate the nearest triangle hit is reported
    /// rather than the first one in mesh order, so the result does not
    /// depend on how the mesh orders its triangles.
    pub fn raycast<S: MeshSource<K>>(&self, ray: &Ray, source: &S) -> Option<RaycastHit<K>> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut consider = |key: K| {
            if !seen.insert(key) {
                return;
            }
            if let Some((mesh, matrix)) = source.world_mesh(key) {
                if let Some(t) = intersect::ray_and_aabb(ray, &mesh.bounds().transformed(&matrix)) {
                    candidates.push((t, key));
                }
            }
        };

        for (_, leaf) in self.intersecting_leaves(ray) {
            leaf.entities.iter().copied().for_each(&mut consider);
        }
        self.outliers.iter().copied().for_each(&mut consider);

        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        candidates.into_iter().find_map(|(_, key)| {
            let (mesh, matrix) = source.world_mesh(key)?;
            mesh.triangles()
                .filter_map(|[a, b, c]| {
                    let a = transform_point(&matrix, &a);
                    let b = transform_point(&matrix, &b);
                    let c = transform_point(&matrix, &c);
                    intersect::ray_and_triangle(ray, &a, &b, &c)
                })
                .min_by(f32::total_cmp)
                .map(|distance| RaycastHit {
                    entity: key,
                    point: ray.point_at(distance),
                    distance,
                })
        })
    }
}
