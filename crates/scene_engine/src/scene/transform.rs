//! Transform hierarchy
//!
//! Every entity owns one node in a scene-wide [`TransformArena`]. Node
//! position, rotation and scale are stored in world space; local values are
//! derived from the parent on demand. Moving a node actively moves its
//! children so their world poses follow the parent.
//!
//! Parent and child links are plain handles. Removing a node frees its whole
//! subtree from the arena.
//!
//! Once the arena is locked (the engine is running) static nodes refuse
//! every write with a warning.

use std::collections::VecDeque;

use crate::foundation::collections::{EntityId, SlotMap, TransformId};
use crate::foundation::math::{
    axis_angle_degrees, compose_matrix, look_rotation, quat_from_euler_degrees, quat_to_euler_degrees, rotation_to,
    world_forward, world_right, world_up, Mat4, Quat, Vec3,
};

/// Reference frame for relative transform operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Space {
    /// Relative to the world axes
    #[default]
    World,
    /// Relative to the parent (local values)
    Local,
}

/// A single node of the hierarchy
#[derive(Debug, Clone)]
pub struct TransformNode {
    owner: EntityId,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    matrix: Mat4,
    parent: Option<TransformId>,
    children: Vec<TransformId>,
    is_static: bool,
}

impl TransformNode {
    fn new(owner: EntityId) -> Self {
        Self {
            owner,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            matrix: Mat4::identity(),
            parent: None,
            children: Vec::new(),
            is_static: false,
        }
    }

    /// Entity owning this node
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// World position
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// World rotation
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    /// World rotation as (pitch, yaw, roll) in degrees
    pub fn euler_angles(&self) -> Vec3 {
        quat_to_euler_degrees(&self.rotation)
    }

    /// World scale
    pub const fn scale(&self) -> Vec3 {
        self.scale
    }

    /// World matrix, translate · rotate · scale
    pub const fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Parent node, if any
    pub const fn parent(&self) -> Option<TransformId> {
        self.parent
    }

    /// Direct children in attachment order
    pub fn children(&self) -> &[TransformId] {
        &self.children
    }

    /// Whether the owner is static
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// World up axis of this node
    pub fn up(&self) -> Vec3 {
        self.rotation * world_up()
    }

    /// World right axis of this node
    pub fn right(&self) -> Vec3 {
        self.rotation * world_right()
    }

    /// World forward axis of this node
    pub fn forward(&self) -> Vec3 {
        self.rotation * world_forward()
    }

    fn rebuild_matrix(&mut self) {
        self.matrix = compose_matrix(&self.position, &self.rotation, &self.scale);
    }
}

/// Scene-wide storage for transform nodes
#[derive(Debug, Default)]
pub struct TransformArena {
    nodes: SlotMap<TransformId, TransformNode>,
    locked: bool,
    changed: Vec<TransformId>,
}

impl TransformArena {
    /// Empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node at the origin for `owner`
    pub fn insert(&mut self, owner: EntityId) -> TransformId {
        self.nodes.insert(TransformNode::new(owner))
    }

    /// Remove a node and its whole subtree
    ///
    /// Returns the removed nodes with their owners, the node itself first.
    pub fn remove(&mut self, id: TransformId) -> Vec<(TransformId, EntityId)> {
        let Some(parent) = self.nodes.get(id).map(TransformNode::parent) else {
            return Vec::new();
        };
        if let Some(parent) = parent {
            self.detach(id, parent);
        }

        let mut subtree = vec![id];
        subtree.extend(self.descendants(id));
        subtree
            .into_iter()
            .filter_map(|node| self.nodes.remove(node).map(|removed| (node, removed.owner)))
            .collect()
    }

    /// Node by id
    pub fn get(&self, id: TransformId) -> Option<&TransformNode> {
        self.nodes.get(id)
    }

    /// Whether `id` is live
    pub fn contains(&self, id: TransformId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether static nodes currently refuse writes
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Freeze or unfreeze static nodes
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub(crate) fn set_static(&mut self, id: TransformId, is_static: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.is_static = is_static;
        }
    }

    /// Drain the nodes whose matrix or links changed since the last call
    pub fn take_changed(&mut self) -> Vec<TransformId> {
        std::mem::take(&mut self.changed)
    }

    /// Every node below `id`, breadth first
    pub fn descendants(&self, id: TransformId) -> Vec<TransformId> {
        let mut found = Vec::new();
        let mut queue: VecDeque<TransformId> = self.nodes.get(id).map(|node| node.children.iter().copied().collect()).unwrap_or_default();
        while let Some(node) = queue.pop_front() {
            if let Some(child) = self.nodes.get(node) {
                queue.extend(child.children.iter().copied());
            }
            found.push(node);
        }
        found
    }

    /// Whether `candidate` lies anywhere below `id`
    pub fn is_descendant(&self, id: TransformId, candidate: TransformId) -> bool {
        let mut current = self.nodes.get(candidate).and_then(TransformNode::parent);
        while let Some(node) = current {
            if node == id {
                return true;
            }
            current = self.nodes.get(node).and_then(TransformNode::parent);
        }
        false
    }

    /// Position relative to the parent
    pub fn local_position(&self, id: TransformId) -> Option<Vec3> {
        let node = self.nodes.get(id)?;
        Some(match self.parent_of(node) {
            Some(parent) => node.position - parent.position,
            None => node.position,
        })
    }

    /// Rotation relative to the parent
    pub fn local_rotation(&self, id: TransformId) -> Option<Quat> {
        let node = self.nodes.get(id)?;
        Some(match self.parent_of(node) {
            Some(parent) => node.rotation * parent.rotation.inverse(),
            None => node.rotation,
        })
    }

    /// Local rotation as (pitch, yaw, roll) in degrees
    pub fn local_euler_angles(&self, id: TransformId) -> Option<Vec3> {
        self.local_rotation(id).map(|rotation| quat_to_euler_degrees(&rotation))
    }

    /// Scale relative to the parent; axes where the parent scale is zero read as zero
    pub fn local_scale(&self, id: TransformId) -> Option<Vec3> {
        let node = self.nodes.get(id)?;
        Some(match self.parent_of(node) {
            Some(parent) => node.scale.zip_map(&parent.scale, |own, parent| if parent == 0.0 { 0.0 } else { own / parent }),
            None => node.scale,
        })
    }

    fn parent_of(&self, node: &TransformNode) -> Option<&TransformNode> {
        node.parent.and_then(|parent| self.nodes.get(parent))
    }

    /// Look up a node for writing, refusing frozen static nodes
    fn writable(&mut self, id: TransformId, operation: &str) -> Option<&mut TransformNode> {
        let locked = self.locked;
        let node = self.nodes.get_mut(id)?;
        if locked && node.is_static {
            log::warn!("Transform::{operation}: can't change a static object while running");
            return None;
        }
        Some(node)
    }

    fn touch(&mut self, id: TransformId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.rebuild_matrix();
            self.changed.push(id);
        }
    }

    /// Move to a world position; children move by the same offset
    pub fn set_position(&mut self, id: TransformId, position: Vec3) {
        let Some(node) = self.writable(id, "set_position") else {
            return;
        };
        let offset = position - node.position;
        node.position = position;
        let children = node.children.clone();

        for child in children {
            self.translate(child, offset, Space::World);
        }
        self.touch(id);
    }

    /// Set the world rotation
    ///
    /// Children orbit this node's position by the rotation delta and turn
    /// by the same delta, so their world poses follow.
    pub fn set_rotation(&mut self, id: TransformId, rotation: Quat) {
        let Some(node) = self.writable(id, "set_rotation") else {
            return;
        };
        let delta = rotation * node.rotation.inverse();
        node.rotation = rotation;
        let pivot = node.position;
        let children = node.children.clone();

        for child in children {
            let Some(current) = self.nodes.get(child) else { continue };
            let (child_position, child_rotation) = (current.position, current.rotation);
            self.set_position(child, pivot + delta * (child_position - pivot));
            self.set_rotation(child, delta * child_rotation);
        }
        self.touch(id);
    }

    /// Set the world rotation from (pitch, yaw, roll) in degrees
    pub fn set_euler_angles(&mut self, id: TransformId, euler: Vec3) {
        self.set_rotation(id, quat_from_euler_degrees(&euler));
    }

    /// Set the world scale; children are scaled by the same per-axis factor
    ///
    /// An axis whose previous scale was zero yields a zero factor.
    pub fn set_scale(&mut self, id: TransformId, scale: Vec3) {
        let Some(node) = self.writable(id, "set_scale") else {
            return;
        };
        let factor = scale.zip_map(&node.scale, |new, old| if old == 0.0 { 0.0 } else { new / old });
        node.scale = scale;
        let children = node.children.clone();

        for child in children {
            self.scale_by(child, factor, Space::World);
        }
        self.touch(id);
    }

    /// Set the position relative to the parent
    pub fn set_local_position(&mut self, id: TransformId, position: Vec3) {
        let Some(node) = self.nodes.get(id) else { return };
        let world = match self.parent_of(node) {
            Some(parent) => position + parent.position,
            None => position,
        };
        self.set_position(id, world);
    }

    /// Set the rotation relative to the parent
    pub fn set_local_rotation(&mut self, id: TransformId, rotation: Quat) {
        let Some(node) = self.nodes.get(id) else { return };
        let world = match self.parent_of(node) {
            Some(parent) => rotation * parent.rotation,
            None => rotation,
        };
        self.set_rotation(id, world);
    }

    /// Set the rotation relative to the parent from (pitch, yaw, roll) degrees
    pub fn set_local_euler_angles(&mut self, id: TransformId, euler: Vec3) {
        self.set_local_rotation(id, quat_from_euler_degrees(&euler));
    }

    /// Set the scale relative to the parent
    pub fn set_local_scale(&mut self, id: TransformId, scale: Vec3) {
        let Some(node) = self.nodes.get(id) else { return };
        let world = match self.parent_of(node) {
            Some(parent) => scale.component_mul(&parent.scale),
            None => scale,
        };
        self.set_scale(id, world);
    }

    /// Move by `amount`, in world or local space
    pub fn translate(&mut self, id: TransformId, amount: Vec3, space: Space) {
        match space {
            Space::World => {
                let Some(node) = self.nodes.get(id) else { return };
                self.set_position(id, node.position + amount);
            }
            Space::Local => {
                let Some(local) = self.local_position(id) else { return };
                self.set_local_position(id, local + amount);
            }
        }
    }

    /// Apply a rotation on top of the current one
    pub fn rotate(&mut self, id: TransformId, rotation: Quat, space: Space) {
        match space {
            Space::World => {
                let Some(node) = self.nodes.get(id) else { return };
                self.set_rotation(id, rotation * node.rotation);
            }
            Space::Local => {
                let Some(local) = self.local_rotation(id) else { return };
                self.set_local_rotation(id, rotation * local);
            }
        }
    }

    /// Rotate around `point` and `axis` by `degrees`, turning the node's orientation too
    pub fn rotate_around(&mut self, id: TransformId, point: Vec3, axis: Vec3, degrees: f32) {
        let Some(node) = self.nodes.get(id) else { return };
        let rotation = axis_angle_degrees(&axis, degrees);
        let orbit = rotation * (node.position - point);
        let turned = rotation * node.rotation;
        self.set_position(id, point + orbit);
        self.set_rotation(id, turned);
    }

    /// Multiply the scale per axis, in world or local space
    pub fn scale_by(&mut self, id: TransformId, factor: Vec3, space: Space) {
        match space {
            Space::World => {
                let Some(node) = self.nodes.get(id) else { return };
                self.set_scale(id, node.scale.component_mul(&factor));
            }
            Space::Local => {
                let Some(local) = self.local_scale(id) else { return };
                self.set_local_scale(id, local.component_mul(&factor));
            }
        }
    }

    /// Rotate so the forward axis points at `target`
    ///
    /// `up` resolves the roll and defaults to the world up axis. Looking at
    /// the node's own position is ignored.
    pub fn look_at(&mut self, id: TransformId, target: Vec3, up: Option<Vec3>) {
        let Some(node) = self.nodes.get(id) else { return };
        let Some(direction) = (target - node.position).try_normalize(f32::EPSILON) else {
            return;
        };
        self.set_rotation(id, look_rotation(&direction, &up.unwrap_or_else(world_up)));
    }

    /// Minimal rotation taking the world up axis onto `up`
    pub fn set_up(&mut self, id: TransformId, up: Vec3) {
        self.set_rotation(id, rotation_to(&world_up(), &up));
    }

    /// Minimal rotation taking the world right axis onto `right`
    pub fn set_right(&mut self, id: TransformId, right: Vec3) {
        self.set_rotation(id, rotation_to(&world_right(), &right));
    }

    /// Minimal rotation taking the world forward axis onto `forward`
    pub fn set_forward(&mut self, id: TransformId, forward: Vec3) {
        self.set_rotation(id, rotation_to(&world_forward(), &forward));
    }

    /// Re-link under a new parent without adjusting the pose
    ///
    /// Reparenting to self, to the current parent or to a descendant is
    /// ignored.
    pub fn set_parent(&mut self, id: TransformId, parent: Option<TransformId>) {
        let Some(current) = self.writable(id, "set_parent").map(|node| node.parent) else {
            return;
        };
        if current == parent || parent == Some(id) {
            return;
        }
        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) || self.is_descendant(id, parent) {
                return;
            }
        }

        if let Some(old) = current {
            self.detach(id, old);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
        if let Some(new) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            if !new.children.contains(&id) {
                new.children.push(id);
            }
        }
        self.changed.push(id);
    }

    /// Parent `child` under `id`
    pub fn add_child(&mut self, id: TransformId, child: TransformId) {
        self.set_parent(child, Some(id));
    }

    /// Detach a direct child
    pub fn remove_child(&mut self, id: TransformId, child: TransformId) {
        let is_child = self.nodes.get(id).is_some_and(|node| node.children.contains(&child));
        if is_child {
            self.set_parent(child, None);
        }
    }

    /// Detach `child` from wherever it sits in the subtree below `id`
    pub fn remove_child_recursively(&mut self, id: TransformId, child: TransformId) {
        if self.is_descendant(id, child) {
            self.set_parent(child, None);
        }
    }

    fn detach(&mut self, id: TransformId, parent: TransformId) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|child| *child != id);
            self.changed.push(parent);
        }
    }
}
