//! Scene graph
//!
//! A [`Scene`] owns its entities, their transform nodes and components, and
//! the octree indexing them. Every mutation that can move an entity goes
//! through the scene so the bounding-box caches and octree records are
//! refreshed in the same call.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::EngineError;
use crate::foundation::collections::{ComponentId, EntityId, SlotMap, TransformId};
use crate::foundation::math::{Mat4, Quat, Vec3};
use crate::geometry::{BoundingBox, Mesh, Ray};
use crate::render::Color;
use crate::scene::{
    BehaviourSlot, Camera, Component, ComponentKind, ComponentSlot, Debugger, GameObject, Light, MeshRenderer, Space,
    TransformArena, TransformNode,
};
use crate::spatial::{MeshSource, Octree, OctreeConfig, OctreeItem, RaycastHit};

/// A set of entities rendered together
#[derive(Debug)]
pub struct Scene {
    name: String,
    pub(crate) entities: SlotMap<EntityId, GameObject>,
    /// Creation order, which is also draw and update order
    pub(crate) order: Vec<EntityId>,
    pub(crate) transforms: TransformArena,
    pub(crate) components: SlotMap<ComponentId, ComponentSlot>,
    pub(crate) cameras: Vec<ComponentId>,
    pub(crate) lights: Vec<ComponentId>,
    pub(crate) behaviours: Vec<ComponentId>,
    pub(crate) debuggers: Vec<ComponentId>,
    pub(crate) octree: Octree<EntityId>,
    pub(crate) ambient_light: Color,
    pub(crate) initialized: bool,
}

impl Scene {
    /// Empty scene with the default octree configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_octree_config(name, OctreeConfig::default())
    }

    /// Empty scene with a custom octree configuration
    pub fn with_octree_config(name: impl Into<String>, config: OctreeConfig) -> Self {
        Self {
            name: name.into(),
            entities: SlotMap::with_key(),
            order: Vec::new(),
            transforms: TransformArena::new(),
            components: SlotMap::with_key(),
            cameras: Vec::new(),
            lights: Vec::new(),
            behaviours: Vec::new(),
            debuggers: Vec::new(),
            octree: Octree::new(config),
            ambient_light: Color::rgb(0.2, 0.2, 0.2),
            initialized: false,
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether static entities are currently frozen
    pub const fn is_running(&self) -> bool {
        self.transforms.is_locked()
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.transforms.set_locked(running);
    }

    /// Whether [`Scene::initialize`] has run
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Replace the octree configuration; ignored once the scene is initialized
    pub fn set_octree_config(&mut self, config: OctreeConfig) {
        if self.initialized {
            log::warn!("Scene '{}': octree configuration can't change after initialization", self.name);
            return;
        }
        self.octree = Octree::new(config);
    }

    /// Spatial index over entity bounds
    pub const fn octree(&self) -> &Octree<EntityId> {
        &self.octree
    }

    /// Transform nodes of every entity
    pub const fn transforms(&self) -> &TransformArena {
        &self.transforms
    }

    /// Ambient light color
    pub const fn ambient_light(&self) -> Color {
        self.ambient_light
    }

    /// Set the ambient light color
    pub fn set_ambient_light(&mut self, color: Color) {
        self.ambient_light = color;
    }

    // Entities

    /// Create a root entity at the origin
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        let name = name.into();
        let transforms = &mut self.transforms;
        let id = self
            .entities
            .insert_with_key(|key| GameObject::new(name, transforms.insert(key)));
        self.order.push(id);

        if self.octree.is_initialized() {
            if let Some(item) = self.octree_item(id) {
                self.octree.add(id, item);
            }
        }
        id
    }

    /// Destroy an entity together with every entity below it in the hierarchy
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<(), EngineError> {
        let object = self.entities.get(entity).ok_or(EngineError::UnknownEntity)?;
        self.ensure_mutable(object)?;

        for (_, owner) in self.transforms.remove(object.transform()) {
            let Some(removed) = self.entities.remove(owner) else {
                continue;
            };
            for component in removed.components() {
                if let Some(slot) = self.components.remove(*component) {
                    self.unregister(*component, slot.component.kind());
                }
            }
            self.octree.remove(owner);
            self.order.retain(|id| *id != owner);
        }

        self.flush_transform_changes();
        Ok(())
    }

    /// Entity by id
    pub fn entity(&self, entity: EntityId) -> Option<&GameObject> {
        self.entities.get(entity)
    }

    /// First entity with the given name, in creation order
    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.entities.get(*id).is_some_and(|object| object.name() == name))
    }

    /// Entities in creation order
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &GameObject)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.entities.get(*id).map(|object| (*id, object)))
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Mark an entity static; rejected while the scene is running
    pub fn mark_static(&mut self, entity: EntityId) {
        self.set_static(entity, true);
    }

    /// Mark an entity dynamic; rejected while the scene is running
    pub fn mark_dynamic(&mut self, entity: EntityId) {
        self.set_static(entity, false);
    }

    fn set_static(&mut self, entity: EntityId, is_static: bool) {
        if self.is_running() {
            log::error!("Scene '{}': static flags can't change while running", self.name);
            return;
        }
        let Some(object) = self.entities.get_mut(entity) else {
            return;
        };
        object.set_static(is_static);
        let transform = object.transform();
        self.transforms.set_static(transform, is_static);

        if self.octree.is_initialized() {
            if let Some(item) = self.octree_item(entity) {
                self.octree.update(entity, item);
            }
        }
    }

    fn ensure_mutable(&self, object: &GameObject) -> Result<(), EngineError> {
        if object.is_static() && self.is_running() {
            return Err(EngineError::StaticEntityLocked(object.name().to_owned()));
        }
        Ok(())
    }

    // Hierarchy

    /// Parent entity, if any
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        let node = self.transform(entity)?;
        node.parent()
            .and_then(|parent| self.transforms.get(parent))
            .map(TransformNode::owner)
    }

    /// Direct children in attachment order
    pub fn children(&self, entity: EntityId) -> Vec<EntityId> {
        self.transform(entity)
            .map(|node| {
                node.children()
                    .iter()
                    .filter_map(|child| self.transforms.get(*child))
                    .map(TransformNode::owner)
                    .collect()
            })
            .unwrap_or_default()
    }

    // Components

    /// Attach a component
    ///
    /// Fails for unknown entities, for a second component of a singular
    /// kind, and for static entities while the scene is running.
    pub fn add_component(&mut self, entity: EntityId, component: impl Into<Component>) -> Result<ComponentId, EngineError> {
        let component = component.into();
        let kind = component.kind();
        let object = self.entities.get(entity).ok_or(EngineError::UnknownEntity)?;
        self.ensure_mutable(object)?;
        if kind.is_singular() && self.find_component(entity, kind).is_some() {
            return Err(EngineError::ComponentAlreadyAttached(kind));
        }

        let id = self.components.insert(ComponentSlot { owner: entity, component });
        if let Some(object) = self.entities.get_mut(entity) {
            object.attach(id);
        }
        match kind {
            ComponentKind::Camera => self.cameras.push(id),
            ComponentKind::Light => self.lights.push(id),
            ComponentKind::Behaviour => self.behaviours.push(id),
            ComponentKind::Debugger => self.debuggers.push(id),
            ComponentKind::MeshRenderer => self.refresh_bounds(entity),
        }
        log::trace!("Scene '{}': attached {kind} to entity {entity:?}", self.name);
        Ok(id)
    }

    /// Detach a component and hand it back
    pub fn remove_component(&mut self, id: ComponentId) -> Result<Component, EngineError> {
        let owner = self.components.get(id).ok_or(EngineError::UnknownComponent)?.owner;
        if let Some(object) = self.entities.get(owner) {
            self.ensure_mutable(object)?;
        }

        let slot = self.components.remove(id).ok_or(EngineError::UnknownComponent)?;
        if let Some(object) = self.entities.get_mut(owner) {
            object.detach(id);
        }
        self.unregister(id, slot.component.kind());
        if slot.component.kind() == ComponentKind::MeshRenderer {
            self.refresh_bounds(owner);
        }
        Ok(slot.component)
    }

    fn unregister(&mut self, id: ComponentId, kind: ComponentKind) {
        let list = match kind {
            ComponentKind::Camera => &mut self.cameras,
            ComponentKind::Light => &mut self.lights,
            ComponentKind::Behaviour => &mut self.behaviours,
            ComponentKind::Debugger => &mut self.debuggers,
            ComponentKind::MeshRenderer => return,
        };
        list.retain(|component| *component != id);
    }

    /// First component of `kind` on `entity`
    pub fn find_component(&self, entity: EntityId, kind: ComponentKind) -> Option<ComponentId> {
        self.entities.get(entity)?.components().iter().copied().find(|id| {
            self.components
                .get(*id)
                .is_some_and(|slot| slot.component.kind() == kind)
        })
    }

    /// Component by id
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id).map(|slot| &slot.component)
    }

    /// Component by id, mutably
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id).map(|slot| &mut slot.component)
    }

    /// Entity a component is attached to
    pub fn component_owner(&self, id: ComponentId) -> Option<EntityId> {
        self.components.get(id).map(|slot| slot.owner)
    }

    fn typed(&self, entity: EntityId, kind: ComponentKind) -> Option<&Component> {
        self.find_component(entity, kind).and_then(|id| self.component(id))
    }

    fn typed_mut(&mut self, entity: EntityId, kind: ComponentKind) -> Option<&mut Component> {
        self.find_component(entity, kind).and_then(|id| self.component_mut(id))
    }

    /// Camera attached to `entity`
    pub fn camera(&self, entity: EntityId) -> Option<&Camera> {
        match self.typed(entity, ComponentKind::Camera)? {
            Component::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Camera attached to `entity`, mutably
    pub fn camera_mut(&mut self, entity: EntityId) -> Option<&mut Camera> {
        match self.typed_mut(entity, ComponentKind::Camera)? {
            Component::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Light attached to `entity`
    pub fn light(&self, entity: EntityId) -> Option<&Light> {
        match self.typed(entity, ComponentKind::Light)? {
            Component::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Light attached to `entity`, mutably
    pub fn light_mut(&mut self, entity: EntityId) -> Option<&mut Light> {
        match self.typed_mut(entity, ComponentKind::Light)? {
            Component::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Mesh renderer attached to `entity`
    pub fn mesh_renderer(&self, entity: EntityId) -> Option<&MeshRenderer> {
        match self.typed(entity, ComponentKind::MeshRenderer)? {
            Component::MeshRenderer(renderer) => Some(renderer),
            _ => None,
        }
    }

    /// Mutable renderer access; use [`Scene::set_mesh`] to swap the mesh
    pub fn mesh_renderer_mut(&mut self, entity: EntityId) -> Option<&mut MeshRenderer> {
        match self.typed_mut(entity, ComponentKind::MeshRenderer)? {
            Component::MeshRenderer(renderer) => Some(renderer),
            _ => None,
        }
    }

    /// Debugger attached to `entity`
    pub fn debugger(&self, entity: EntityId) -> Option<&Debugger> {
        match self.typed(entity, ComponentKind::Debugger)? {
            Component::Debugger(debugger) => Some(debugger),
            _ => None,
        }
    }

    /// Debugger attached to `entity`, mutably
    pub fn debugger_mut(&mut self, entity: EntityId) -> Option<&mut Debugger> {
        match self.typed_mut(entity, ComponentKind::Debugger)? {
            Component::Debugger(debugger) => Some(debugger),
            _ => None,
        }
    }

    /// Behaviour slot behind a component handle
    pub fn behaviour_mut(&mut self, id: ComponentId) -> Option<&mut BehaviourSlot> {
        match self.component_mut(id)? {
            Component::Behaviour(slot) => Some(slot),
            _ => None,
        }
    }

    /// Swap the mesh of an entity's renderer and refresh its bounds
    pub fn set_mesh(&mut self, entity: EntityId, mesh: Arc<Mesh>) -> Result<(), EngineError> {
        let object = self.entities.get(entity).ok_or(EngineError::UnknownEntity)?;
        self.ensure_mutable(object)?;
        let renderer = self
            .mesh_renderer_mut(entity)
            .ok_or(EngineError::UnknownComponent)?;
        renderer.set_mesh(mesh);
        self.refresh_bounds(entity);
        Ok(())
    }

    // Transforms

    /// Transform node of an entity
    pub fn transform(&self, entity: EntityId) -> Option<&TransformNode> {
        self.entities
            .get(entity)
            .and_then(|object| self.transforms.get(object.transform()))
    }

    /// Write access to an entity's transform
    pub fn transform_mut(&mut self, entity: EntityId) -> Option<TransformMut<'_>> {
        let id = self.entities.get(entity)?.transform();
        Some(TransformMut { scene: self, id })
    }

    /// World matrix of an entity
    pub fn world_matrix(&self, entity: EntityId) -> Option<Mat4> {
        self.transform(entity).map(|node| *node.matrix())
    }

    /// Refresh caches and octree records for every transform changed since the last flush
    pub(crate) fn flush_transform_changes(&mut self) {
        let changed = self.transforms.take_changed();
        self.refresh_from(changed);
    }

    fn refresh_bounds(&mut self, entity: EntityId) {
        if let Some(transform) = self.entities.get(entity).map(GameObject::transform) {
            self.refresh_from(vec![transform]);
        }
    }

    /// Invalidate the bounds of the given nodes' owners and all their
    /// ancestors, then re-index them
    fn refresh_from(&mut self, changed: Vec<TransformId>) {
        let mut seen = HashSet::new();
        let mut affected = Vec::new();
        for id in changed {
            let mut current = Some(id);
            while let Some(node) = current.and_then(|id| self.transforms.get(id)) {
                if !seen.insert(node.owner()) {
                    break;
                }
                affected.push(node.owner());
                current = node.parent();
            }
        }

        for entity in &affected {
            if let Some(object) = self.entities.get(*entity) {
                object.invalidate_bounds();
            }
        }

        if self.octree.is_initialized() {
            for entity in affected {
                if let Some(item) = self.octree_item(entity) {
                    self.octree.update(entity, item);
                }
            }
        }
    }

    // Bounds and queries

    /// World bounds of an entity's mesh, unioned with its children's bounds
    ///
    /// Entities without a renderer contribute their position as a point.
    pub fn entity_bounds(&self, entity: EntityId) -> Option<BoundingBox> {
        let object = self.entities.get(entity)?;
        if let Some(bounds) = object.cached_bounds() {
            return Some(bounds);
        }

        let node = self.transforms.get(object.transform())?;
        let own = self.mesh_renderer(entity).map_or_else(
            || BoundingBox::from_point(node.position()),
            |renderer| renderer.mesh().bounds().transformed(node.matrix()),
        );
        let bounds = node
            .children()
            .iter()
            .filter_map(|child| self.transforms.get(*child))
            .filter_map(|child| self.entity_bounds(child.owner()))
            .fold(own, |acc, child| acc.union(&child));

        object.cache_bounds(bounds);
        Some(bounds)
    }

    pub(crate) fn octree_item(&self, entity: EntityId) -> Option<OctreeItem> {
        Some(OctreeItem {
            bounds: self.entity_bounds(entity)?,
            is_static: self.entities.get(entity)?.is_static(),
        })
    }

    /// Nearest entity whose mesh the ray hits
    pub fn raycast(&self, ray: &Ray) -> Option<RaycastHit<EntityId>> {
        self.octree.raycast(ray, self)
    }
}

impl MeshSource<EntityId> for Scene {
    fn world_mesh(&self, key: EntityId) -> Option<(&Mesh, Mat4)> {
        let renderer = self.mesh_renderer(key)?;
        Some((renderer.mesh(), self.world_matrix(key)?))
    }
}

/// Write handle to one entity's transform
///
/// Every mutator updates the arena and then refreshes the bounding boxes and
/// octree records of every entity it moved.
pub struct TransformMut<'a> {
    scene: &'a mut Scene,
    id: TransformId,
}

impl TransformMut<'_> {
    fn apply(&mut self, operation: impl FnOnce(&mut TransformArena, TransformId)) -> &mut Self {
        operation(&mut self.scene.transforms, self.id);
        self.scene.flush_transform_changes();
        self
    }

    /// Node being edited
    pub fn node(&self) -> Option<&TransformNode> {
        self.scene.transforms.get(self.id)
    }

    /// Arena id of the transform
    pub fn id(&self) -> TransformId {
        self.id
    }

    /// Position relative to the parent
    pub fn local_position(&self) -> Option<Vec3> {
        self.scene.transforms.local_position(self.id)
    }

    /// Rotation relative to the parent
    pub fn local_rotation(&self) -> Option<Quat> {
        self.scene.transforms.local_rotation(self.id)
    }

    /// Scale relative to the parent
    pub fn local_scale(&self) -> Option<Vec3> {
        self.scene.transforms.local_scale(self.id)
    }

    /// Move to a world position, carrying children along
    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.apply(|arena, id| arena.set_position(id, position))
    }

    /// Set the world rotation, turning children with it
    pub fn set_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.apply(|arena, id| arena.set_rotation(id, rotation))
    }

    /// (pitch, yaw, roll) in degrees
    pub fn set_euler_angles(&mut self, euler: Vec3) -> &mut Self {
        self.apply(|arena, id| arena.set_euler_angles(id, euler))
    }

    /// Set the world scale, scaling children by the same factor
    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.apply(|arena, id| arena.set_scale(id, scale))
    }

    /// Set the position relative to the parent
    pub fn set_local_position(&mut self, position: Vec3) -> &mut Self {
        self.apply(|arena, id| arena.set_local_position(id, position))
    }

    /// Set the rotation relative to the parent
    pub fn set_local_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.apply(|arena, id| arena.set_local_rotation(id, rotation))
    }

    /// Set the rotation relative to the parent from (pitch, yaw, roll) degrees
    pub fn set_local_euler_angles(&mut self, euler: Vec3) -> &mut Self {
        self.apply(|arena, id| arena.set_local_euler_angles(id, euler))
    }

    /// Set the scale relative to the parent
    pub fn set_local_scale(&mut self, scale: Vec3) -> &mut Self {
        self.apply(|arena, id| arena.set_local_scale(id, scale))
    }

    /// Move by `amount` in world or local space
    pub fn translate(&mut self, amount: Vec3, space: Space) -> &mut Self {
        self.apply(|arena, id| arena.translate(id, amount, space))
    }

    /// Rotate by `rotation` in world or local space
    pub fn rotate(&mut self, rotation: Quat, space: Space) -> &mut Self {
        self.apply(|arena, id| arena.rotate(id, rotation, space))
    }

    /// Orbit `point` around `axis`, turning with the orbit
    pub fn rotate_around(&mut self, point: Vec3, axis: Vec3, degrees: f32) -> &mut Self {
        self.apply(|arena, id| arena.rotate_around(id, point, axis, degrees))
    }

    /// Multiply the scale in world or local space
    pub fn scale_by(&mut self, factor: Vec3, space: Space) -> &mut Self {
        self.apply(|arena, id| arena.scale_by(id, factor, space))
    }

    /// Turn to face `target`; `up` defaults to the world up axis
    pub fn look_at(&mut self, target: Vec3, up: Option<Vec3>) -> &mut Self {
        self.apply(|arena, id| arena.look_at(id, target, up))
    }

    /// Point the up axis along `up`
    pub fn set_up(&mut self, up: Vec3) -> &mut Self {
        self.apply(|arena, id| arena.set_up(id, up))
    }

    /// Point the right axis along `right`
    pub fn set_right(&mut self, right: Vec3) -> &mut Self {
        self.apply(|arena, id| arena.set_right(id, right))
    }

    /// Point the forward axis along `forward`
    pub fn set_forward(&mut self, forward: Vec3) -> &mut Self {
        self.apply(|arena, id| arena.set_forward(id, forward))
    }

    /// Re-link under another entity, or make this a root with `None`
    ///
    /// Unknown parents, cycles and no-op reparents are ignored.
    pub fn set_parent(&mut self, parent: Option<EntityId>) -> &mut Self {
        let parent = match parent {
            Some(entity) => match self.scene.entities.get(entity) {
                Some(object) => Some(object.transform()),
                None => return self,
            },
            None => None,
        };
        self.apply(|arena, id| arena.set_parent(id, parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{axis_angle_degrees, world_up};
    use crate::scene::{Debugger, Light, LightType};
    use approx::assert_relative_eq;

    fn cube() -> Arc<Mesh> {
        let corners = BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)).vertices();
        // A diagonal quad through the box spans the full bounds
        Arc::new(Mesh::from_positions(
            "cube",
            &[corners[0], corners[1], corners[6], corners[6], corners[7], corners[0]],
        ))
    }

    fn position(scene: &Scene, entity: EntityId) -> Vec3 {
        scene.transform(entity).map(TransformNode::position).unwrap()
    }

    #[test]
    fn test_entities_keep_creation_order() {
        let mut scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        let again = scene.create_entity("a");

        let names: Vec<_> = scene.entities().map(|(_, object)| object.name().to_owned()).collect();
        assert_eq!(names, ["a", "b", "a"]);
        assert_eq!(scene.find_entity("a"), Some(a));
        assert_eq!(scene.find_entity("b"), Some(b));
        assert_ne!(scene.find_entity("a"), Some(again));
        assert_eq!(scene.find_entity("missing"), None);
    }

    #[test]
    fn test_singular_components_rejected_twice() {
        let mut scene = Scene::new("test");
        let entity = scene.create_entity("lamp");
        scene.add_component(entity, Light::new(LightType::Point)).unwrap();

        let second = scene.add_component(entity, Light::new(LightType::Spot));
        assert!(matches!(second, Err(EngineError::ComponentAlreadyAttached(ComponentKind::Light))));

        scene.add_component(entity, Component::behaviour(|_: &mut Scene, _: EntityId, _: f64| {})).unwrap();
        scene.add_component(entity, Component::behaviour(|_: &mut Scene, _: EntityId, _: f64| {})).unwrap();
        assert_eq!(scene.behaviours.len(), 2);
        assert_eq!(scene.entity(entity).unwrap().components().len(), 3);
    }

    #[test]
    fn test_component_lists_follow_attach_and_detach() {
        let mut scene = Scene::new("test");
        let entity = scene.create_entity("eye");
        let camera = scene.add_component(entity, Camera::perspective()).unwrap();
        let debugger = scene.add_component(entity, Debugger::default()).unwrap();
        assert_eq!(scene.cameras, vec![camera]);
        assert_eq!(scene.debuggers, vec![debugger]);

        let removed = scene.remove_component(camera).unwrap();
        assert_eq!(removed.kind(), ComponentKind::Camera);
        assert!(scene.cameras.is_empty());
        assert!(scene.camera(entity).is_none());
        assert!(matches!(scene.remove_component(camera), Err(EngineError::UnknownComponent)));
    }

    #[test]
    fn test_destroy_removes_subtree_and_components() {
        let mut scene = Scene::new("test");
        let root = scene.create_entity("root");
        let child = scene.create_entity("child");
        let other = scene.create_entity("other");
        scene.transform_mut(child).unwrap().set_parent(Some(root));
        scene.add_component(child, Light::default()).unwrap();

        scene.destroy_entity(root).unwrap();

        assert!(scene.entity(root).is_none());
        assert!(scene.entity(child).is_none());
        assert!(scene.lights.is_empty());
        assert!(scene.components.is_empty());
        assert_eq!(scene.entities().map(|(id, _)| id).collect::<Vec<_>>(), vec![other]);
        assert!(matches!(scene.destroy_entity(root), Err(EngineError::UnknownEntity)));
    }

    #[test]
    fn test_transform_handle_moves_children() {
        let mut scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        scene.transform_mut(b).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0)).set_parent(Some(a));
        scene
            .transform_mut(a)
            .unwrap()
            .set_rotation(axis_angle_degrees(&world_up(), 90.0));

        assert_relative_eq!(position(&scene, b), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-3);
        assert_eq!(scene.parent(b), Some(a));
        assert_eq!(scene.children(a), vec![b]);
    }

    #[test]
    fn test_unknown_parent_is_ignored() {
        let mut scene = Scene::new("test");
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        scene.transform_mut(b).unwrap().set_parent(Some(a));
        scene.destroy_entity(a).unwrap();
        let c = scene.create_entity("c");
        scene.transform_mut(c).unwrap().set_parent(Some(a));
        assert_eq!(scene.parent(c), None);
    }

    #[test]
    fn test_bounds_include_children_and_track_moves() {
        let mut scene = Scene::new("test");
        let parent = scene.create_entity("parent");
        let child = scene.create_entity("child");
        scene.add_component(child, MeshRenderer::new(cube())).unwrap();
        scene.transform_mut(child).unwrap().set_parent(Some(parent));

        let bounds = scene.entity_bounds(parent).unwrap();
        assert_relative_eq!(bounds.min(), Vec3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(bounds.max(), Vec3::new(1.0, 1.0, 1.0));

        // Moving the child must invalidate the cached parent bounds
        scene.transform_mut(child).unwrap().set_position(Vec3::new(5.0, 0.0, 0.0));
        let bounds = scene.entity_bounds(parent).unwrap();
        assert_relative_eq!(bounds.min(), Vec3::new(0.0, -1.0, -1.0));
        assert_relative_eq!(bounds.max(), Vec3::new(6.0, 1.0, 1.0));
    }

    #[test]
    fn test_renderer_changes_refresh_bounds() {
        let mut scene = Scene::new("test");
        let entity = scene.create_entity("thing");
        scene.transform_mut(entity).unwrap().set_position(Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(scene.entity_bounds(entity), Some(BoundingBox::from_point(Vec3::new(2.0, 0.0, 0.0))));

        let renderer = scene.add_component(entity, MeshRenderer::new(cube())).unwrap();
        assert_relative_eq!(scene.entity_bounds(entity).unwrap().max(), Vec3::new(3.0, 1.0, 1.0));

        let tiny = Arc::new(Mesh::from_positions("tiny", &[Vec3::zeros(), Vec3::x() * 0.5, Vec3::y() * 0.5]));
        scene.set_mesh(entity, tiny).unwrap();
        assert_relative_eq!(scene.entity_bounds(entity).unwrap().max(), Vec3::new(2.5, 0.5, 0.0));

        scene.remove_component(renderer).unwrap();
        assert_eq!(scene.entity_bounds(entity), Some(BoundingBox::from_point(Vec3::new(2.0, 0.0, 0.0))));
    }

    #[test]
    fn test_octree_records_follow_transforms() {
        let mut scene = Scene::new("test");
        let anchor = scene.create_entity("anchor");
        scene.add_component(anchor, MeshRenderer::new(cube())).unwrap();
        scene.transform_mut(anchor).unwrap().set_scale(Vec3::new(50.0, 50.0, 50.0));
        let mover = scene.create_entity("mover");
        scene.add_component(mover, MeshRenderer::new(cube())).unwrap();

        let items: Vec<_> = scene.order.iter().filter_map(|id| Some((*id, scene.octree_item(*id)?))).collect();
        scene.octree.initialize(items);
        let before = scene.octree().find(mover).unwrap().to_vec();

        scene.transform_mut(mover).unwrap().set_position(Vec3::new(30.0, 30.0, 30.0));
        let after = scene.octree().find(mover).unwrap().to_vec();
        assert_ne!(before, after);

        scene.transform_mut(mover).unwrap().set_position(Vec3::new(500.0, 0.0, 0.0));
        assert!(scene.octree().is_outlier(mover));
    }

    #[test]
    fn test_raycast_hits_mesh() {
        let mut scene = Scene::new("test");
        let target = scene.create_entity("target");
        scene.add_component(target, MeshRenderer::new(cube())).unwrap();
        let items: Vec<_> = scene.order.iter().filter_map(|id| Some((*id, scene.octree_item(*id)?))).collect();
        scene.octree.initialize(items);

        let ray = Ray::new(Vec3::new(0.5, 0.2, -10.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = scene.raycast(&ray).unwrap();
        assert_eq!(hit.entity, target);
        assert_relative_eq!(hit.distance, 9.8, epsilon = 1e-3);
        assert_relative_eq!(hit.point, Vec3::new(0.5, 0.2, -0.2), epsilon = 1e-3);

        let miss = Ray::new(Vec3::new(5.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(scene.raycast(&miss).is_none());
    }

    #[test]
    fn test_static_entities_locked_while_running() {
        let mut scene = Scene::new("test");
        let wall = scene.create_entity("wall");
        scene.mark_static(wall);
        scene.set_running(true);

        scene.transform_mut(wall).unwrap().set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(position(&scene, wall), Vec3::zeros());
        assert!(matches!(
            scene.add_component(wall, Light::default()),
            Err(EngineError::StaticEntityLocked(name)) if name == "wall"
        ));
        assert!(scene.destroy_entity(wall).is_err());

        // Flags are frozen too
        scene.mark_dynamic(wall);
        assert!(scene.entity(wall).unwrap().is_static());

        scene.set_running(false);
        scene.mark_dynamic(wall);
        assert!(!scene.entity(wall).unwrap().is_static());
    }
}
