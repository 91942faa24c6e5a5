//! Scene entities

use std::cell::Cell;

use crate::foundation::collections::{ComponentId, TransformId};
use crate::geometry::BoundingBox;

/// A named entity: one transform node plus its attached components
#[derive(Debug)]
pub struct GameObject {
    name: String,
    transform: TransformId,
    components: Vec<ComponentId>,
    is_static: bool,
    /// World bounds including children; cleared when any transform below changes
    bounds: Cell<Option<BoundingBox>>,
}

impl GameObject {
    pub(crate) fn new(name: String, transform: TransformId) -> Self {
        Self {
            name,
            transform,
            components: Vec::new(),
            is_static: false,
            bounds: Cell::new(None),
        }
    }

    /// Display name, not necessarily unique
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node of this entity in the scene's transform arena
    pub const fn transform(&self) -> TransformId {
        self.transform
    }

    /// Attached components in attachment order
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    /// Static entities are batched at start-up and frozen while running
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Rename the entity
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
    }

    pub(crate) fn attach(&mut self, component: ComponentId) {
        self.components.push(component);
    }

    pub(crate) fn detach(&mut self, component: ComponentId) {
        self.components.retain(|id| *id != component);
    }

    pub(crate) fn cached_bounds(&self) -> Option<BoundingBox> {
        self.bounds.get()
    }

    pub(crate) fn cache_bounds(&self, bounds: BoundingBox) {
        self.bounds.set(Some(bounds));
    }

    pub(crate) fn invalidate_bounds(&self) {
        self.bounds.set(None);
    }
}
