//! Scripted per-frame behaviour

use std::fmt;

use crate::foundation::collections::EntityId;
use crate::scene::Scene;

/// Game logic run once per frame for the entity it is attached to
///
/// Behaviours receive the whole scene so they can move their owner or any
/// other entity. While a behaviour runs it is detached from its slot; if it
/// removes its own component the instance is dropped after the call.
pub trait Behaviour {
    /// Advance by `delta_time` seconds
    fn update(&mut self, scene: &mut Scene, owner: EntityId, delta_time: f64);
}

impl<F> Behaviour for F
where
    F: FnMut(&mut Scene, EntityId, f64),
{
    fn update(&mut self, scene: &mut Scene, owner: EntityId, delta_time: f64) {
        self(scene, owner, delta_time);
    }
}

/// Component slot holding a behaviour and its enabled flag
pub struct BehaviourSlot {
    enabled: bool,
    behaviour: Option<Box<dyn Behaviour>>,
}

impl BehaviourSlot {
    /// Wrap a behaviour, enabled
    pub fn new(behaviour: impl Behaviour + 'static) -> Self {
        Self {
            enabled: true,
            behaviour: Some(Box::new(behaviour)),
        }
    }

    /// Whether `update` runs
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resume updates
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Pause updates
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Take the behaviour out for the duration of an update
    pub(crate) fn take(&mut self) -> Option<Box<dyn Behaviour>> {
        self.behaviour.take()
    }

    pub(crate) fn restore(&mut self, behaviour: Box<dyn Behaviour>) {
        self.behaviour = Some(behaviour);
    }
}

impl fmt::Debug for BehaviourSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviourSlot")
            .field("enabled", &self.enabled)
            .field("running", &self.behaviour.is_none())
            .finish()
    }
}
