//! Stable handle types
//!
//! Entities, transform nodes and components all live in slot maps owned by
//! the scene. Links between them are plain keys, so destroying a node never
//! leaves a dangling pointer behind: a stale key simply fails to resolve.

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to an entity owned by a [`Scene`](crate::scene::Scene)
    pub struct EntityId;

    /// Handle to a node in a [`TransformArena`](crate::scene::TransformArena)
    pub struct TransformId;

    /// Handle to a component attached to an entity
    pub struct ComponentId;
}
