//! Debug visualisation component

use bitflags::bitflags;

bitflags! {
    /// What a [`Debugger`] draws for its entity
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugFlags: u32 {
        /// Up, right and forward axes
        const GIZMO = 1 << 0;
        /// Octree leaves claiming the entity
        const OCTREE_NODES = 1 << 1;
        /// Bounding box, camera frustum or point light range
        const BOUNDING_BOX = 1 << 2;
    }
}

/// Draws debug lines for its entity in debug builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debugger {
    flags: DebugFlags,
}

impl Default for Debugger {
    fn default() -> Self {
        Self { flags: DebugFlags::all() }
    }
}

impl Debugger {
    /// Debugger showing `flags`
    pub const fn new(flags: DebugFlags) -> Self {
        Self { flags }
    }

    /// Flags currently shown
    pub const fn flags(&self) -> DebugFlags {
        self.flags
    }

    /// Whether every bit of `flag` is shown
    pub fn is_visible(&self, flag: DebugFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Show more flags
    pub fn show(&mut self, flags: DebugFlags) {
        self.flags.insert(flags);
    }

    /// Hide flags
    pub fn hide(&mut self, flags: DebugFlags) {
        self.flags.remove(flags);
    }
}
