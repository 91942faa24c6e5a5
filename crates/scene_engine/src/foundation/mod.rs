//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types, canonical axes and rotation helpers
//! - Stable handle types for entities, transforms and components
//! - Stopwatch timing for frames and batch builds
//! - Logging setup

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
