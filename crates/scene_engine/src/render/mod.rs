//! Render submission
//!
//! Everything between the scene and the graphics API: materials, the
//! backend trait, static batching and frame statistics.

mod backend;
mod batch;
mod color;
mod manager;
mod material;
mod stats;

pub use backend::{BackendCall, CameraView, LightView, RecordingBackend, RenderBackend};
pub use batch::{BatchSource, RendererBatch, StaticBatcher};
pub use color::Color;
pub use manager::RenderingManager;
pub use material::{Material, ShaderType};
pub use stats::{FrameStats, RenderStats};
