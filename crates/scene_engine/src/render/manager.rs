//! Render submission front-end
//!
//! [`RenderingManager`] sits between a scene and its [`RenderBackend`]. It
//! forwards calls, counts draw calls into the current frame, owns the static
//! batches and keeps the rolling frame statistics.

use std::any::Any;
use std::time::Duration;

use crate::config::RenderConfig;
use crate::foundation::math::{Mat4, Vec3};
use crate::foundation::time::Stopwatch;
use crate::geometry::{Frustum, Mesh, Segment};
use crate::render::{BatchSource, CameraView, Color, LightView, Material, RenderBackend, RenderStats, StaticBatcher};
use crate::scene::SkyBox;

/// Owns the render backend and frame bookkeeping
pub struct RenderingManager {
    backend: Box<dyn RenderBackend>,
    batches: StaticBatcher,
    stats: RenderStats,
    config: RenderConfig,
    frame_timer: Stopwatch,
}

impl RenderingManager {
    /// Wrap a backend
    pub fn new(backend: impl RenderBackend + 'static, config: RenderConfig) -> Self {
        let stats = RenderStats::new(config.stats_window, Duration::from_millis(config.fps_sync_interval_ms));
        Self {
            backend: Box::new(backend),
            batches: StaticBatcher::new(),
            stats,
            config,
            frame_timer: Stopwatch::start_new(),
        }
    }

    /// The wrapped backend
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// The wrapped backend, mutably
    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    /// Concrete backend, if it is a `T`
    pub fn backend_as<T: Any>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref::<T>()
    }

    /// Render settings in effect
    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Rolling frame statistics
    pub const fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Rolling frame statistics, mutably
    pub fn stats_mut(&mut self) -> &mut RenderStats {
        &mut self.stats
    }

    /// Static batches built at initialization
    pub const fn batches(&self) -> &StaticBatcher {
        &self.batches
    }

    /// Id of the frame being recorded
    pub fn current_frame(&self) -> u64 {
        self.stats.current_frame().id()
    }

    /// Start timing a frame; draws issued outside a frame are discarded from the counts
    pub fn begin_frame(&mut self) {
        self.frame_timer.restart();
        self.stats.current_frame_mut().reset_counters();
    }

    /// Close the current frame and open the next one
    pub fn end_frame(&mut self) {
        let elapsed = self.frame_timer.elapsed_millis();
        self.stats.current_frame_mut().set_time_ms(elapsed);
        log::trace!(
            "frame {} done: {} draw calls in {:.2} ms",
            self.current_frame(),
            self.stats.current_frame().draw_calls(),
            elapsed
        );
        self.stats.push_current_frame();
    }

    /// Bind the camera used for the frame
    pub fn set_active_camera(&mut self, camera: &CameraView) {
        self.backend.set_active_camera(camera);
    }

    /// Bind the enabled lights and the ambient color
    pub fn set_active_lights(&mut self, lights: &[LightView], ambient: Color) {
        self.backend.set_active_lights(lights, ambient);
    }

    /// Push a model transform
    pub fn push_transform(&mut self, matrix: &Mat4) {
        self.backend.push_transform(matrix);
    }

    /// Pop the last pushed transform
    pub fn pop_transform(&mut self) {
        self.backend.pop_transform();
    }

    /// Bind a material for the following draws
    pub fn bind_material(&mut self, material: &Material) {
        self.backend.bind_material(material);
    }

    /// Draw a mesh and count it
    pub fn draw_mesh(&mut self, mesh: &Mesh) {
        self.backend.draw_mesh(mesh);
        self.stats.current_frame_mut().increment_draw_calls();
    }

    /// Draw a skybox centered on the camera, scaled out to the configured size
    pub fn draw_skybox(&mut self, skybox: &SkyBox, camera_position: &Vec3) {
        let matrix = Mat4::new_translation(camera_position) * Mat4::new_scaling(self.config.skybox_scale);
        self.backend.push_transform(&matrix);
        self.backend.draw_skybox(skybox);
        self.stats.current_frame_mut().increment_draw_calls();
        self.backend.pop_transform();
    }

    /// Draw debug lines with the configured thickness
    pub fn draw_debug_lines(&mut self, segments: &[Segment], color: Color) {
        self.backend.draw_debug_lines(segments, color, self.config.debug_line_thickness);
    }

    /// Rebuild the static batches and publish their size to the statistics
    pub fn build_static_batches<'a>(&mut self, sources: impl IntoIterator<Item = BatchSource<'a>>) {
        let stopwatch = Stopwatch::start_new();
        self.batches.build(sources);
        self.stats.set_batch_count(self.batches.batch_count());
        self.stats.set_batch_size(self.batches.batch_size());
        log::debug!(
            "Built {} static batches ({} bytes) in {:.2} ms",
            self.batches.batch_count(),
            self.batches.batch_size(),
            stopwatch.elapsed_millis()
        );
    }

    /// Draw the opaque static batches, skipping those outside `frustum`
    pub fn draw_opaque_batches(&mut self, frustum: Option<&Frustum>) {
        let draws = self.batches.draw_opaque(self.backend.as_mut(), frustum);
        self.count_draws(draws);
    }

    /// Draw the transparent static batches, skipping those outside `frustum`
    pub fn draw_transparent_batches(&mut self, frustum: Option<&Frustum>) {
        let draws = self.batches.draw_transparent(self.backend.as_mut(), frustum);
        self.count_draws(draws);
    }

    fn count_draws(&mut self, draws: u32) {
        let frame = self.stats.current_frame_mut();
        for _ in 0..draws {
            frame.increment_draw_calls();
        }
    }
}

impl std::fmt::Debug for RenderingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingManager")
            .field("batches", &self.batches.batch_count())
            .field("stats", &self.stats)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
