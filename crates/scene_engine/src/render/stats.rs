//! Rolling render statistics
//!
//! Keeps the last few frames in a ring buffer and recomputes the average
//! frame rate whenever a sync interval has elapsed.

use std::fmt;
use std::time::{Duration, Instant};

/// Counters for a single frame
#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    id: u64,
    start: Instant,
    time_ms: f64,
    draw_calls: u32,
}

impl FrameStats {
    fn new(id: u64, start: Instant) -> Self {
        Self {
            id,
            start,
            time_ms: 0.0,
            draw_calls: 0,
        }
    }

    /// Sequential frame number
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// When the frame started
    pub const fn start(&self) -> Instant {
        self.start
    }

    /// CPU time spent rendering the frame, in milliseconds
    pub const fn time_ms(&self) -> f64 {
        self.time_ms
    }

    /// Draw calls issued during the frame
    pub const fn draw_calls(&self) -> u32 {
        self.draw_calls
    }

    /// Record the frame time
    pub fn set_time_ms(&mut self, time_ms: f64) {
        self.time_ms = time_ms;
    }

    /// Count one more draw call
    pub fn increment_draw_calls(&mut self) {
        self.draw_calls += 1;
    }

    /// Forget anything counted before the frame actually began
    pub(crate) fn reset_counters(&mut self) {
        self.time_ms = 0.0;
        self.draw_calls = 0;
    }
}

/// Ring buffer of recent frames plus batch diagnostics
///
/// The ring holds one slot more than the window: the extra slot is the frame
/// still being recorded, so averages always cover `window` closed frames.
#[derive(Debug, Clone)]
pub struct RenderStats {
    frames: Vec<FrameStats>,
    current: usize,
    completed: usize,
    next_id: u64,
    last_sync: FrameStats,
    sync_interval: Duration,
    average_fps: f32,
    batch_count: usize,
    batch_size: usize,
    frustum_culling: bool,
}

impl RenderStats {
    /// Stats keeping `window` frames, refreshing the frame rate every `sync_interval`
    pub fn new(window: usize, sync_interval: Duration) -> Self {
        Self::starting_at(window, sync_interval, Instant::now())
    }

    fn starting_at(window: usize, sync_interval: Duration, start: Instant) -> Self {
        let first = FrameStats::new(0, start);
        Self {
            frames: vec![first; window.max(1) + 1],
            current: 0,
            completed: 0,
            next_id: 1,
            last_sync: first,
            sync_interval,
            average_fps: 0.0,
            batch_count: 0,
            batch_size: 0,
            frustum_culling: false,
        }
    }

    /// Frame currently being rendered
    pub fn current_frame(&self) -> &FrameStats {
        &self.frames[self.current]
    }

    /// Frame currently being rendered
    pub fn current_frame_mut(&mut self) -> &mut FrameStats {
        &mut self.frames[self.current]
    }

    /// Close the current frame and start a new one now
    pub fn push_current_frame(&mut self) {
        self.push_current_frame_at(Instant::now());
    }

    fn push_current_frame_at(&mut self, now: Instant) {
        let current = *self.current_frame();
        let delta = current.start.saturating_duration_since(self.last_sync.start);
        if delta >= self.sync_interval && !delta.is_zero() {
            let elapsed_frames = current.id - self.last_sync.id;
            self.average_fps = (elapsed_frames as f64 / delta.as_secs_f64()) as f32;
            self.last_sync = current;
        }

        self.completed = (self.completed + 1).min(self.frames.len() - 1);
        self.current = (self.current + 1) % self.frames.len();
        self.frames[self.current] = FrameStats::new(self.next_id, now);
        self.next_id += 1;
    }

    fn completed_frames(&self) -> impl Iterator<Item = &FrameStats> {
        let len = self.frames.len();
        (1..=self.completed).map(move |back| &self.frames[(self.current + len - back) % len])
    }

    /// Mean frame time over the completed frames in the window, in milliseconds
    pub fn average_frame_time(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        self.completed_frames().map(FrameStats::time_ms).sum::<f64>() / self.completed as f64
    }

    /// Mean draw calls over the completed frames in the window
    pub fn average_draw_calls(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        let total: u64 = self.completed_frames().map(|frame| u64::from(frame.draw_calls)).sum();
        total as f64 / self.completed as f64
    }

    /// Frame rate measured at the last sync point
    pub const fn average_fps(&self) -> f32 {
        self.average_fps
    }

    /// Number of static batches
    pub const fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Total size of static batch geometry in bytes
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether frustum culling was active
    pub const fn frustum_culling(&self) -> bool {
        self.frustum_culling
    }

    /// Record the static batch count
    pub fn set_batch_count(&mut self, count: usize) {
        self.batch_count = count;
    }

    /// Record the static batch size in bytes
    pub fn set_batch_size(&mut self, size: usize) {
        self.batch_size = size;
    }

    /// Record whether frustum culling is active
    pub fn set_frustum_culling(&mut self, enabled: bool) {
        self.frustum_culling = enabled;
    }
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut size = self.batch_size as f64;
        let mut unit = "bytes";
        for next in ["KB", "MB", "GB"] {
            if size <= 1024.0 {
                break;
            }
            size /= 1024.0;
            unit = next;
        }

        write!(
            f,
            "Frustum Culling: {}; {:.0} draw calls @ {:.0} FPS ({:.2} ms); {} batches ({:.2} {})",
            if self.frustum_culling { "ON" } else { "OFF" },
            self.average_draw_calls(),
            self.average_fps,
            self.average_frame_time(),
            self.batch_count,
            size,
            unit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fps_recomputed_after_sync_interval() {
        let t0 = Instant::now();
        let mut stats = RenderStats::starting_at(20, Duration::from_millis(1000), t0);

        for k in 1..=10u64 {
            stats.push_current_frame_at(t0 + Duration::from_millis(100 * k));
        }
        // Frame 10 starts exactly one second after frame 0 but is not closed yet
        assert_eq!(stats.average_fps(), 0.0);

        stats.push_current_frame_at(t0 + Duration::from_millis(1100));
        assert_relative_eq!(stats.average_fps(), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_averages_use_completed_frames_only() {
        let t0 = Instant::now();
        let mut stats = RenderStats::starting_at(4, Duration::from_secs(1), t0);

        for (k, calls) in [2u32, 4, 6, 8, 10, 12].iter().enumerate() {
            let frame = stats.current_frame_mut();
            for _ in 0..*calls {
                frame.increment_draw_calls();
            }
            frame.set_time_ms(f64::from(*calls));
            stats.push_current_frame_at(t0 + Duration::from_millis(10 * (k as u64 + 1)));
        }

        // Window of 4 keeps 6, 8, 10, 12 and never the open frame
        assert_relative_eq!(stats.average_draw_calls(), 9.0);
        assert_relative_eq!(stats.average_frame_time(), 9.0);
        assert_eq!(stats.current_frame().draw_calls(), 0);
        assert_eq!(stats.current_frame().id(), 6);
    }

    #[test]
    fn test_partial_window_ignores_open_frame() {
        let t0 = Instant::now();
        let mut stats = RenderStats::starting_at(3, Duration::from_secs(1), t0);

        for k in 1..=3u64 {
            let frame = stats.current_frame_mut();
            for _ in 0..4 {
                frame.increment_draw_calls();
            }
            stats.push_current_frame_at(t0 + Duration::from_millis(10 * k));
        }
        assert_relative_eq!(stats.average_draw_calls(), 4.0);

        // Steady state: the freshly opened frame must not push out a closed one
        stats.current_frame_mut().increment_draw_calls();
        assert_relative_eq!(stats.average_draw_calls(), 4.0);
        stats.push_current_frame_at(t0 + Duration::from_millis(40));
        assert_relative_eq!(stats.average_draw_calls(), 3.0);
    }

    #[test]
    fn test_summary_format() {
        let mut stats = RenderStats::new(20, Duration::from_secs(1));
        stats.set_frustum_culling(true);
        stats.set_batch_count(3);
        stats.set_batch_size(3 * 1024);
        let summary = stats.to_string();
        assert!(summary.starts_with("Frustum Culling: ON; 0 draw calls @ 0 FPS"));
        assert!(summary.ends_with("3 batches (3.00 KB)"));
    }
}
