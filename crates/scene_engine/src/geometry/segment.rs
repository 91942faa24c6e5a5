//! Line segments used by the debug renderer

use crate::foundation::math::{rotation_to, world_up, Vec3};

/// Straight segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    /// First endpoint
    pub start: Vec3,
    /// Second endpoint
    pub end: Vec3,
}

impl Segment {
    /// Create a segment
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Euclidean length
    pub fn length(&self) -> f32 {
        (self.end - self.start).norm()
    }

    /// Squared length
    pub fn length_squared(&self) -> f32 {
        (self.end - self.start).norm_squared()
    }

    /// Closed polyline approximating a circle of `radius` around `center`
    ///
    /// The circle lies in the plane orthogonal to `normal`.
    pub fn approximate_circle(center: &Vec3, normal: &Vec3, radius: f32, segment_count: usize) -> Vec<Self> {
        if segment_count == 0 {
            return Vec::new();
        }

        let rotation = rotation_to(&world_up(), normal);
        let step = std::f32::consts::TAU / segment_count as f32;
        let point = |i: usize| {
            let angle = step * i as f32;
            center + rotation * Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
        };

        (0..segment_count)
            .map(|i| Self::new(point(i), point(i + 1)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circle_lies_in_plane() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let normal = Vec3::new(1.0, 0.0, 0.0);
        let segments = Segment::approximate_circle(&center, &normal, 2.0, 36);
        assert_eq!(segments.len(), 36);
        for segment in &segments {
            assert_relative_eq!((segment.start - center).norm(), 2.0, epsilon = 1e-4);
            assert_relative_eq!((segment.start - center).dot(&normal), 0.0, epsilon = 1e-4);
        }
        // Closed loop
        assert_relative_eq!(segments[35].end, segments[0].start, epsilon = 1e-4);
    }

    #[test]
    fn test_lengths() {
        let segment = Segment::new(Vec3::zeros(), Vec3::new(3.0, 4.0, 0.0));
        assert_relative_eq!(segment.length(), 5.0);
        assert_relative_eq!(segment.length_squared(), 25.0);
    }
}
