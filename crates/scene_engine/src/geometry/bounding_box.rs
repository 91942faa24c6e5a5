//! Axis-aligned bounding boxes

use crate::foundation::math::{transform_point, Mat4, Vec3};
use crate::geometry::Segment;

/// Axis-Aligned Bounding Box for spatial queries
///
/// Boxes are values: operations that change a box return a new one. Callers
/// building a box from two corners with [`BoundingBox::new`] must pass them
/// ordered; [`BoundingBox::from_corners`] sorts them per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl BoundingBox {
    /// Create a new box from min and max points
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box spanning two arbitrary corners
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Degenerate box containing a single point
    pub const fn from_point(point: Vec3) -> Self {
        Self { min: point, max: point }
    }

    /// Create a box centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box enclosing every point, or the zero box when there are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::default();
        };
        points.fold(Self::from_point(*first), |acc, point| Self {
            min: acc.min.inf(point),
            max: acc.max.sup(point),
        })
    }

    /// Minimum corner
    pub const fn min(&self) -> Vec3 {
        self.min
    }

    /// Maximum corner
    pub const fn max(&self) -> Vec3 {
        self.max
    }

    /// Center of the box
    pub fn mid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full size along each axis
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half size along each axis
    pub fn half_extent(&self) -> Vec3 {
        self.extent() * 0.5
    }

    /// Smallest box enclosing both boxes
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Check if this box contains a point (inclusive)
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this box lies entirely inside `other` (inclusive)
    pub fn is_inside_of(&self, other: &Self) -> bool {
        self.min.x >= other.min.x && self.min.y >= other.min.y && self.min.z >= other.min.z &&
        self.max.x <= other.max.x && self.max.y <= other.max.y && self.max.z <= other.max.z
    }

    /// Check if the two boxes overlap, comparing mid-point distance against half extents
    pub fn intersects(&self, other: &Self) -> bool {
        let d = self.mid() - other.mid();
        let reach = (self.extent() + other.extent()) * 0.5;
        d.x.abs() <= reach.x && d.y.abs() <= reach.y && d.z.abs() <= reach.z
    }

    /// The eight corners: bottom face (0-3) then top face (4-7)
    pub fn vertices(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
        ]
    }

    /// The twelve edges, used for debug outlines
    pub fn segments(&self) -> [Segment; 12] {
        let v = self.vertices();
        [
            Segment::new(v[0], v[1]),
            Segment::new(v[1], v[2]),
            Segment::new(v[2], v[3]),
            Segment::new(v[3], v[0]),
            Segment::new(v[4], v[5]),
            Segment::new(v[5], v[6]),
            Segment::new(v[6], v[7]),
            Segment::new(v[7], v[4]),
            Segment::new(v[4], v[0]),
            Segment::new(v[5], v[1]),
            Segment::new(v[6], v[2]),
            Segment::new(v[7], v[3]),
        ]
    }

    /// Box enclosing this box's corners after transformation by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = self.vertices().map(|corner| transform_point(matrix, &corner));
        Self::from_points(&corners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{axis_angle_degrees, compose_matrix, world_up};
    use approx::assert_relative_eq;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_from_points() {
        let points = [
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-3.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];
        let bbox = BoundingBox::from_points(&points);
        assert_eq!(bbox.min(), Vec3::new(-3.0, -2.0, -1.0));
        assert_eq!(bbox.max(), Vec3::new(1.0, 4.0, 0.5));
        assert_eq!(BoundingBox::from_points(&Vec::<Vec3>::new()), BoundingBox::default());
    }

    #[test]
    fn test_intersects_touching_and_apart() {
        let a = unit_box();
        let touching = BoundingBox::new(Vec3::new(1.0, -1.0, -1.0), Vec3::new(3.0, 1.0, 1.0));
        let apart = BoundingBox::new(Vec3::new(1.5, -1.0, -1.0), Vec3::new(3.0, 1.0, 1.0));
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_is_inside_of() {
        let inner = BoundingBox::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
        assert!(inner.is_inside_of(&unit_box()));
        assert!(!unit_box().is_inside_of(&inner));
    }

    #[test]
    fn test_transformed_rotation_grows_box() {
        let matrix = compose_matrix(
            &Vec3::new(10.0, 0.0, 0.0),
            &axis_angle_degrees(&world_up(), 45.0),
            &Vec3::new(1.0, 1.0, 1.0),
        );
        let bbox = unit_box().transformed(&matrix);
        let reach = std::f32::consts::SQRT_2;
        assert_relative_eq!(bbox.mid(), Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(bbox.half_extent(), Vec3::new(reach, 1.0, reach), epsilon = 1e-5);
    }

    #[test]
    fn test_segments_cover_all_edges() {
        let total: f32 = unit_box().segments().iter().map(Segment::length).sum();
        assert_relative_eq!(total, 24.0, epsilon = 1e-5);
    }
}
