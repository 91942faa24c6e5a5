//! Infinite planes

use crate::foundation::math::Vec3;

/// Distance under which a point counts as lying on a plane
pub const PLANE_TOLERANCE: f32 = 1e-3;

/// Where a point lies relative to a plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// On the side the normal points to
    Front,
    /// On the side opposite to the normal
    Back,
    /// Within [`PLANE_TOLERANCE`] of the plane
    OnPlane,
}

/// Plane defined by a unit normal and its distance from the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Default for Plane {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.0, 0.0), 0.0)
    }
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Plane with the given normal passing through `point`
    pub fn from_normal_and_point(normal: Vec3, point: &Vec3) -> Self {
        let normal = normal.normalize();
        Self { normal, distance: normal.dot(point) }
    }

    /// Plane through three points, normal = (p3 - p1) x (p2 - p1)
    pub fn from_points(p1: &Vec3, p2: &Vec3, p3: &Vec3) -> Self {
        Self::from_normal_and_point((p3 - p1).cross(&(p2 - p1)), p1)
    }

    /// Point on the plane closest to the origin
    pub fn point(&self) -> Vec3 {
        self.normal * self.distance
    }

    /// Calculate signed distance from plane to point
    pub fn signed_distance(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    /// Classify a point against the plane
    pub fn side(&self, point: &Vec3) -> PlaneSide {
        let distance = self.signed_distance(point);
        if distance.abs() <= PLANE_TOLERANCE {
            PlaneSide::OnPlane
        } else if distance > 0.0 {
            PlaneSide::Front
        } else {
            PlaneSide::Back
        }
    }
}
