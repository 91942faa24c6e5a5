//! Camera viewing volumes

use crate::foundation::math::{world_forward, world_right, world_up, Quat, Vec3};
use crate::geometry::{intersect, BoundingBox, Plane, Segment};

/// Projection parameters of a viewing volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection with a vertical field of view in degrees
    Perspective {
        /// Vertical field of view (degrees)
        fov_degrees: f32,
        /// Width over height
        aspect: f32,
        /// Near clipping distance
        near: f32,
        /// Far clipping distance
        far: f32,
    },
    /// Orthographic projection showing `size` world units vertically
    Orthographic {
        /// Visible height in world units
        size: f32,
        /// Width over height
        aspect: f32,
        /// Near clipping distance
        near: f32,
        /// Far clipping distance
        far: f32,
    },
}

impl Projection {
    /// Near clipping distance
    pub const fn near(&self) -> f32 {
        match *self {
            Self::Perspective { near, .. } | Self::Orthographic { near, .. } => near,
        }
    }

    /// Far clipping distance
    pub const fn far(&self) -> f32 {
        match *self {
            Self::Perspective { far, .. } | Self::Orthographic { far, .. } => far,
        }
    }

    /// (width, height) of the near and far rectangles
    fn plane_sizes(&self) -> ((f32, f32), (f32, f32)) {
        match *self {
            Self::Perspective { fov_degrees, aspect, near, far } => {
                let slope = 2.0 * (fov_degrees.to_radians() * 0.5).tan();
                let near_height = slope * near;
                let far_height = slope * far;
                ((near_height * aspect, near_height), (far_height * aspect, far_height))
            }
            Self::Orthographic { size, aspect, .. } => {
                let rect = (size * aspect, size);
                (rect, rect)
            }
        }
    }
}

/// Six-plane viewing volume of a camera
///
/// Corners are ordered near bottom-left, bottom-right, top-right, top-left,
/// then the same for the far rectangle. Plane normals point outwards, so a
/// point is inside when its signed distance to every plane is not positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    corners: [Vec3; 8],
    planes: [Plane; 6],
    bounds: BoundingBox,
}

impl Frustum {
    /// Viewing volume of a camera at `position` oriented by `rotation`
    pub fn new(position: &Vec3, rotation: &Quat, projection: &Projection) -> Self {
        let forward = rotation * world_forward();
        let up = rotation * world_up();
        let right = rotation * world_right();

        let center_near = position + forward * projection.near();
        let center_far = position + forward * projection.far();
        let ((near_width, near_height), (far_width, far_height)) = projection.plane_sizes();

        let rect = |center: Vec3, width: f32, height: f32| {
            let r = right * (width * 0.5);
            let u = up * (height * 0.5);
            [center - r - u, center + r - u, center + r + u, center - r + u]
        };
        let [c0, c1, c2, c3] = rect(center_near, near_width, near_height);
        let [c4, c5, c6, c7] = rect(center_far, far_width, far_height);

        Self::from_corners([c0, c1, c2, c3, c4, c5, c6, c7])
    }

    /// Build a frustum from its eight corners
    pub fn from_corners(corners: [Vec3; 8]) -> Self {
        let c = &corners;
        let planes = [
            Plane::from_points(&c[0], &c[1], &c[2]), // near
            Plane::from_points(&c[5], &c[4], &c[7]), // far
            Plane::from_points(&c[4], &c[0], &c[3]), // left
            Plane::from_points(&c[1], &c[5], &c[6]), // right
            Plane::from_points(&c[7], &c[3], &c[2]), // top
            Plane::from_points(&c[0], &c[4], &c[5]), // bottom
        ];
        let bounds = BoundingBox::from_points(c);
        Self { corners, planes, bounds }
    }

    /// The eight corners
    pub const fn corners(&self) -> &[Vec3; 8] {
        &self.corners
    }

    /// The six outward-facing planes (near, far, left, right, top, bottom)
    pub const fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Axis-aligned box enclosing the frustum
    pub const fn bounding_box(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, bbox: &BoundingBox) -> bool {
        intersect::frustum_and_aabb(self, bbox)
    }

    /// The twelve edges, used for debug outlines
    pub fn segments(&self) -> [Segment; 12] {
        let c = &self.corners;
        [
            Segment::new(c[0], c[1]),
            Segment::new(c[1], c[2]),
            Segment::new(c[2], c[3]),
            Segment::new(c[3], c[0]),
            Segment::new(c[4], c[5]),
            Segment::new(c[5], c[6]),
            Segment::new(c[6], c[7]),
            Segment::new(c[7], c[4]),
            Segment::new(c[0], c[4]),
            Segment::new(c[1], c[5]),
            Segment::new(c[2], c[6]),
            Segment::new(c[3], c[7]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::axis_angle_degrees;
    use approx::assert_relative_eq;

    fn perspective() -> Projection {
        Projection::Perspective { fov_degrees: 60.0, aspect: 4.0 / 3.0, near: 0.1, far: 100.0 }
    }

    #[test]
    fn test_planes_face_outwards() {
        let frustum = Frustum::new(&Vec3::zeros(), &Quat::identity(), &perspective());
        let inside = Vec3::new(0.0, 0.0, 10.0);
        for plane in frustum.planes() {
            assert!(plane.signed_distance(&inside) < 0.0);
        }
        assert_relative_eq!(frustum.planes()[0].normal, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_orthographic_corners() {
        let projection = Projection::Orthographic { size: 2.0, aspect: 2.0, near: 1.0, far: 5.0 };
        let frustum = Frustum::new(&Vec3::zeros(), &Quat::identity(), &projection);
        let bounds = frustum.bounding_box();
        assert_relative_eq!(bounds.min(), Vec3::new(-2.0, -1.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(bounds.max(), Vec3::new(2.0, 1.0, 5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotated_frustum_follows_camera() {
        // Facing +X after a quarter turn around Y
        let rotation = axis_angle_degrees(&crate::foundation::math::world_up(), 90.0);
        let frustum = Frustum::new(&Vec3::zeros(), &rotation, &perspective());
        let ahead = BoundingBox::from_center_extents(Vec3::new(10.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let behind = BoundingBox::from_center_extents(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(frustum.intersects_aabb(&ahead));
        assert!(!frustum.intersects_aabb(&behind));
    }
}
