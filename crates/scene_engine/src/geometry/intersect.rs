//! Stateless intersection predicates
//!
//! All tests are conservative at the boundaries: touching counts as intersecting.

use crate::foundation::math::Vec3;
use crate::geometry::{BoundingBox, Frustum, Ray};

/// Tolerance of the ray-triangle test
pub const RAY_TRIANGLE_EPSILON: f32 = 1e-5;

/// True if either box contains the other or they overlap
pub fn aabb_and_aabb(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.is_inside_of(b) || b.is_inside_of(a) || a.intersects(b)
}

/// Separating-axis test between a triangle and a box
///
/// Tests the three box normals, the triangle normal and the nine cross
/// products of triangle edges with box edges.
pub fn triangle_and_aabb(a: &Vec3, b: &Vec3, c: &Vec3, bbox: &BoundingBox) -> bool {
    let triangle = [*a, *b, *c];
    let box_normals = [Vec3::x(), Vec3::y(), Vec3::z()];
    let (box_min, box_max) = (bbox.min(), bbox.max());

    for (i, normal) in box_normals.iter().enumerate() {
        let (tri_min, tri_max) = project(&triangle, normal);
        if tri_max < box_min[i] || tri_min > box_max[i] {
            return false;
        }
    }

    let corners = bbox.vertices();

    let triangle_normal = (c - a).cross(&(b - a));
    let offset = triangle_normal.dot(a);
    let (corner_min, corner_max) = project(&corners, &triangle_normal);
    if corner_max < offset || corner_min > offset {
        return false;
    }

    let edges = [a - b, b - c, c - a];
    for edge in &edges {
        for normal in &box_normals {
            let axis = edge.cross(normal);
            let (corner_min, corner_max) = project(&corners, &axis);
            let (tri_min, tri_max) = project(&triangle, &axis);
            if corner_max < tri_min || corner_min > tri_max {
                return false;
            }
        }
    }

    true
}

/// Conservative frustum test: false only if the box is fully outside one plane
pub fn frustum_and_aabb(frustum: &Frustum, bbox: &BoundingBox) -> bool {
    let (min, max) = (bbox.min(), bbox.max());
    frustum.planes().iter().all(|plane| {
        // Corner furthest behind the plane
        let n_vertex = Vec3::new(
            if plane.normal.x > 0.0 { min.x } else { max.x },
            if plane.normal.y > 0.0 { min.y } else { max.y },
            if plane.normal.z > 0.0 { min.z } else { max.z },
        );
        plane.signed_distance(&n_vertex) <= 0.0
    })
}

/// Slab test; returns the distance along the ray to the entry point
///
/// A ray starting inside the box reports a distance of zero. Boxes entirely
/// behind the origin are missed.
pub fn ray_and_aabb(ray: &Ray, bbox: &BoundingBox) -> Option<f32> {
    let (min, max) = (bbox.min(), bbox.max());
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        if direction == 0.0 {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / direction;
        let mut t0 = (min[axis] - origin) * inv;
        let mut t1 = (max[axis] - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    Some(t_enter.max(0.0))
}

/// Möller–Trumbore ray-triangle test; returns the distance along the ray
pub fn ray_and_triangle(ray: &Ray, a: &Vec3, b: &Vec3, c: &Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let h = ray.direction.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < RAY_TRIANGLE_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = inv_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = inv_det * ray.direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * edge2.dot(&q);
    (t > RAY_TRIANGLE_EPSILON).then_some(t)
}

fn project(points: &[Vec3], axis: &Vec3) -> (f32, f32) {
    points.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), point| {
        let d = axis.dot(point);
        (lo.min(d), hi.max(d))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use crate::geometry::Projection;
    use approx::assert_relative_eq;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_aabb_containment_counts_as_intersection() {
        let big = BoundingBox::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0));
        assert!(aabb_and_aabb(&big, &unit_box()));
        assert!(aabb_and_aabb(&unit_box(), &big));
        let far = BoundingBox::from_center_extents(Vec3::new(20.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(!aabb_and_aabb(&big, &far));
    }

    #[test]
    fn test_triangle_and_aabb() {
        let crossing = [Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 5.0)];
        assert!(triangle_and_aabb(&crossing[0], &crossing[1], &crossing[2], &unit_box()));

        let above = [Vec3::new(-5.0, 2.0, -5.0), Vec3::new(5.0, 2.0, -5.0), Vec3::new(0.0, 2.0, 5.0)];
        assert!(!triangle_and_aabb(&above[0], &above[1], &above[2], &unit_box()));

        // Overlaps on every box axis but lies in the plane x + y = 2.5, past the box edge
        let diagonal = [Vec3::new(0.0, 2.5, -0.5), Vec3::new(2.5, 0.0, -0.5), Vec3::new(1.25, 1.25, 0.5)];
        assert!(!triangle_and_aabb(&diagonal[0], &diagonal[1], &diagonal[2], &unit_box()));
    }

    #[test]
    fn test_frustum_and_aabb() {
        let projection = Projection::Perspective { fov_degrees: 60.0, aspect: 1.0, near: 0.1, far: 50.0 };
        let frustum = Frustum::new(&Vec3::zeros(), &Quat::identity(), &projection);
        let ahead = BoundingBox::from_center_extents(Vec3::new(0.0, 0.0, 10.0), Vec3::new(1.0, 1.0, 1.0));
        let beyond_far = BoundingBox::from_center_extents(Vec3::new(0.0, 0.0, 60.0), Vec3::new(1.0, 1.0, 1.0));
        let off_side = BoundingBox::from_center_extents(Vec3::new(30.0, 0.0, 10.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(frustum_and_aabb(&frustum, &ahead));
        assert!(!frustum_and_aabb(&frustum, &beyond_far));
        assert!(!frustum_and_aabb(&frustum, &off_side));
    }

    #[test]
    fn test_ray_and_aabb() {
        let ray = Ray::new(Vec3::new(-100.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let t = ray_and_aabb(&ray, &unit_box()).expect("ray should hit the box");
        assert_relative_eq!(t, 99.0, epsilon = 1e-4);

        let away = Ray::new(Vec3::new(-100.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        assert!(ray_and_aabb(&away, &unit_box()).is_none());

        let parallel_miss = Ray::new(Vec3::new(-100.0, 5.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray_and_aabb(&parallel_miss, &unit_box()).is_none());

        let inside = Ray::new(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(ray_and_aabb(&inside, &unit_box()), Some(0.0));
    }

    #[test]
    fn test_ray_and_triangle() {
        let (a, b, c) = (Vec3::new(0.0, -1.0, -1.0), Vec3::new(0.0, 1.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let t = ray_and_triangle(&ray, &a, &b, &c).expect("ray should hit the triangle");
        assert_relative_eq!(ray.point_at(t), Vec3::zeros(), epsilon = 1e-5);

        // Triangle behind the origin
        let backwards = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray_and_triangle(&backwards, &a, &b, &c).is_none());

        // Parallel to the triangle plane
        let parallel = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert!(ray_and_triangle(&parallel, &a, &b, &c).is_none());
    }
}
