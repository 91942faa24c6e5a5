//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene engine together with
//! the rotation helpers the transform hierarchy is built on.
//!
//! The engine uses a Y-up, X-right, Z-forward convention. Euler angles are
//! expressed in degrees as `(pitch, yaw, roll)` around `(X, Y, Z)` and applied
//! in yaw, pitch, roll order.

use std::f32::consts::{FRAC_PI_2, PI};

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Canonical up axis shared by every transform
pub fn world_up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// Canonical right axis shared by every transform
pub fn world_right() -> Vec3 {
    Vec3::new(1.0, 0.0, 0.0)
}

/// Canonical forward axis shared by every transform
pub fn world_forward() -> Vec3 {
    Vec3::new(0.0, 0.0, 1.0)
}

/// Build a translate * rotate * scale matrix
pub fn compose_matrix(position: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(position) * rotation.to_homogeneous() * Mat4::new_nonuniform_scaling(scale)
}

/// Transform a point by a homogeneous matrix
pub fn transform_point(matrix: &Mat4, point: &Vec3) -> Vec3 {
    matrix.transform_point(&Point3::from(*point)).coords
}

/// Rotation of `degrees` around `axis`
///
/// A zero axis yields the identity rotation.
pub fn axis_angle_degrees(axis: &Vec3, degrees: f32) -> Quat {
    Unit::try_new(*axis, f32::EPSILON)
        .map_or_else(Quat::identity, |axis| Quat::from_axis_angle(&axis, degrees.to_radians()))
}

/// Rotation from `(pitch, yaw, roll)` degrees
pub fn quat_from_euler_degrees(euler: &Vec3) -> Quat {
    let pitch = Quat::from_axis_angle(&Vector3::x_axis(), euler.x.to_radians());
    let yaw = Quat::from_axis_angle(&Vector3::y_axis(), euler.y.to_radians());
    let roll = Quat::from_axis_angle(&Vector3::z_axis(), euler.z.to_radians());
    yaw * pitch * roll
}

/// Decompose a rotation into `(pitch, yaw, roll)` degrees
///
/// Inverse of [`quat_from_euler_degrees`] away from the pitch singularity. At
/// +/-90 degrees of pitch the roll is folded into the yaw.
pub fn quat_to_euler_degrees(rotation: &Quat) -> Vec3 {
    let q = rotation.quaternion();
    let (x, y, z, w) = (q.i, q.j, q.k, q.w);

    let xx = x * x;
    let xy = x * y;
    let xz = x * z;
    let xw = x * w;
    let yy = y * y;
    let yz = y * z;
    let yw = y * w;
    let zz = z * z;
    let zw = z * w;

    let pitch = (-2.0 * (yz - xw)).clamp(-1.0, 1.0).asin();
    let (yaw, roll) = if pitch < FRAC_PI_2 {
        if pitch > -FRAC_PI_2 {
            (
                (2.0 * (xz + yw)).atan2(1.0 - 2.0 * (xx + yy)),
                (2.0 * (xy + zw)).atan2(1.0 - 2.0 * (xx + zz)),
            )
        } else {
            (-(-2.0 * (xy - zw)).atan2(1.0 - 2.0 * (yy + zz)), 0.0)
        }
    } else {
        ((-2.0 * (xy - zw)).atan2(1.0 - 2.0 * (yy + zz)), 0.0)
    };

    Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

/// Shortest rotation that maps direction `from` onto direction `to`
///
/// Opposite directions produce a half turn around an axis perpendicular to `from`.
pub fn rotation_to(from: &Vec3, to: &Vec3) -> Quat {
    Quat::rotation_between(from, to).unwrap_or_else(|| {
        let mut axis = world_right().cross(from);
        if axis.norm_squared() <= f32::EPSILON {
            axis = world_up().cross(from);
        }
        Unit::try_new(axis, f32::EPSILON)
            .map_or_else(Quat::identity, |axis| Quat::from_axis_angle(&axis, PI))
    })
}

/// Rotation whose forward axis points along `direction` with roll resolved by `up`
pub fn look_rotation(direction: &Vec3, up: &Vec3) -> Quat {
    let Some(z_axis) = direction.try_normalize(f32::EPSILON) else {
        return Quat::identity();
    };

    let x_axis = up.cross(&z_axis);
    let Some(x_axis) = x_axis.try_normalize(f32::EPSILON) else {
        return rotation_to(&world_forward(), &z_axis);
    };
    let y_axis = z_axis.cross(&x_axis);

    let basis = nalgebra::Rotation3::from_basis_unchecked(&[x_axis, y_axis, z_axis]);
    Quat::from_rotation_matrix(&basis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_euler_round_trip() {
        let euler = Vec3::new(10.0, 30.0, 5.0);
        let rotation = quat_from_euler_degrees(&euler);
        let back = quat_to_euler_degrees(&rotation);
        assert_relative_eq!(back, euler, epsilon = 1e-3);
    }

    #[test]
    fn test_yaw_only_euler() {
        let rotation = axis_angle_degrees(&world_up(), 90.0);
        let euler = quat_to_euler_degrees(&rotation);
        assert_relative_eq!(euler, Vec3::new(0.0, 90.0, 0.0), epsilon = 1e-3);
    }

    #[test]
    fn test_rotation_to_opposite_axis() {
        let rotation = rotation_to(&world_forward(), &-world_forward());
        assert_relative_eq!(rotation * world_forward(), -world_forward(), epsilon = EPSILON);
    }

    #[test]
    fn test_look_rotation_points_forward() {
        let direction = Vec3::new(1.0, 0.0, 1.0).normalize();
        let rotation = look_rotation(&direction, &world_up());
        assert_relative_eq!(rotation * world_forward(), direction, epsilon = EPSILON);
        // Roll stays level: the rotated right axis has no vertical component
        assert_relative_eq!((rotation * world_right()).y, 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_compose_matrix_order() {
        let matrix = compose_matrix(
            &Vec3::new(1.0, 2.0, 3.0),
            &axis_angle_degrees(&world_up(), 90.0),
            &Vec3::new(2.0, 2.0, 2.0),
        );
        // Scale first, then rotate X onto -Z, then translate
        let point = transform_point(&matrix, &Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(point, Vec3::new(1.0, 2.0, 1.0), epsilon = EPSILON);
    }
}
