//! Camera component
//!
//! Cameras look along their entity's forward axis (+Z when unrotated) with
//! +X to the right of the screen and +Y up. Pose is passed in from the
//! owning transform rather than stored, so a camera never goes stale.

use crate::foundation::math::{world_forward, world_up, Mat4, Point3, Quat, Vec3, Vec4};
use crate::geometry::{Frustum, Projection, Ray};
use crate::scene::SkyBox;

/// Screen-space rectangle a camera renders into, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

impl Viewport {
    /// Viewport anchored at the window origin
    pub const fn new(width: f32, height: f32) -> Self {
        Self { x: 0.0, y: 0.0, width, height }
    }

    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0.0 {
            1.0
        } else {
            self.width / self.height
        }
    }
}

/// Perspective or orthographic camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    enabled: bool,
    orthographic: bool,
    fov: f32,
    near: f32,
    far: f32,
    size: f32,
    aspect: f32,
    z_layer: f32,
    skybox: SkyBox,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            enabled: true,
            orthographic: false,
            fov: 60.0,
            near: 0.1,
            far: 1000.0,
            size: 1.0,
            aspect: 4.0 / 3.0,
            z_layer: 0.0,
            skybox: SkyBox::default(),
        }
    }
}

impl Camera {
    /// Perspective camera with default parameters
    pub fn perspective() -> Self {
        Self::default()
    }

    /// Orthographic camera showing `size` world units vertically
    pub fn orthographic(size: f32) -> Self {
        let mut camera = Self {
            orthographic: true,
            ..Self::default()
        };
        camera.set_size(size);
        camera
    }

    /// Whether the camera can become active
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the projection is orthographic
    pub const fn is_orthographic(&self) -> bool {
        self.orthographic
    }

    /// Vertical field of view in degrees
    pub const fn fov(&self) -> f32 {
        self.fov
    }

    /// Near clipping distance
    pub const fn clipping_near(&self) -> f32 {
        self.near
    }

    /// Far clipping distance
    pub const fn clipping_far(&self) -> f32 {
        self.far
    }

    /// Visible height of an orthographic camera
    pub const fn size(&self) -> f32 {
        self.size
    }

    /// Width over height
    pub const fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    /// Cameras on higher layers win the active camera selection
    pub const fn z_layer(&self) -> f32 {
        self.z_layer
    }

    /// Background drawn behind the scene
    pub const fn skybox(&self) -> &SkyBox {
        &self.skybox
    }

    /// Include the camera in active camera selection
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Exclude the camera from active camera selection
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Switch between orthographic and perspective projection
    pub fn set_orthographic(&mut self, orthographic: bool) {
        self.orthographic = orthographic;
    }

    /// Vertical field of view in degrees
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
    }

    /// Near clipping distance
    pub fn set_clipping_near(&mut self, near: f32) {
        self.near = near;
    }

    /// Far clipping distance
    pub fn set_clipping_far(&mut self, far: f32) {
        self.far = far;
    }

    /// Sizes below one world unit are raised to one
    pub fn set_size(&mut self, size: f32) {
        self.size = size.max(1.0);
    }

    /// Width over height
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Higher layers win active camera selection
    pub fn set_z_layer(&mut self, z_layer: f32) {
        self.z_layer = z_layer;
    }

    /// Replace the background
    pub fn set_skybox(&mut self, skybox: SkyBox) {
        self.skybox = skybox;
    }

    /// Projection parameters in effect
    pub fn projection(&self) -> Projection {
        if self.orthographic {
            Projection::Orthographic {
                size: self.size,
                aspect: self.aspect,
                near: self.near,
                far: self.far,
            }
        } else {
            Projection::Perspective {
                fov_degrees: self.fov,
                aspect: self.aspect,
                near: self.near,
                far: self.far,
            }
        }
    }

    /// Viewing volume for a camera at the given pose
    pub fn frustum(&self, position: &Vec3, rotation: &Quat) -> Frustum {
        Frustum::new(position, rotation, &self.projection())
    }

    /// Combined projection and view matrix for a camera at the given pose
    pub fn projection_matrix(&self, position: &Vec3, rotation: &Quat) -> Mat4 {
        let projection = if self.orthographic {
            let half_height = self.size * 0.5;
            let half_width = half_height * self.aspect;
            Mat4::new_orthographic(-half_width, half_width, -half_height, half_height, self.near, self.far)
        } else {
            Mat4::new_perspective(self.aspect, self.fov.to_radians(), self.near, self.far)
        };

        let eye = Point3::from(*position);
        let target = eye + rotation * world_forward();
        let view = Mat4::look_at_lh(&eye, &target, &(rotation * world_up()));

        // The projections above expect a view space looking down -Z
        let flip = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 1.0, -1.0));
        projection * flip * view
    }

    /// Unproject a window position to world space
    ///
    /// `screen` is in pixels with the origin at the top-left corner of the
    /// window; `screen.z` is the depth in `0..=1` from the near to the far
    /// plane.
    pub fn screen_to_world(&self, position: &Vec3, rotation: &Quat, viewport: &Viewport, screen: &Vec3) -> Option<Vec3> {
        let inverse = self.projection_matrix(position, rotation).try_inverse()?;

        let win_x = screen.x - viewport.x;
        let win_y = viewport.height - (screen.y - viewport.y);
        let ndc = Vec4::new(
            win_x / viewport.width * 2.0 - 1.0,
            win_y / viewport.height * 2.0 - 1.0,
            2.0 * screen.z - 1.0,
            1.0,
        );

        let world = inverse * ndc;
        if world.w == 0.0 {
            return None;
        }
        Some(world.xyz() / world.w)
    }

    /// Ray from the near plane through a window position
    pub fn screen_ray(&self, position: &Vec3, rotation: &Quat, viewport: &Viewport, screen_x: f32, screen_y: f32) -> Option<Ray> {
        let near = self.screen_to_world(position, rotation, viewport, &Vec3::new(screen_x, screen_y, 0.0))?;
        let far = self.screen_to_world(position, rotation, viewport, &Vec3::new(screen_x, screen_y, 1.0))?;
        Some(Ray::through(near, far))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::axis_angle_degrees;
    use approx::assert_relative_eq;

    #[test]
    fn test_size_floor() {
        let mut camera = Camera::orthographic(0.25);
        assert_eq!(camera.size(), 1.0);
        camera.set_size(8.0);
        assert_eq!(camera.size(), 8.0);
    }

    #[test]
    fn test_screen_center_looks_forward() {
        let camera = Camera::perspective();
        let viewport = Viewport::new(800.0, 600.0);
        let ray = camera
            .screen_ray(&Vec3::zeros(), &Quat::identity(), &viewport, 400.0, 300.0)
            .expect("projection should be invertible");
        assert_relative_eq!(ray.direction, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-3);
        assert_relative_eq!(ray.origin.z, camera.clipping_near(), epsilon = 1e-3);
    }

    #[test]
    fn test_screen_right_edge_matches_frustum_right() {
        let mut camera = Camera::perspective();
        camera.set_clipping_far(50.0);
        let viewport = Viewport::new(800.0, 600.0);
        let rotation = axis_angle_degrees(&world_up(), 30.0);
        let position = Vec3::new(5.0, 1.0, -2.0);

        let frustum = camera.frustum(&position, &rotation);
        let far_corner = camera
            .screen_to_world(&position, &rotation, &viewport, &Vec3::new(800.0, 0.0, 1.0))
            .expect("projection should be invertible");
        // Top-right far corner
        assert_relative_eq!(far_corner, frustum.corners()[6], epsilon = 1e-2);
    }

    #[test]
    fn test_projection_keeps_points_in_clip_volume() {
        let camera = Camera::orthographic(10.0);
        let matrix = camera.projection_matrix(&Vec3::zeros(), &Quat::identity());
        let clip = matrix * Vec4::new(2.0, 3.0, 50.0, 1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x > 0.0 && ndc.x < 1.0);
        assert!(ndc.y > 0.0 && ndc.y < 1.0);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }
}
