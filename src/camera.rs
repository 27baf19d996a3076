//! 3D orbit camera
//!
//! Orbits a target point on spherical coordinates and produces the matrices,
//! view frustum and picking rays the core needs for visibility queries.

use glam::{Mat4, Vec3, Vec4};

use crate::spatial::{Frustum, Ray};

/// Default field of view in radians (60 degrees)
pub const DEFAULT_FOV: f32 = std::f32::consts::FRAC_PI_3;

pub const DEFAULT_NEAR: f32 = 0.1;

pub const DEFAULT_FAR: f32 = 1024.0;

/// Default camera distance from target
pub const DEFAULT_DISTANCE: f32 = 5.0;

/// Camera for orbit-style navigation
#[derive(Debug, Clone, PartialEq)]
pub struct Camera3D {
    /// Camera position in world space
    pub position: Vec3,
    /// Target point the camera looks at
    pub target: Vec3,
    pub up: Vec3,

    /// Field of view in radians
    pub fov: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -DEFAULT_DISTANCE),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: DEFAULT_FOV,
            aspect,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    /// Update aspect ratio on resize
    pub fn resize(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn look_at(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.position = position;
        self.target = target;
        self.up = up;
    }

    /// Place the camera on a sphere around the target.
    ///
    /// `theta` is the azimuth around Y, `phi` the angle from +Y.
    pub fn orbit(&mut self, distance: f32, theta: f32, phi: f32) {
        let phi = phi.clamp(0.01, std::f32::consts::PI - 0.01);
        self.position = self.target
            + Vec3::new(
                distance * phi.sin() * theta.sin(),
                distance * phi.cos(),
                distance * phi.sin() * theta.cos(),
            );
    }

    /// Zoom toward the target by a factor (< 1 moves closer)
    pub fn zoom(&mut self, factor: f32) {
        let offset = self.position - self.target;
        self.position = self.target + offset * factor.max(1e-3);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(self.view_projection_matrix())
    }

    /// Ray through a window pixel (origin top-left)
    pub fn create_ray(&self, x: f32, y: f32, width: f32, height: f32) -> Ray {
        let ndc_x = 2.0 * x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / height;
        let inverse = self.view_projection_matrix().inverse();

        let unproject = |z: f32| {
            let p = inverse * Vec4::new(ndc_x, ndc_y, z, 1.0);
            p.truncate() / p.w
        };
        let near = unproject(-1.0);
        let far = unproject(1.0);
        Ray::new(near, far - near)
    }
}
