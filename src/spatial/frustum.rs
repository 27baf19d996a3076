//! View frustum and picking ray.

use glam::{Mat4, Vec3, Vec4};

use super::Aabb;

/// Plane `normal . p + d = 0`; points with a non-negative distance are inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    fn from_coefficients(v: Vec4) -> Self {
        let normal = v.truncate();
        let length = normal.length();
        if length > 0.0 {
            Self {
                normal: normal / length,
                d: v.w / length,
            }
        } else {
            Self { normal, d: v.w }
        }
    }

    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// Six clip planes extracted from a view-projection matrix
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract planes from an OpenGL-convention view-projection matrix
    /// (clip-space depth in `[-w, w]`).
    pub fn from_view_projection(m: Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        Self {
            planes: [
                Plane::from_coefficients(r3 + r0), // left
                Plane::from_coefficients(r3 - r0), // right
                Plane::from_coefficients(r3 + r1), // bottom
                Plane::from_coefficients(r3 - r1), // top
                Plane::from_coefficients(r3 + r2), // near
                Plane::from_coefficients(r3 - r2), // far
            ],
        }
    }

    /// Axis-aligned box volume, handy for headless queries.
    pub fn from_aabb(bounds: &Aabb) -> Self {
        let plane = |normal: Vec3, point: Vec3| Plane {
            normal,
            d: -normal.dot(point),
        };
        Self {
            planes: [
                plane(Vec3::X, bounds.min),
                plane(Vec3::NEG_X, bounds.max),
                plane(Vec3::Y, bounds.min),
                plane(Vec3::NEG_Y, bounds.max),
                plane(Vec3::Z, bounds.min),
                plane(Vec3::NEG_Z, bounds.max),
            ],
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance(point) >= 0.0)
    }

    /// Conservative box test: `false` only if the box lies entirely outside
    /// one of the planes.
    pub fn intersects_aabb(&self, bounds: &Aabb) -> bool {
        if bounds.is_empty() {
            return false;
        }
        self.planes.iter().all(|p| {
            let farthest = Vec3::select(p.normal.cmpge(Vec3::ZERO), bounds.max, bounds.min);
            p.distance(farthest) >= 0.0
        })
    }
}

/// Half-line used for picking
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Distance along the ray to the first hit with a sphere, if any
    ///
    /// A ray starting inside the sphere hits it at its exit point.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let offset = self.origin - center;
        let b = offset.dot(self.direction);
        let c = offset.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }
}
