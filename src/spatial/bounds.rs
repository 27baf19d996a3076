//! Axis-aligned bounding boxes.

use glam::Vec3;

/// Axis-aligned bounding box.
///
/// Both corners are inclusive. An empty box has `min > max` on every axis and
/// absorbs nothing until a point is included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner (inclusive).
    pub min: Vec3,
    /// Maximum corner (inclusive).
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from its corners.
    ///
    /// # Panics
    /// Debug-asserts that min <= max on all axes.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(
            min.cmple(max).all(),
            "AABB min must be <= max on all axes"
        );
        Self { min, max }
    }

    /// Create an empty box.
    pub fn empty() -> Self {
        Self {
            min: Vec3::INFINITY,
            max: Vec3::NEG_INFINITY,
        }
    }

    /// Create a box from center and half-extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box containing both points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Min/max envelope of a point set, `None` when the set is empty.
    pub fn envelope(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut bounds = Self::empty();
        for point in points {
            bounds.include_point(point);
        }
        (!bounds.is_empty()).then_some(bounds)
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Grow the box to contain a point.
    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow the box to contain another box.
    pub fn include(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Check if this box overlaps another (touching counts).
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Check if this box contains a point.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// One of the eight sub-boxes split at the center.
    ///
    /// Octant bits: bit 0 = +X half, bit 1 = +Y half, bit 2 = +Z half.
    pub fn octant(&self, octant: u8) -> Aabb {
        let center = self.center();
        let pick = |bit: u8, lo: f32, mid: f32, hi: f32| {
            if octant & bit == 0 { (lo, mid) } else { (mid, hi) }
        };
        let (x0, x1) = pick(1, self.min.x, center.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, center.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, center.z, self.max.z);
        Aabb {
            min: Vec3::new(x0, y0, z0),
            max: Vec3::new(x1, y1, z1),
        }
    }
}
