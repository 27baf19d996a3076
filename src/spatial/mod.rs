//! Spatial queries over the graph space.
//!
//! - [`bounds`]: `Aabb` - axis-aligned boxes and envelopes
//! - [`frustum`]: `Frustum` and `Ray` - view-volume culling and picking
//! - [`octree`]: `Octree` - rebuildable index over node and edge boxes

pub mod bounds;
pub mod frustum;
pub mod octree;

pub use bounds::Aabb;
pub use frustum::{Frustum, Plane, Ray};
pub use octree::{ElementRef, Octree, OctreeStats};
