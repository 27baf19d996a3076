//! Physical entities living in the graph space
//!
//! [`SpaceNode`]s are the bodies moved by the layout simulation,
//! [`SpaceEdge`]s connect two node slots, and [`SpaceSphere`]s are
//! groupings drawn around a set of member nodes.

use glam::{Vec3, Vec4};

use crate::spatial::Aabb;
use crate::store::{Body, SlotHandle};

/// Color constants (RGBA, normalized 0.0-1.0)
pub mod colors {
    use glam::Vec4;

    pub const WHITE: Vec4 = Vec4::new(1.0, 1.0, 1.0, 1.0);

    /// Marker palette indexed by mark number (wraps around)
    pub const MARKERS: [Vec4; 8] = [
        Vec4::new(0.290, 0.565, 0.851, 0.25),
        Vec4::new(0.314, 0.784, 0.471, 0.25),
        Vec4::new(0.608, 0.349, 0.714, 0.25),
        Vec4::new(0.902, 0.494, 0.133, 0.25),
        Vec4::new(0.906, 0.298, 0.235, 0.25),
        Vec4::new(0.945, 0.769, 0.059, 0.25),
        Vec4::new(0.102, 0.737, 0.612, 0.25),
        Vec4::new(0.584, 0.647, 0.651, 0.25),
    ];

    /// Palette color for a mark
    pub fn marker(mark: u32) -> Vec4 {
        MARKERS[mark as usize % MARKERS.len()]
    }
}

/// A graph node placed in 3D space
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceNode {
    pub label: String,
    pub position: Vec3,
    /// Displacement accumulated by the forces for the current iteration
    pub direction: Vec3,
    pub speed: f32,
    pub locked: bool,
    pub color: Vec4,
    pub size: f32,
    /// Level of detail; zero hides the node from picking
    pub lod: f32,
    pub activity: f32,
    pub mark: i32,
    pub icon: Option<String>,
}

impl SpaceNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            position: Vec3::ZERO,
            direction: Vec3::ZERO,
            speed: 0.0,
            locked: false,
            color: colors::WHITE,
            size: 1.0,
            lod: 1.0,
            activity: 0.0,
            mark: 0,
            icon: None,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Radius of the sphere used for picking and spatial indexing
    pub fn pick_radius(&self, icon_size: f32) -> f32 {
        icon_size * self.size / 2.0
    }

    pub fn bounds(&self, icon_size: f32) -> Aabb {
        Aabb::from_center_half_extents(self.position, Vec3::splat(self.pick_radius(icon_size)))
    }
}

impl Body for SpaceNode {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn direction(&self) -> Vec3 {
        self.direction
    }

    fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction;
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn is_position_locked(&self) -> bool {
        self.locked
    }
}

/// A link between two node slots
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceEdge {
    pub node1: SlotHandle,
    pub node2: SlotHandle,
    /// Endpoint colors (node1 side, node2 side)
    pub colors: [Vec4; 2],
    pub width: f32,
    pub activity: f32,
    pub lod: f32,
    pub icon: Option<String>,
    /// Colors changed since the last edge update
    pub dirty: bool,
}

impl SpaceEdge {
    pub fn new(node1: SlotHandle, node2: SlotHandle) -> Self {
        Self {
            node1,
            node2,
            colors: [colors::WHITE; 2],
            width: 1.0,
            activity: 0.0,
            lod: 1.0,
            icon: None,
            dirty: true,
        }
    }

    /// Whether either endpoint refers to the given node slot
    pub fn touches(&self, node: usize) -> bool {
        self.node1.index == node || self.node2.index == node
    }

    pub fn color(&self, side: usize) -> Vec4 {
        self.colors[side.min(1)]
    }

    pub fn set_color(&mut self, side: usize, color: Vec4) {
        self.colors[side.min(1)] = color;
        self.dirty = true;
    }
}

/// A grouping of nodes drawn as an enclosing sphere
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceSphere {
    pub label: String,
    pub position: Vec3,
    pub radius: f32,
    pub color: Vec4,
    pub members: Vec<SlotHandle>,
}

impl SpaceSphere {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            position: Vec3::ZERO,
            radius: 1.0,
            color: colors::marker(0),
            members: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(index: usize) -> SlotHandle {
        SlotHandle {
            index,
            generation: 0,
        }
    }

    #[test]
    fn node_defaults() {
        let node = SpaceNode::new("alpha");
        assert_eq!(node.label, "alpha");
        assert_eq!(node.color, colors::WHITE);
        assert_eq!(node.lod, 1.0);
        assert!(!node.locked);
    }

    #[test]
    fn node_bounds_follow_pick_radius() {
        let mut node = SpaceNode::new("n").with_position(Vec3::new(1.0, 2.0, 3.0));
        node.size = 2.0;

        let bounds = node.bounds(1.5);
        assert_eq!(bounds.min, Vec3::new(-0.5, 0.5, 1.5));
        assert_eq!(bounds.max, Vec3::new(2.5, 3.5, 4.5));
    }

    #[test]
    fn edge_touches_either_endpoint() {
        let edge = SpaceEdge::new(handle(1), handle(4));
        assert!(edge.touches(1));
        assert!(edge.touches(4));
        assert!(!edge.touches(2));
    }

    #[test]
    fn edge_color_setter_marks_dirty() {
        let mut edge = SpaceEdge::new(handle(0), handle(1));
        edge.dirty = false;
        edge.set_color(1, Vec4::new(1.0, 0.0, 0.0, 1.0));

        assert!(edge.dirty);
        assert_eq!(edge.color(1), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(edge.color(0), colors::WHITE);
    }

    #[test]
    fn marker_palette_wraps() {
        assert_eq!(colors::marker(0), colors::marker(8));
        assert_ne!(colors::marker(0), colors::marker(1));
    }
}
