//! Rebuildable octree over node and edge bounding boxes.
//!
//! The tree is rebuilt wholesale from the entity stores; it is never updated
//! incrementally. Elements are stored as generation-checked handles, so an
//! index that outlives a store mutation resolves removed entities to nothing
//! instead of to whatever reused their slot.
//!
//! An element whose box straddles several children is referenced from each
//! of them (or kept at the parent when it overlaps all eight). Frustum
//! queries therefore stamp every element with the current pass token and
//! skip elements already carrying it, so each one is visited at most once.

use glam::Vec3;
use tracing::debug;

use super::{Aabb, Frustum};
use crate::config::OctreeConfig;
use crate::entity::{SpaceEdge, SpaceNode};
use crate::store::{EntityStore, SlotHandle};

const ROOT: usize = 0;

/// What an octree element refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Node(SlotHandle),
    Edge(SlotHandle),
}

#[derive(Debug, Clone)]
struct Element {
    reference: ElementRef,
    bounds: Aabb,
    /// Pass token of the last query that reached this element
    mark: u32,
}

#[derive(Debug, Clone)]
struct Cell {
    bounds: Aabb,
    /// Union of the boxes of every element stored in this subtree
    content: Aabb,
    depth: u32,
    children: Option<[usize; 8]>,
    elements: Vec<usize>,
}

impl Cell {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            content: Aabb::empty(),
            depth,
            children: None,
            elements: Vec::new(),
        }
    }
}

/// Shape summary of a built octree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctreeStats {
    pub cells: usize,
    pub leaves: usize,
    pub elements: usize,
    /// Element references across all cells (>= `elements` when boxes straddle cells)
    pub references: usize,
    pub depth: u32,
}

/// Octree spatial index
#[derive(Debug, Clone)]
pub struct Octree {
    cells: Vec<Cell>,
    elements: Vec<Element>,
    pass: u32,
    config: OctreeConfig,
}

impl Octree {
    /// Create an empty tree whose root covers `bounds`
    pub fn new(bounds: Aabb, config: OctreeConfig) -> Self {
        Self {
            cells: vec![Cell::new(bounds, 0)],
            elements: Vec::new(),
            pass: 0,
            config,
        }
    }

    /// Index every live node and edge.
    ///
    /// The root box is the envelope of live node positions. Returns `None`
    /// when there are no live nodes.
    pub fn build(
        nodes: &EntityStore<SpaceNode>,
        edges: &EntityStore<SpaceEdge>,
        icon_size: f32,
        config: &OctreeConfig,
    ) -> Option<Self> {
        let Some(bounds) = Aabb::envelope(nodes.iter().map(|(_, n)| n.position)) else {
            debug!("graph is empty, no octree built");
            return None;
        };
        debug!(min = ?bounds.min, max = ?bounds.max, "building octree");

        let mut octree = Self::new(bounds, config.clone());
        for (id, node) in nodes.iter() {
            if let Some(handle) = nodes.handle(id) {
                octree.insert(ElementRef::Node(handle), node.bounds(icon_size));
            }
        }
        for (id, edge) in edges.iter() {
            let endpoints = nodes.resolve(edge.node1).zip(nodes.resolve(edge.node2));
            if let (Some(handle), Some((a, b))) = (edges.handle(id), endpoints) {
                octree.insert(
                    ElementRef::Edge(handle),
                    Aabb::from_points(a.position, b.position),
                );
            }
        }
        octree.refresh_content();

        let stats = octree.stats();
        debug!(
            cells = stats.cells,
            elements = stats.elements,
            references = stats.references,
            depth = stats.depth,
            "octree built"
        );
        Some(octree)
    }

    /// Root box
    pub fn bounds(&self) -> Aabb {
        self.cells[ROOT].bounds
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Add an element. Query culling only accounts for it after the next
    /// [`refresh_content`](Self::refresh_content).
    pub fn insert(&mut self, reference: ElementRef, bounds: Aabb) {
        let element = self.elements.len();
        self.elements.push(Element {
            reference,
            bounds,
            mark: 0,
        });
        self.insert_into(ROOT, element);
    }

    fn insert_into(&mut self, cell: usize, element: usize) {
        if let Some(children) = self.cells[cell].children {
            let bounds = self.elements[element].bounds;
            let overlapping: Vec<usize> = children
                .into_iter()
                .filter(|&child| self.cells[child].bounds.overlaps(&bounds))
                .collect();
            if overlapping.is_empty() || overlapping.len() == children.len() {
                self.cells[cell].elements.push(element);
            } else {
                for child in overlapping {
                    self.insert_into(child, element);
                }
            }
            return;
        }

        self.cells[cell].elements.push(element);
        if self.should_split(cell) {
            self.split(cell);
        }
    }

    fn should_split(&self, cell: usize) -> bool {
        let cell = &self.cells[cell];
        cell.elements.len() > self.config.leaf_capacity
            && cell.depth < self.config.max_depth
            && cell.bounds.size().max_element() >= self.config.min_cell_size
    }

    fn split(&mut self, cell: usize) {
        let bounds = self.cells[cell].bounds;
        let depth = self.cells[cell].depth + 1;
        let first = self.cells.len();
        for octant in 0..8u8 {
            self.cells.push(Cell::new(bounds.octant(octant), depth));
        }
        let children: [usize; 8] = std::array::from_fn(|i| first + i);
        let elements = std::mem::take(&mut self.cells[cell].elements);
        self.cells[cell].children = Some(children);
        for element in elements {
            self.insert_into(cell, element);
        }
    }

    /// Recompute the per-cell content boxes used for culling
    pub fn refresh_content(&mut self) {
        // Children are always allocated after their parent.
        for cell in (0..self.cells.len()).rev() {
            let mut content = Aabb::empty();
            for &element in &self.cells[cell].elements {
                content.include(&self.elements[element].bounds);
            }
            if let Some(children) = self.cells[cell].children {
                for child in children {
                    content.include(&self.cells[child].content);
                }
            }
            self.cells[cell].content = content;
        }
    }

    fn next_pass(&mut self) -> u32 {
        self.pass = self.pass.wrapping_add(1);
        if self.pass == 0 {
            for element in &mut self.elements {
                element.mark = 0;
            }
            self.pass = 1;
        }
        self.pass
    }

    /// Visit every element whose box intersects the frustum, once each.
    ///
    /// Returns the number of visits.
    pub fn query_frustum<F>(&mut self, frustum: &Frustum, mut visitor: F) -> usize
    where
        F: FnMut(ElementRef),
    {
        let pass = self.next_pass();
        let mut visited = 0;
        let mut stack = vec![ROOT];

        while let Some(index) = stack.pop() {
            let cell = &self.cells[index];
            if !frustum.intersects_aabb(&cell.content) {
                continue;
            }
            for &e in &cell.elements {
                let element = &mut self.elements[e];
                if element.mark == pass {
                    continue;
                }
                element.mark = pass;
                if frustum.intersects_aabb(&element.bounds) {
                    visitor(element.reference);
                    visited += 1;
                }
            }
            if let Some(children) = cell.children {
                stack.extend(children);
            }
        }

        visited
    }

    /// Elements whose box contains the point, each once
    pub fn query_point(&self, point: Vec3) -> Vec<ElementRef> {
        let mut found = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let cell = &self.cells[index];
            if !cell.content.contains_point(point) {
                continue;
            }
            for &e in &cell.elements {
                let element = &self.elements[e];
                if element.bounds.contains_point(point) && !found.contains(&element.reference) {
                    found.push(element.reference);
                }
            }
            if let Some(children) = cell.children {
                stack.extend(children);
            }
        }
        found
    }

    /// Boxes of all cells, root first (for debug overlays)
    pub fn cell_bounds(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.cells.iter().map(|c| c.bounds)
    }

    pub fn stats(&self) -> OctreeStats {
        OctreeStats {
            cells: self.cells.len(),
            leaves: self.cells.iter().filter(|c| c.children.is_none()).count(),
            elements: self.elements.len(),
            references: self.cells.iter().map(|c| c.elements.len()).sum(),
            depth: self.cells.iter().map(|c| c.depth).max().unwrap_or(0),
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

    fn point_tree(points: &[Vec3], config: OctreeConfig) -> Octree {
        let bounds = Aabb::envelope(points.iter().copied()).unwrap();
        let mut tree = Octree::new(bounds, config);
        for (i, &p) in points.iter().enumerate() {
            tree.insert(
                ElementRef::Node(handle(i)),
                Aabb::from_center_half_extents(p, Vec3::splat(0.1)),
            );
        }
        tree.refresh_content();
        tree
    }

    fn grid(n: usize) -> Vec<Vec3> {
        let mut points = Vec::new();
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    points.push(Vec3::new(x as f32, y as f32, z as f32));
                }
            }
        }
        points
    }

    #[test]
    fn build_returns_none_for_empty_store() {
        let nodes = EntityStore::new();
        let edges = EntityStore::new();
        assert!(Octree::build(&nodes, &edges, 1.0, &OctreeConfig::default()).is_none());
    }

    #[test]
    fn build_indexes_nodes_and_edges() {
        let mut nodes = EntityStore::new();
        let a = nodes.add(SpaceNode::new("a").with_position(Vec3::new(-1.0, 0.0, 0.0)));
        let b = nodes.add(SpaceNode::new("b").with_position(Vec3::new(4.0, 2.0, 0.0)));
        let mut edges = EntityStore::new();
        let e = edges.add(SpaceEdge::new(a, b));

        let tree = Octree::build(&nodes, &edges, 1.0, &OctreeConfig::default()).unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.bounds().min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(tree.bounds().max, Vec3::new(4.0, 2.0, 0.0));
        let at_b = tree.query_point(Vec3::new(4.0, 2.0, 0.0));
        assert!(at_b.contains(&ElementRef::Node(b)));
        assert!(at_b.contains(&ElementRef::Edge(e)));
    }

    #[test]
    fn splits_when_leaf_overflows() {
        let config = OctreeConfig {
            leaf_capacity: 4,
            ..OctreeConfig::default()
        };
        let tree = point_tree(&grid(4), config);
        let stats = tree.stats();

        assert_eq!(stats.elements, 64);
        assert!(stats.cells > 1);
        assert!(stats.depth >= 1);
        assert!(stats.references >= stats.elements);
    }

    #[test]
    fn degenerate_root_never_splits() {
        let config = OctreeConfig {
            leaf_capacity: 1,
            ..OctreeConfig::default()
        };
        let tree = point_tree(&[Vec3::ZERO; 10], config);
        assert_eq!(tree.stats().cells, 1);
        assert_eq!(tree.bounds().size(), Vec3::ZERO);
    }

    #[test]
    fn depth_is_bounded() {
        let config = OctreeConfig {
            leaf_capacity: 1,
            max_depth: 2,
            min_cell_size: 0.0,
        };
        let tree = point_tree(&grid(5), config);
        assert!(tree.stats().depth <= 2);
    }

    #[test]
    fn frustum_query_visits_each_element_once() {
        let config = OctreeConfig {
            leaf_capacity: 2,
            ..OctreeConfig::default()
        };
        let mut tree = point_tree(&grid(4), config);
        let frustum = Frustum::from_aabb(&Aabb::new(Vec3::splat(-0.5), Vec3::splat(1.5)));

        let mut seen = Vec::new();
        let count = tree.query_frustum(&frustum, |e| seen.push(e));

        // The 2x2x2 corner of the grid
        assert_eq!(count, 8);
        let mut unique = seen.clone();
        unique.sort_by_key(|e| match e {
            ElementRef::Node(h) | ElementRef::Edge(h) => h.index,
        });
        unique.dedup();
        assert_eq!(unique.len(), seen.len());
    }

    #[test]
    fn repeated_queries_see_the_same_elements() {
        let mut tree = point_tree(&grid(3), OctreeConfig::default());
        let everything = Frustum::from_aabb(&Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0)));
        let corner = Frustum::from_aabb(&Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)));

        assert_eq!(tree.query_frustum(&everything, |_| {}), 27);
        assert_eq!(tree.query_frustum(&corner, |_| {}), 1);
        // Elements skipped by the previous pass must not look already visited
        assert_eq!(tree.query_frustum(&everything, |_| {}), 27);
        assert_eq!(tree.query_frustum(&everything, |_| {}), 27);
    }

    #[test]
    fn pass_token_wraps_without_skipping() {
        let mut tree = point_tree(&grid(2), OctreeConfig::default());
        let everything = Frustum::from_aabb(&Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0)));
        tree.pass = u32::MAX - 1;

        assert_eq!(tree.query_frustum(&everything, |_| {}), 8);
        assert_eq!(tree.query_frustum(&everything, |_| {}), 8);
        assert_eq!(tree.pass, 1);
        assert_eq!(tree.query_frustum(&everything, |_| {}), 8);
    }

    #[test]
    fn element_straddling_all_children_stays_at_parent() {
        let config = OctreeConfig {
            leaf_capacity: 1,
            ..OctreeConfig::default()
        };
        let bounds = Aabb::new(Vec3::ZERO, Vec3::splat(8.0));
        let mut tree = Octree::new(bounds, config);
        tree.insert(
            ElementRef::Node(handle(0)),
            Aabb::from_center_half_extents(Vec3::splat(1.0), Vec3::splat(0.1)),
        );
        tree.insert(
            ElementRef::Node(handle(1)),
            Aabb::from_center_half_extents(Vec3::splat(7.0), Vec3::splat(0.1)),
        );
        tree.insert(ElementRef::Edge(handle(0)), bounds);
        tree.refresh_content();

        assert_eq!(tree.cells[ROOT].elements.len(), 1);
        let stats = tree.stats();
        assert_eq!(stats.references, 3);
    }
}
