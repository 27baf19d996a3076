//! The live graph space: event sink, per-frame driver and query surface
//!
//! [`SpaceView`] owns the identity maps, the entity stores, the layout driver
//! and the spatial index. An external graph model feeds it mutation events
//! (`on_*`), the host calls [`SpaceView::idle`] once per frame, and the
//! render stage reads it back through [`SpaceView::query_visible`] and the
//! picking methods.
//!
//! Every event validates all the ids it touches before mutating anything, so
//! a rejected event leaves the view exactly as it was.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::attributes::{LinkAttribute, NodeAttribute, Variable, VariableType, strip_namespace};
use crate::camera::Camera3D;
use crate::config::{EdgeMode, LinkMode, NodeShapes, SpaceConfig};
use crate::entity::{SpaceEdge, SpaceNode, SpaceSphere, colors};
use crate::error::{EntityKind, Result, SpaceError};
use crate::forces::GraphForces;
use crate::identity::{LocalId, RemoteId, TranslationMap};
use crate::layout::{LayoutDriver, PhysicsMode};
use crate::spatial::{Aabb, ElementRef, Frustum, Octree, OctreeStats, Ray};
use crate::store::EntityStore;

/// Host commands that are not tied to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    NodeDisplay { shapes: NodeShapes, labels: bool },
    EdgeMode(EdgeMode),
    ShowSpheres(bool),
    ShowDebug(bool),
}

/// Mutable 3D graph representation
#[derive(Debug)]
pub struct SpaceView {
    config: SpaceConfig,

    node_map: TranslationMap,
    link_map: TranslationMap,
    sphere_map: TranslationMap,

    nodes: EntityStore<SpaceNode>,
    edges: EntityStore<SpaceEdge>,
    spheres: EntityStore<SpaceSphere>,

    octree: Option<Octree>,
    dirty_octree: bool,

    layout: LayoutDriver,
    forces: GraphForces,

    camera: Camera3D,
    camera_animation: bool,

    spawn_rng: SmallRng,
}

impl SpaceView {
    pub fn new(config: SpaceConfig) -> Self {
        debug!("creating space view");
        Self {
            node_map: TranslationMap::new(EntityKind::Node),
            link_map: TranslationMap::new(EntityKind::Link),
            sphere_map: TranslationMap::new(EntityKind::Sphere),
            nodes: EntityStore::new(),
            edges: EntityStore::new(),
            spheres: EntityStore::new(),
            octree: None,
            dirty_octree: false,
            layout: LayoutDriver::new(&config.layout),
            forces: GraphForces::from_config(&config.forces),
            camera: Camera3D::new(1.0),
            camera_animation: false,
            spawn_rng: SmallRng::seed_from_u64(config.layout.seed),
            config,
        }
    }

    // ----- Accessors -----

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    pub fn nodes(&self) -> &EntityStore<SpaceNode> {
        &self.nodes
    }

    pub fn edges(&self) -> &EntityStore<SpaceEdge> {
        &self.edges
    }

    pub fn spheres(&self) -> &EntityStore<SpaceSphere> {
        &self.spheres
    }

    pub fn node_map(&self) -> &TranslationMap {
        &self.node_map
    }

    pub fn link_map(&self) -> &TranslationMap {
        &self.link_map
    }

    /// The spatial index, present only while paused and rebuilt
    pub fn octree(&self) -> Option<&Octree> {
        self.octree.as_ref()
    }

    /// Whether a mutation happened since the last index rebuild
    pub fn is_index_dirty(&self) -> bool {
        self.dirty_octree
    }

    pub fn layout(&self) -> &LayoutDriver {
        &self.layout
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera3D {
        &mut self.camera
    }

    pub fn camera_animation(&self) -> bool {
        self.camera_animation
    }

    pub fn node_position(&self, remote: RemoteId) -> Result<Vec3> {
        Ok(self.node(remote)?.position)
    }

    /// Current position of every node, keyed by remote id
    pub fn positions(&self) -> BTreeMap<RemoteId, Vec3> {
        self.node_map
            .iter()
            .filter_map(|(remote, local)| Some((remote, self.nodes.get(local)?.position)))
            .collect()
    }

    fn node(&self, remote: RemoteId) -> Result<&SpaceNode> {
        let local = self.node_map.get_local(remote)?;
        self.nodes.get(local).ok_or(SpaceError::InconsistentMapping {
            kind: EntityKind::Node,
            remote,
            local,
        })
    }

    fn node_mut(&mut self, remote: RemoteId) -> Result<&mut SpaceNode> {
        let local = self.node_map.get_local(remote)?;
        self.nodes.get_mut(local).ok_or(SpaceError::InconsistentMapping {
            kind: EntityKind::Node,
            remote,
            local,
        })
    }

    fn edge(&self, remote: RemoteId) -> Result<&SpaceEdge> {
        let local = self.link_map.get_local(remote)?;
        self.edges.get(local).ok_or(SpaceError::InconsistentMapping {
            kind: EntityKind::Link,
            remote,
            local,
        })
    }

    fn edge_mut(&mut self, remote: RemoteId) -> Result<&mut SpaceEdge> {
        let local = self.link_map.get_local(remote)?;
        self.edges.get_mut(local).ok_or(SpaceError::InconsistentMapping {
            kind: EntityKind::Link,
            remote,
            local,
        })
    }

    fn sphere_mut(&mut self, remote: RemoteId) -> Result<&mut SpaceSphere> {
        let local = self.sphere_map.get_local(remote)?;
        self.spheres.get_mut(local).ok_or(SpaceError::InconsistentMapping {
            kind: EntityKind::Sphere,
            remote,
            local,
        })
    }

    fn ensure_new(map: &TranslationMap, kind: EntityKind, remote: RemoteId) -> Result<()> {
        if map.contains(remote) {
            return Err(SpaceError::DuplicateRemoteId { kind, id: remote });
        }
        Ok(())
    }

    /// Random point on a shell of `[0.8, 1.0] * spawn_radius` around `center`
    fn spawn_position(&mut self, center: Vec3) -> Vec3 {
        let radius = self.config.layout.spawn_radius * self.spawn_rng.random_range(0.8_f32..=1.0);
        let polar = self.spawn_rng.random_range(0.0..std::f32::consts::PI);
        let azimuth = self.spawn_rng.random_range(0.0..std::f32::consts::TAU);
        center
            + radius
                * Vec3::new(
                    polar.sin() * azimuth.cos(),
                    polar.cos(),
                    polar.sin() * azimuth.sin(),
                )
    }

    /// Allocate a node slot near `center` and bind it to `remote`
    fn push_node_around(&mut self, remote: RemoteId, label: &str, center: Vec3) -> Result<LocalId> {
        let position = self.spawn_position(center);
        let handle = self.nodes.add(SpaceNode::new(label).with_position(position));
        if let Err(err) = self.node_map.add(remote, handle.index) {
            self.nodes.remove(handle.index);
            return Err(err);
        }
        Ok(handle.index)
    }

    fn push_edge(&mut self, remote: RemoteId, node1: LocalId, node2: LocalId) -> Result<LocalId> {
        let (Some(a), Some(b)) = (self.nodes.handle(node1), self.nodes.handle(node2)) else {
            let missing = if self.nodes.contains(node1) { node2 } else { node1 };
            return Err(SpaceError::InconsistentMapping {
                kind: EntityKind::Node,
                remote: self.node_map.get_remote(missing).unwrap_or_default(),
                local: missing,
            });
        };
        let handle = self.edges.add(SpaceEdge::new(a, b));
        if let Err(err) = self.link_map.add(remote, handle.index) {
            self.edges.remove(handle.index);
            return Err(err);
        }
        Ok(handle.index)
    }

    // ----- Graph events -----

    /// View-level attributes (`space:update`, `space:animation`,
    /// `space:linkmode`, `space:debug`). Anything else is ignored.
    pub fn on_set_attribute(&mut self, name: &str, kind: VariableType, value: &str) {
        let Some(variable) = Variable::parse(kind, value) else {
            debug!(name, value, "ignoring unparsable view attribute");
            return;
        };
        match (name, variable) {
            ("space:update", Variable::Bool(_)) => self.apply_degree_tint(),
            ("space:animation", Variable::Bool(enabled)) => self.camera_animation = enabled,
            ("space:linkmode", Variable::String(mode)) => match mode.as_str() {
                "node_color" => self.config.display.link_mode = LinkMode::NodeColor,
                "link_color" => self.config.display.link_mode = LinkMode::LinkColor,
                _ => debug!(mode, "unknown link mode"),
            },
            ("space:debug", Variable::Bool(enabled)) => self.config.display.show_debug = enabled,
            _ => debug!(name, "ignoring view attribute"),
        }
    }

    pub fn on_add_node(&mut self, remote: RemoteId, label: &str) -> Result<()> {
        Self::ensure_new(&self.node_map, EntityKind::Node, remote)?;
        self.push_node_around(remote, label, Vec3::ZERO)?;
        self.dirty_octree = true;
        Ok(())
    }

    /// Remove a node together with every edge attached to it
    pub fn on_remove_node(&mut self, remote: RemoteId) -> Result<()> {
        let local = self.node_map.get_local(remote)?;
        self.node_map.erase(remote, local)?;

        let attached: Vec<LocalId> = self
            .edges
            .iter()
            .filter(|(_, edge)| edge.touches(local))
            .map(|(id, _)| id)
            .collect();
        for id in attached {
            self.edges.remove(id);
            self.link_map.erase_local(id);
        }
        for (_, sphere) in self.spheres.iter_mut() {
            sphere.members.retain(|member| member.index != local);
        }
        self.nodes.remove(local);

        self.dirty_octree = true;
        Ok(())
    }

    pub fn on_add_link(&mut self, remote: RemoteId, source: RemoteId, target: RemoteId) -> Result<()> {
        Self::ensure_new(&self.link_map, EntityKind::Link, remote)?;
        let node1 = self.node_map.get_local(source)?;
        let node2 = self.node_map.get_local(target)?;
        self.push_edge(remote, node1, node2)?;
        self.dirty_octree = true;
        Ok(())
    }

    pub fn on_remove_link(&mut self, remote: RemoteId) -> Result<()> {
        let local = self.link_map.get_local(remote)?;
        self.link_map.erase(remote, local)?;
        self.edges.remove(local);
        self.dirty_octree = true;
        Ok(())
    }

    pub fn on_set_node_attribute(&mut self, remote: RemoteId, attribute: NodeAttribute) -> Result<()> {
        let reindex = matches!(attribute, NodeAttribute::Position(_) | NodeAttribute::Size(_));
        let node = self.node_mut(remote)?;
        match attribute {
            NodeAttribute::Locked(locked) => node.locked = locked,
            NodeAttribute::Position(position) => node.position = position,
            NodeAttribute::Color(color) => node.color = color,
            NodeAttribute::Lod(lod) => node.lod = lod,
            NodeAttribute::Activity(activity) => node.activity = activity,
            NodeAttribute::Icon(icon) => node.icon = Some(icon),
            NodeAttribute::Mark(mark) => node.mark = mark,
            NodeAttribute::Size(size) => node.size = size,
        }
        if reindex {
            self.dirty_octree = true;
        }
        Ok(())
    }

    /// Textual form of [`on_set_node_attribute`](Self::on_set_node_attribute).
    ///
    /// The id is checked first; an unsupported name/type pair is then ignored.
    pub fn on_set_node_attribute_text(
        &mut self,
        remote: RemoteId,
        name: &str,
        kind: VariableType,
        value: &str,
    ) -> Result<()> {
        self.node(remote)?;
        match NodeAttribute::parse(name, kind, value) {
            Some(attribute) => self.on_set_node_attribute(remote, attribute),
            None => {
                debug!(node = remote, name, "ignoring node attribute");
                Ok(())
            }
        }
    }

    pub fn on_set_link_attribute(&mut self, remote: RemoteId, attribute: LinkAttribute) -> Result<()> {
        let edge = self.edge_mut(remote)?;
        match attribute {
            LinkAttribute::Color(color) => {
                edge.set_color(0, color);
                edge.set_color(1, color);
            }
            LinkAttribute::Color1(color) => edge.set_color(0, color),
            LinkAttribute::Color2(color) => edge.set_color(1, color),
            LinkAttribute::Width(width) => edge.width = width,
            LinkAttribute::Activity(activity) => edge.activity = activity,
            LinkAttribute::Lod(lod) => edge.lod = lod,
            LinkAttribute::Icon(icon) => edge.icon = Some(icon),
        }
        Ok(())
    }

    /// Textual form of [`on_set_link_attribute`](Self::on_set_link_attribute)
    pub fn on_set_link_attribute_text(
        &mut self,
        remote: RemoteId,
        name: &str,
        kind: VariableType,
        value: &str,
    ) -> Result<()> {
        self.edge(remote)?;
        match LinkAttribute::parse(name, kind, value) {
            Some(attribute) => self.on_set_link_attribute(remote, attribute),
            None => {
                debug!(link = remote, name, "ignoring link attribute");
                Ok(())
            }
        }
    }

    pub fn on_set_node_label(&mut self, remote: RemoteId, label: &str) -> Result<()> {
        self.node_mut(remote)?.label = label.to_string();
        Ok(())
    }

    pub fn on_add_sphere(&mut self, remote: RemoteId, label: &str) -> Result<()> {
        Self::ensure_new(&self.sphere_map, EntityKind::Sphere, remote)?;
        let handle = self.spheres.add(SpaceSphere::new(label));
        if let Err(err) = self.sphere_map.add(remote, handle.index) {
            self.spheres.remove(handle.index);
            return Err(err);
        }
        Ok(())
    }

    pub fn on_set_sphere_mark(&mut self, remote: RemoteId, mark: u32) -> Result<()> {
        self.sphere_mut(remote)?.color = colors::marker(mark);
        Ok(())
    }

    /// Make a node a member of a sphere
    pub fn on_tag_node(&mut self, node: RemoteId, sphere: RemoteId) -> Result<()> {
        let local = self.node_map.get_local(node)?;
        let handle = self.nodes.handle(local).ok_or(SpaceError::InconsistentMapping {
            kind: EntityKind::Node,
            remote: node,
            local,
        })?;
        let sphere = self.sphere_mut(sphere)?;
        if !sphere.members.contains(&handle) {
            sphere.members.push(handle);
        }
        Ok(())
    }

    /// Create node `element.0` next to `neighbor`, linked to it by edge `element.1`
    pub fn on_add_neighbor(
        &mut self,
        element: (RemoteId, RemoteId),
        label: &str,
        neighbor: RemoteId,
    ) -> Result<()> {
        let (node, link) = element;
        let center = self.node_position(neighbor)?;
        let anchor = self.node_map.get_local(neighbor)?;
        Self::ensure_new(&self.node_map, EntityKind::Node, node)?;
        Self::ensure_new(&self.link_map, EntityKind::Link, link)?;

        let local = self.push_node_around(node, label, center)?;
        if let Err(err) = self.push_edge(link, anchor, local) {
            self.node_map.erase_local(local);
            self.nodes.remove(local);
            return Err(err);
        }
        self.dirty_octree = true;
        Ok(())
    }

    // ----- Queries -----

    /// View-level attribute, `None` for unknown names
    pub fn get_attribute(&self, name: &str) -> Option<Variable> {
        match strip_namespace(name) {
            "debug" => Some(Variable::Bool(self.config.display.show_debug)),
            "animation" => Some(Variable::Bool(self.camera_animation)),
            "temperature" => Some(Variable::Float(self.layout.temperature())),
            _ => None,
        }
    }

    pub fn get_node_attribute(&self, remote: RemoteId, name: &str) -> Result<Option<Variable>> {
        let node = self.node(remote)?;
        Ok(match strip_namespace(name) {
            "position" => Some(Variable::Vec3(node.position)),
            "color" => Some(Variable::Vec4(node.color)),
            "locked" => Some(Variable::Bool(node.locked)),
            "activity" => Some(Variable::Float(node.activity)),
            "mark" => Some(Variable::Int(node.mark)),
            "size" => Some(Variable::Float(node.size)),
            "label" => Some(Variable::String(node.label.clone())),
            _ => None,
        })
    }

    pub fn get_link_attribute(&self, remote: RemoteId, name: &str) -> Result<Option<Variable>> {
        let edge = self.edge(remote)?;
        Ok(match strip_namespace(name) {
            "activity" => Some(Variable::Float(edge.activity)),
            "color1" => Some(Variable::Vec4(edge.color(0))),
            "color2" => Some(Variable::Vec4(edge.color(1))),
            "width" => Some(Variable::Float(edge.width)),
            _ => None,
        })
    }

    /// Scale node colors by their relative degree.
    ///
    /// A node of maximum degree keeps its color, an isolated one is dimmed to
    /// 30%. Nothing changes when there are no edges.
    pub fn apply_degree_tint(&mut self) {
        let mut degrees = vec![0u32; self.nodes.slot_count()];
        let mut max_degree = 0;
        for (_, edge) in self.edges.iter() {
            for index in [edge.node1.index, edge.node2.index] {
                if let Some(degree) = degrees.get_mut(index) {
                    *degree += 1;
                    max_degree = max_degree.max(*degree);
                }
            }
        }

        for (id, node) in self.nodes.iter_mut() {
            let tint = if max_degree == 0 {
                1.0
            } else {
                0.3 + 0.7 * degrees[id] as f32 / max_degree as f32
            };
            node.color *= tint;
        }
        debug!(max_degree, "degree tint applied");
    }

    // ----- Simulation control -----

    pub fn notify(&mut self, command: Command) {
        let display = &mut self.config.display;
        match command {
            Command::Play => self.layout.play(),
            Command::Pause => self.layout.pause(),
            Command::NodeDisplay { shapes, labels } => {
                display.node_shapes = shapes;
                display.show_node_labels = labels;
            }
            Command::EdgeMode(mode) => display.edge_mode = mode,
            Command::ShowSpheres(show) => display.show_spheres = show,
            Command::ShowDebug(show) => display.show_debug = show,
        }
    }

    pub fn play(&mut self) {
        self.notify(Command::Play);
    }

    pub fn pause(&mut self) {
        self.notify(Command::Pause);
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.layout.set_temperature(temperature);
    }

    pub fn set_max_iterations(&mut self, max_iterations: u32, bounded: bool) {
        self.layout.set_max_iterations(max_iterations, bounded);
    }

    pub fn set_node_size(&mut self, size: f32) {
        self.config.display.node_icon_size = size;
        self.dirty_octree = true;
    }

    pub fn set_edge_size(&mut self, size: f32) {
        self.config.display.edge_size = size;
    }

    /// Per-frame tick: layout step, edge and sphere updates, index upkeep
    pub fn idle(&mut self) {
        self.update_nodes();
        self.update_links();
        self.update_spheres();

        if self.layout.mode() == PhysicsMode::Pause {
            self.update_octree();
        } else if self.octree.take().is_some() {
            debug!("layout running, octree dropped");
        }
    }

    fn update_nodes(&mut self) {
        if self.layout.step(&self.forces, &mut self.nodes, &self.edges) {
            self.dirty_octree = true;
        }
    }

    /// Refresh edge colors, returning how many edges were refreshed
    fn update_links(&mut self) -> usize {
        let display = &self.config.display;
        if !display.show_edges && !display.show_edge_activity {
            return 0;
        }
        let follow_nodes = display.link_mode == LinkMode::NodeColor;

        let mut refreshed = 0;
        for (_, edge) in self.edges.iter_mut() {
            if follow_nodes {
                let ends = self.nodes.resolve(edge.node1).zip(self.nodes.resolve(edge.node2));
                if let Some((a, b)) = ends {
                    edge.colors = [a.color, b.color];
                }
            } else if !edge.dirty {
                continue;
            }
            edge.dirty = false;
            refreshed += 1;
        }
        refreshed
    }

    fn update_spheres(&mut self) {
        for (_, sphere) in self.spheres.iter_mut() {
            let positions: Vec<Vec3> = sphere
                .members
                .iter()
                .filter_map(|&handle| self.nodes.resolve(handle))
                .map(|node| node.position)
                .collect();
            let (center, radius) = bounding_sphere(&positions);
            sphere.position = center;
            sphere.radius = radius;
        }
    }

    fn update_octree(&mut self) {
        if !self.dirty_octree {
            return;
        }
        if self.config.display.show_debug {
            debug!("updating octree");
        }
        self.octree = Octree::build(
            &self.nodes,
            &self.edges,
            self.config.display.node_icon_size,
            &self.config.octree,
        );
        self.dirty_octree = false;
    }

    /// Orbit the camera around the origin when animation is enabled
    pub fn animate_camera(&mut self, seconds: f32) -> bool {
        if !self.camera_animation {
            return false;
        }
        let radius = self.forces.attractor.radius() * (0.4 + 0.25 * (seconds / 30.0).cos());
        let position = Vec3::new(
            radius * (seconds / 10.0).cos(),
            radius * (seconds / 50.0).cos(),
            radius * (seconds / 10.0).sin(),
        );
        self.camera.look_at(position, Vec3::ZERO, Vec3::Y);
        true
    }

    // ----- Render-stage queries -----

    /// Visit every node and edge whose box intersects the frustum, once each.
    ///
    /// Uses the octree when it is current, a linear scan of the stores
    /// otherwise. Returns the number of visits.
    pub fn query_visible<F>(&mut self, frustum: &Frustum, mut visitor: F) -> usize
    where
        F: FnMut(ElementRef),
    {
        let indexed = match self.octree.as_mut() {
            Some(octree) if !self.dirty_octree => Some(octree.query_frustum(frustum, &mut visitor)),
            _ => None,
        };
        let visited = match indexed {
            Some(visited) => visited,
            None => self.scan_visible(frustum, &mut visitor),
        };
        if self.config.display.show_debug {
            debug!(visited, "elements visible");
        }
        visited
    }

    fn scan_visible<F>(&self, frustum: &Frustum, visitor: &mut F) -> usize
    where
        F: FnMut(ElementRef),
    {
        let icon_size = self.config.display.node_icon_size;
        let mut visited = 0;
        for (id, node) in self.nodes.iter() {
            if let Some(handle) = self.nodes.handle(id) {
                if frustum.intersects_aabb(&node.bounds(icon_size)) {
                    visitor(ElementRef::Node(handle));
                    visited += 1;
                }
            }
        }
        for (id, edge) in self.edges.iter() {
            let ends = self.nodes.resolve(edge.node1).zip(self.nodes.resolve(edge.node2));
            if let (Some(handle), Some((a, b))) = (self.edges.handle(id), ends) {
                if frustum.intersects_aabb(&Aabb::from_points(a.position, b.position)) {
                    visitor(ElementRef::Edge(handle));
                    visited += 1;
                }
            }
        }
        visited
    }

    /// Closest node whose pick sphere the ray hits; nodes with zero LOD are skipped
    pub fn pick(&self, ray: &Ray) -> Option<LocalId> {
        let icon_size = self.config.display.node_icon_size;
        let mut closest: Option<(LocalId, f32)> = None;
        for (id, node) in self.nodes.iter() {
            if node.lod == 0.0 {
                continue;
            }
            let Some(distance) = ray.intersect_sphere(node.position, node.pick_radius(icon_size))
            else {
                continue;
            };
            if closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((id, distance));
            }
        }
        closest.map(|(id, _)| id)
    }

    /// Pick through the camera at a window pixel
    pub fn pick_at(&self, x: f32, y: f32, width: f32, height: f32) -> Option<LocalId> {
        self.pick(&self.camera.create_ray(x, y, width, height))
    }

    pub fn summary(&self) -> SpaceSummary {
        SpaceSummary {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            spheres: self.spheres.len(),
            mode: self.layout.mode(),
            iterations: self.layout.iterations(),
            index: self.octree.as_ref().map(Octree::stats),
        }
    }
}

/// Barycenter of the points and the distance to the farthest one (at least 1)
fn bounding_sphere(points: &[Vec3]) -> (Vec3, f32) {
    if points.is_empty() {
        return (Vec3::ZERO, 1.0);
    }
    let center = points.iter().copied().sum::<Vec3>() / points.len() as f32;
    let radius = points
        .iter()
        .map(|p| p.distance(center))
        .fold(1.0_f32, f32::max);
    (center, radius)
}

/// Counts describing a view, for logs and the CLI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceSummary {
    pub nodes: usize,
    pub edges: usize,
    pub spheres: usize,
    pub mode: PhysicsMode,
    pub iterations: u32,
    pub index: Option<OctreeStats>,
}

impl fmt::Display for SpaceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            PhysicsMode::Play => "playing",
            PhysicsMode::Pause => "paused",
        };
        write!(
            f,
            "{} nodes, {} edges, {} spheres, {mode} at iteration {}",
            self.nodes, self.edges, self.spheres, self.iterations
        )?;
        match self.index {
            Some(stats) => write!(
                f,
                ", octree {} cells / {} elements / depth {}",
                stats.cells, stats.elements, stats.depth
            ),
            None => f.write_str(", no octree"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use glam::Vec4;

    fn view() -> SpaceView {
        SpaceView::new(SpaceConfig::default())
    }

    /// 1 - 2 - 3 path plus an isolated node 4
    fn path_view() -> SpaceView {
        let mut view = view();
        for id in 1..=4 {
            view.on_add_node(id, &format!("n{id}")).unwrap();
        }
        view.on_add_link(10, 1, 2).unwrap();
        view.on_add_link(11, 2, 3).unwrap();
        view
    }

    fn set_position(view: &mut SpaceView, id: RemoteId, p: Vec3) {
        view.on_set_node_attribute(id, NodeAttribute::Position(p))
            .unwrap();
    }

    #[test]
    fn new_nodes_spawn_on_a_shell() {
        let view = path_view();
        for (_, node) in view.nodes().iter() {
            let r = node.position.length();
            assert!((1.6 - 1e-4..=2.0 + 1e-4).contains(&r), "radius {r}");
        }
    }

    #[test]
    fn duplicate_and_unknown_ids_are_rejected() {
        let mut view = path_view();
        assert_eq!(
            view.on_add_node(1, "again"),
            Err(SpaceError::DuplicateRemoteId {
                kind: EntityKind::Node,
                id: 1
            })
        );
        assert_eq!(
            view.on_add_link(12, 1, 99),
            Err(SpaceError::UnknownEntityId {
                kind: EntityKind::Node,
                id: 99
            })
        );
        assert_eq!(view.nodes().len(), 4);
        assert_eq!(view.edges().len(), 2);
        assert!(view.on_remove_link(77).is_err());
        assert!(view.on_set_node_label(42, "x").is_err());
    }

    #[test]
    fn removing_a_node_cascades_to_its_edges() {
        let mut view = path_view();
        view.on_remove_node(2).unwrap();

        assert_eq!(view.edges().len(), 0);
        assert!(!view.link_map().contains(10));
        assert!(!view.link_map().contains(11));
        assert!(!view.node_map().contains(2));
        assert_eq!(view.nodes().len(), 3);
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut view = path_view();
        let freed = view.node_map().get_local(2).unwrap();
        view.on_remove_node(2).unwrap();
        view.on_add_node(20, "new").unwrap();

        assert_eq!(view.node_map().get_local(20).unwrap(), freed);
        assert_eq!(view.nodes().slot_count(), 4);
    }

    #[test]
    fn textual_attributes_are_converted() {
        let mut view = path_view();
        view.on_set_node_attribute_text(1, "space:position", VariableType::Vec3, "1 2 3")
            .unwrap();
        view.on_set_node_attribute_text(1, "space:mark", VariableType::Int, "4")
            .unwrap();
        view.on_set_node_attribute_text(1, "space:nonsense", VariableType::Int, "4")
            .unwrap();

        assert_eq!(
            view.get_node_attribute(1, "position").unwrap(),
            Some(Variable::Vec3(Vec3::new(1.0, 2.0, 3.0)))
        );
        assert_eq!(
            view.get_node_attribute(1, "mark").unwrap(),
            Some(Variable::Int(4))
        );
        assert_eq!(view.get_node_attribute(1, "nonsense").unwrap(), None);
        assert!(
            view.on_set_node_attribute_text(9, "space:mark", VariableType::Int, "4")
                .is_err()
        );
    }

    #[test]
    fn link_attributes_round_trip_through_queries() {
        let mut view = path_view();
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        view.on_set_link_attribute(10, LinkAttribute::Color(red))
            .unwrap();
        view.on_set_link_attribute_text(10, "space:activity", VariableType::Float, "0.5")
            .unwrap();

        assert_eq!(
            view.get_link_attribute(10, "color2").unwrap(),
            Some(Variable::Vec4(red))
        );
        assert_eq!(
            view.get_link_attribute(10, "activity").unwrap(),
            Some(Variable::Float(0.5))
        );
    }

    #[test]
    fn degree_tint_scales_by_relative_degree() {
        let mut view = path_view();
        view.on_set_attribute("space:update", VariableType::Bool, "true");

        let color = |view: &SpaceView, id| match view.get_node_attribute(id, "color").unwrap() {
            Some(Variable::Vec4(c)) => c,
            other => panic!("unexpected {other:?}"),
        };
        // Node 2 has the maximum degree, node 4 none
        assert!((color(&view, 2) - Vec4::ONE).length() < 1e-6);
        assert!((color(&view, 4) - Vec4::splat(0.3)).length() < 1e-6);
        assert!((color(&view, 1) - Vec4::splat(0.65)).length() < 1e-6);
    }

    #[test]
    fn degree_tint_without_edges_is_identity() {
        let mut view = view();
        view.on_add_node(1, "a").unwrap();
        view.apply_degree_tint();
        assert_eq!(view.nodes().get(0).unwrap().color, colors::WHITE);
    }

    #[test]
    fn view_attributes() {
        let mut view = view();
        assert_eq!(view.get_attribute("debug"), Some(Variable::Bool(false)));

        view.on_set_attribute("space:debug", VariableType::Bool, "true");
        view.on_set_attribute("space:animation", VariableType::Bool, "1");
        view.on_set_attribute("space:linkmode", VariableType::String, "link_color");

        assert_eq!(view.get_attribute("space:debug"), Some(Variable::Bool(true)));
        assert!(view.camera_animation());
        assert_eq!(view.config().display.link_mode, LinkMode::LinkColor);
        assert_eq!(view.get_attribute("unknown"), None);
    }

    #[test]
    fn neighbor_spawns_near_its_anchor() {
        let mut view = view();
        view.on_add_node(1, "hub").unwrap();
        set_position(&mut view, 1, Vec3::new(100.0, 0.0, 0.0));
        view.on_add_neighbor((2, 50), "leaf", 1).unwrap();

        let offset = view.node_position(2).unwrap() - Vec3::new(100.0, 0.0, 0.0);
        assert!(offset.length() <= 2.0 + 1e-4);
        assert!(view.link_map().contains(50));
        assert_eq!(view.edges().len(), 1);

        // Reusing the link id fails before anything is created
        assert!(view.on_add_neighbor((3, 50), "other", 1).is_err());
        assert!(!view.node_map().contains(3));
    }

    #[test]
    fn spheres_enclose_their_members() {
        let mut view = view();
        view.on_add_node(1, "a").unwrap();
        view.on_add_node(2, "b").unwrap();
        set_position(&mut view, 1, Vec3::new(-4.0, 0.0, 0.0));
        set_position(&mut view, 2, Vec3::new(4.0, 0.0, 0.0));
        view.on_add_sphere(7, "group").unwrap();
        view.on_tag_node(1, 7).unwrap();
        view.on_tag_node(2, 7).unwrap();
        view.on_set_sphere_mark(7, 3).unwrap();

        view.idle();
        let sphere = view.spheres().get(0).unwrap();
        assert_eq!(sphere.position, Vec3::ZERO);
        assert_eq!(sphere.radius, 4.0);
        assert_eq!(sphere.color, colors::marker(3));

        view.on_remove_node(2).unwrap();
        view.idle();
        let sphere = view.spheres().get(0).unwrap();
        assert_eq!(sphere.members.len(), 1);
        assert_eq!(sphere.position, Vec3::new(-4.0, 0.0, 0.0));
        assert_eq!(sphere.radius, 1.0);
    }

    #[test]
    fn edges_follow_node_colors_in_node_color_mode() {
        let mut view = path_view();
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);
        view.on_set_node_attribute(1, NodeAttribute::Color(blue))
            .unwrap();

        assert_eq!(view.update_links(), 2);
        assert_eq!(
            view.get_link_attribute(10, "color1").unwrap(),
            Some(Variable::Vec4(blue))
        );
    }

    #[test]
    fn link_color_mode_only_refreshes_dirty_edges() {
        let mut view = path_view();
        view.on_set_attribute("space:linkmode", VariableType::String, "link_color");
        assert_eq!(view.update_links(), 2);
        assert_eq!(view.update_links(), 0);

        view.on_set_link_attribute(11, LinkAttribute::Color2(Vec4::ONE))
            .unwrap();
        assert_eq!(view.update_links(), 1);
    }

    #[test]
    fn octree_is_rebuilt_only_while_paused() {
        let mut view = path_view();
        assert!(view.octree().is_none());
        assert!(view.is_index_dirty());

        view.idle();
        assert!(view.octree().is_some());
        assert!(!view.is_index_dirty());

        view.play();
        view.idle();
        assert!(view.octree().is_none());
        assert!(view.is_index_dirty());

        view.pause();
        view.idle();
        assert_eq!(view.octree().unwrap().len(), 6);
    }

    #[test]
    fn empty_graph_has_no_octree() {
        let mut view = view();
        view.on_add_node(1, "a").unwrap();
        view.on_remove_node(1).unwrap();
        view.idle();
        assert!(view.octree().is_none());
        assert!(!view.is_index_dirty());
    }

    #[test]
    fn octree_and_scan_agree() {
        let mut view = path_view();
        let frustum = Frustum::from_aabb(&Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0)));

        let scanned = view.query_visible(&frustum, |_| {});
        view.idle();
        assert!(view.octree().is_some());
        let indexed = view.query_visible(&frustum, |_| {});

        assert_eq!(scanned, 6);
        assert_eq!(indexed, 6);
    }

    #[test]
    fn pick_selects_closest_hit_and_skips_hidden_nodes() {
        let mut view = view();
        for id in 1..=3 {
            view.on_add_node(id, "n").unwrap();
        }
        set_position(&mut view, 1, Vec3::new(0.0, 0.0, 5.0));
        set_position(&mut view, 2, Vec3::new(0.0, 0.0, 5.4));
        set_position(&mut view, 3, Vec3::new(0.0, 0.0, 2.0));
        view.on_set_node_attribute(3, NodeAttribute::Lod(0.0))
            .unwrap();

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let picked = view.pick(&ray).unwrap();
        assert_eq!(view.node_map().get_remote(picked), Some(1));

        let miss = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert_eq!(view.pick(&miss), None);
    }

    #[test]
    fn pick_at_uses_the_camera() {
        let mut view = view();
        view.on_add_node(1, "center").unwrap();
        set_position(&mut view, 1, Vec3::ZERO);

        assert_eq!(view.pick_at(50.0, 50.0, 100.0, 100.0), Some(0));
        assert_eq!(view.pick_at(0.0, 0.0, 100.0, 100.0), None);
    }

    #[test]
    fn camera_animation_is_opt_in() {
        let mut view = view();
        assert!(!view.animate_camera(1.0));

        view.on_set_attribute("space:animation", VariableType::Bool, "true");
        assert!(view.animate_camera(0.0));
        let distance = view.camera().position.length();
        let expected = 50.0 * 0.65;
        assert!((distance - expected * 2f32.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn notify_updates_display_and_layout() {
        let mut view = view();
        view.notify(Command::NodeDisplay {
            shapes: NodeShapes::Marks,
            labels: false,
        });
        view.notify(Command::EdgeMode(EdgeMode::WideLines));
        view.notify(Command::ShowSpheres(false));
        view.notify(Command::Play);

        let display = &view.config().display;
        assert_eq!(display.node_shapes, NodeShapes::Marks);
        assert!(!display.show_node_labels);
        assert_eq!(display.edge_mode, EdgeMode::WideLines);
        assert!(!display.show_spheres);
        assert_eq!(view.layout().mode(), PhysicsMode::Play);
    }

    #[test]
    fn locked_nodes_stay_put_while_running() {
        let mut view = path_view();
        view.on_set_node_attribute(2, NodeAttribute::Locked(true))
            .unwrap();
        let pinned = view.node_position(2).unwrap();

        view.play();
        for _ in 0..25 {
            view.idle();
        }
        assert_eq!(view.node_position(2).unwrap(), pinned);
        assert_ne!(view.node_position(1).unwrap(), pinned);
    }

    #[test]
    fn bounded_layout_stops() {
        let config = SpaceConfig {
            layout: LayoutConfig {
                max_iterations: 5,
                bounded: true,
                ..LayoutConfig::default()
            },
            ..SpaceConfig::default()
        };
        let mut view = SpaceView::new(config);
        view.on_add_node(1, "a").unwrap();
        view.on_add_node(2, "b").unwrap();
        view.play();
        for _ in 0..20 {
            view.idle();
        }
        assert_eq!(view.layout().iterations(), 6);
    }

    #[test]
    fn summary_display() {
        let mut view = path_view();
        view.idle();
        insta::assert_snapshot!(
            view.summary().to_string(),
            @"4 nodes, 2 edges, 0 spheres, paused at iteration 0, octree 1 cells / 6 elements / depth 0"
        );
    }
}
