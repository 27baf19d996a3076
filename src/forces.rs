//! Force contributors for the graph layout
//!
//! Each force adds into the pending `direction` of live, unlocked nodes. The
//! magnitudes only matter relative to each other: the layout driver
//! normalizes the accumulated direction before stepping, so every unlocked
//! node moves by the temperature per iteration.
//!
//! - **Repulsion**: all unordered node pairs push apart, `strength / d²`
//! - **Attraction**: linked nodes pull together like a spring, `strength * d`
//! - **Dust attractor**: nodes outside a radius are pulled back toward a center

use glam::Vec3;

use crate::config::ForceConfig;
use crate::entity::{SpaceEdge, SpaceNode};
use crate::identity::LocalId;
use crate::store::EntityStore;

/// A contributor to node displacement
pub trait Force {
    fn apply(&self, nodes: &mut EntityStore<SpaceNode>, edges: &EntityStore<SpaceEdge>);
}

/// Pairwise repulsion between all live nodes (exact O(n²))
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRepulsionForce {
    pub strength: f32,
    /// Distance floor that keeps near-coincident pairs from exploding
    pub min_distance: f32,
}

impl Force for NodeRepulsionForce {
    fn apply(&self, nodes: &mut EntityStore<SpaceNode>, _edges: &EntityStore<SpaceEdge>) {
        let bodies: Vec<(LocalId, Vec3)> = nodes.iter().map(|(id, n)| (id, n.position)).collect();
        let n = bodies.len();
        let mut push = vec![Vec3::ZERO; n];
        let min_sq = self.min_distance * self.min_distance;

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = bodies[i].1 - bodies[j].1;
                let dist_sq = delta.length_squared().max(min_sq);

                // Coulomb-like: F = k / r^2
                let force = delta.normalize_or_zero() * (self.strength / dist_sq);
                push[i] += force;
                push[j] -= force;
            }
        }

        for ((id, _), displacement) in bodies.into_iter().zip(push) {
            if let Some(node) = nodes.get_mut(id) {
                if !node.locked {
                    node.direction += displacement;
                }
            }
        }
    }
}

/// Linear spring along every live edge
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAttractionForce {
    pub strength: f32,
}

impl Force for LinkAttractionForce {
    fn apply(&self, nodes: &mut EntityStore<SpaceNode>, edges: &EntityStore<SpaceEdge>) {
        for (_, edge) in edges.iter() {
            let (Some(a), Some(b)) = (nodes.resolve(edge.node1), nodes.resolve(edge.node2)) else {
                continue;
            };
            if a.locked || b.locked {
                continue;
            }

            // Hooke's law with zero rest length: F = k * d
            let pull = (b.position - a.position) * self.strength;
            if let Some(a) = nodes.resolve_mut(edge.node1) {
                a.direction += pull;
            }
            if let Some(b) = nodes.resolve_mut(edge.node2) {
                b.direction -= pull;
            }
        }
    }
}

/// Pulls stray nodes back toward a center once they leave its radius
#[derive(Debug, Clone, PartialEq)]
pub struct DustAttractor {
    pub center: Vec3,
    pub radius: f32,
    pub strength: f32,
}

impl DustAttractor {
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Force for DustAttractor {
    fn apply(&self, nodes: &mut EntityStore<SpaceNode>, _edges: &EntityStore<SpaceEdge>) {
        for (_, node) in nodes.iter_mut() {
            if node.locked {
                continue;
            }
            let offset = self.center - node.position;
            let distance = offset.length();
            if distance > self.radius {
                node.direction += offset / distance * (self.strength * (distance - self.radius));
            }
        }
    }
}

/// The three contributors applied each layout iteration
#[derive(Debug, Clone, PartialEq)]
pub struct GraphForces {
    pub repulsion: NodeRepulsionForce,
    pub attraction: LinkAttractionForce,
    pub attractor: DustAttractor,
}

impl GraphForces {
    pub fn from_config(config: &ForceConfig) -> Self {
        Self {
            repulsion: NodeRepulsionForce {
                strength: config.repulsion,
                min_distance: config.repulsion_min_distance,
            },
            attraction: LinkAttractionForce {
                strength: config.attraction,
            },
            attractor: DustAttractor {
                center: config.attractor_center,
                radius: config.attractor_radius,
                strength: config.attractor_strength,
            },
        }
    }
}

impl Force for GraphForces {
    fn apply(&self, nodes: &mut EntityStore<SpaceNode>, edges: &EntityStore<SpaceEdge>) {
        self.repulsion.apply(nodes, edges);
        self.attraction.apply(nodes, edges);
        self.attractor.apply(nodes, edges);
    }
}
