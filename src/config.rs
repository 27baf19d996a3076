//! Configuration context for the graph space
//!
//! [`SpaceConfig`] is owned by the application and handed to
//! [`SpaceView`](crate::view::SpaceView) at construction. It carries the
//! visual settings consulted by picking and indexing alongside the layout,
//! force and octree tuning. Every section has defaults, so a YAML file only
//! needs to name what it overrides.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Complete configuration for a [`SpaceView`](crate::view::SpaceView)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    pub layout: LayoutConfig,
    pub forces: ForceConfig,
    pub octree: OctreeConfig,
    pub display: DisplayConfig,
}

impl SpaceConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

/// Layout driver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Step length applied to each unit direction per iteration
    pub temperature: f32,
    /// Iteration bound, only enforced when `bounded` is set
    pub max_iterations: u32,
    pub bounded: bool,
    /// Per-axis jitter added after direction normalization
    pub jitter: f32,
    /// Seed for the jitter generator; every `play()` restarts from it
    pub seed: u64,
    /// Radius of the shell new nodes are spawned on
    pub spawn_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_iterations: 100,
            bounded: false,
            jitter: 0.01,
            seed: 0x5eed,
            spawn_radius: 2.0,
        }
    }
}

/// Force contributor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Pairwise repulsion numerator
    pub repulsion: f32,
    /// Distance below which repulsion stops growing
    pub repulsion_min_distance: f32,
    /// Spring constant for links
    pub attraction: f32,
    /// Global attractor center
    pub attractor_center: Vec3,
    /// Nodes inside this radius feel no attractor pull
    pub attractor_radius: f32,
    pub attractor_strength: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion: 1.0,
            repulsion_min_distance: 0.1,
            attraction: 1.0,
            attractor_center: Vec3::ZERO,
            attractor_radius: 50.0,
            attractor_strength: 0.1,
        }
    }
}

/// Octree construction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    pub max_depth: u32,
    /// Elements a leaf holds before it splits
    pub leaf_capacity: usize,
    /// Cells whose largest side is below this never split
    pub min_cell_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            leaf_capacity: 16,
            min_cell_size: 0.5,
        }
    }
}

/// Which node decorations are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShapes {
    None,
    Colors,
    Marks,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    Off,
    Lines,
    WideLines,
}

/// Where edge colors come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    NodeColor,
    LinkColor,
}

/// Visual settings shared with the render stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Scale applied to node sizes for icons, picking and indexing
    pub node_icon_size: f32,
    pub edge_size: f32,
    pub node_shapes: NodeShapes,
    pub show_node_labels: bool,
    pub edge_mode: EdgeMode,
    pub link_mode: LinkMode,
    pub show_edges: bool,
    pub show_edge_activity: bool,
    pub show_spheres: bool,
    pub show_debug: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            node_icon_size: 1.0,
            edge_size: 0.25,
            node_shapes: NodeShapes::All,
            show_node_labels: true,
            edge_mode: EdgeMode::Lines,
            link_mode: LinkMode::NodeColor,
            show_edges: true,
            show_edge_activity: true,
            show_spheres: true,
            show_debug: false,
        }
    }
}
