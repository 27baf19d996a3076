//! Graph interchange format for the command line
//!
//! A JSON document listing nodes and links by remote id. Loading one into a
//! [`SpaceView`] replays it as the same event sequence an interactive model
//! would send.

use std::collections::BTreeMap;
use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attributes::{LinkAttribute, NodeAttribute};
use crate::error::SpaceError;
use crate::identity::RemoteId;
use crate::view::SpaceView;

/// Errors that can occur while loading a graph file
#[derive(Error, Debug)]
pub enum GraphFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Space(#[from] SpaceError),
}

/// A node in the graph file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: RemoteId,

    #[serde(default)]
    pub label: String,

    /// Initial position; spawned around the origin when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec4>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

/// A link connecting two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub id: RemoteId,
    pub source: RemoteId,
    pub target: RemoteId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec4>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
}

/// Complete graph document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,

    #[serde(default)]
    pub links: Vec<GraphLink>,
}

impl GraphData {
    pub fn from_json_str(json: &str) -> Result<Self, GraphFileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, GraphFileError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Replay the document as add/set events, in file order
    pub fn load_into(&self, view: &mut SpaceView) -> Result<(), GraphFileError> {
        for node in &self.nodes {
            view.on_add_node(node.id, &node.label)?;
            if let Some(position) = node.position {
                view.on_set_node_attribute(node.id, NodeAttribute::Position(position))?;
            }
            if let Some(color) = node.color {
                view.on_set_node_attribute(node.id, NodeAttribute::Color(color))?;
            }
            if let Some(size) = node.size {
                view.on_set_node_attribute(node.id, NodeAttribute::Size(size))?;
            }
            if node.locked {
                view.on_set_node_attribute(node.id, NodeAttribute::Locked(true))?;
            }
        }
        for link in &self.links {
            view.on_add_link(link.id, link.source, link.target)?;
            if let Some(color) = link.color {
                view.on_set_link_attribute(link.id, LinkAttribute::Color(color))?;
            }
            if let Some(width) = link.width {
                view.on_set_link_attribute(link.id, LinkAttribute::Width(width))?;
            }
        }
        Ok(())
    }
}

/// Positions keyed by remote node id, as written by `graphspace layout`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionsFile {
    pub iterations: u32,
    pub positions: BTreeMap<RemoteId, Vec3>,
}
