//! graphspace - A live, mutable 3D graph space.
//!
//! This crate keeps a graph laid out in 3D while an external model adds and
//! removes nodes and links: stable remote ids are translated to dense local
//! slots, a force-directed layout moves the nodes, and an octree answers
//! frustum and picking queries for the render stage.

pub mod attributes;
pub mod camera;
pub mod config;
pub mod entity;
pub mod error;
pub mod forces;
pub mod graph_file;
pub mod identity;
pub mod layout;
pub mod spatial;
pub mod store;
pub mod view;

pub use config::SpaceConfig;
pub use error::{EntityKind, Result, SpaceError};
pub use identity::{LocalId, RemoteId};
pub use view::{Command, SpaceView};
