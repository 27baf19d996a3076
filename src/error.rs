//! Error types for the graph space core
//!
//! The only failure surface of the core is identity-map misuse at the event
//! boundary. Force, layout and spatial computations are total over the live
//! entity set and never return errors.

use std::fmt;

use thiserror::Error;

/// Which identity namespace an id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Link,
    Sphere,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Node => f.write_str("node"),
            EntityKind::Link => f.write_str("link"),
            EntityKind::Sphere => f.write_str("sphere"),
        }
    }
}

/// Errors reported by identity lookups and event handlers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpaceError {
    /// An event referenced a remote id that is not mapped
    #[error("unknown {kind} id: {id}")]
    UnknownEntityId { kind: EntityKind, id: u64 },

    /// A remote id was added twice
    #[error("duplicate {kind} id: {id}")]
    DuplicateRemoteId { kind: EntityKind, id: u64 },

    /// The supplied remote/local pair disagrees with the stored mapping
    #[error("inconsistent {kind} mapping: remote {remote} is not bound to local slot {local}")]
    InconsistentMapping {
        kind: EntityKind,
        remote: u64,
        local: usize,
    },
}

/// Result type for identity and event operations
pub type Result<T> = std::result::Result<T, SpaceError>;
