//! Bidirectional translation between remote ids and local store slots
//!
//! Remote ids are issued by the external graph model and stay stable for the
//! lifetime of an entity. Local ids are dense slot indices handed out by
//! [`EntityStore`](crate::store::EntityStore) and reused after removal. This
//! map only records the pairing; it never allocates slots itself.

use std::collections::HashMap;

use crate::error::{EntityKind, Result, SpaceError};

/// Remote id issued by the external model
pub type RemoteId = u64;

/// Local slot index inside an entity store
pub type LocalId = usize;

/// Remote <-> local id map for one entity namespace
#[derive(Debug, Clone)]
pub struct TranslationMap {
    kind: EntityKind,
    remote_to_local: HashMap<RemoteId, LocalId>,
    local_to_remote: HashMap<LocalId, RemoteId>,
}

impl TranslationMap {
    /// Create an empty map for the given namespace
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            remote_to_local: HashMap::new(),
            local_to_remote: HashMap::new(),
        }
    }

    /// Bind `remote` to `local`, updating both directions
    pub fn add(&mut self, remote: RemoteId, local: LocalId) -> Result<()> {
        if self.remote_to_local.contains_key(&remote) {
            return Err(SpaceError::DuplicateRemoteId {
                kind: self.kind,
                id: remote,
            });
        }
        if let Some(previous) = self.local_to_remote.insert(local, remote) {
            // A reused slot must have been released first.
            self.local_to_remote.insert(local, previous);
            return Err(SpaceError::InconsistentMapping {
                kind: self.kind,
                remote,
                local,
            });
        }
        self.remote_to_local.insert(remote, local);
        Ok(())
    }

    /// Look up the local slot of a remote id
    pub fn get_local(&self, remote: RemoteId) -> Result<LocalId> {
        self.remote_to_local
            .get(&remote)
            .copied()
            .ok_or(SpaceError::UnknownEntityId {
                kind: self.kind,
                id: remote,
            })
    }

    /// Look up the remote id bound to a local slot
    pub fn get_remote(&self, local: LocalId) -> Option<RemoteId> {
        self.local_to_remote.get(&local).copied()
    }

    pub fn contains(&self, remote: RemoteId) -> bool {
        self.remote_to_local.contains_key(&remote)
    }

    /// Remove the pairing `remote <-> local`
    ///
    /// Fails without modifying the map when the pair does not match what is stored.
    pub fn erase(&mut self, remote: RemoteId, local: LocalId) -> Result<()> {
        match self.remote_to_local.get(&remote) {
            Some(&stored) if stored == local => {
                self.remote_to_local.remove(&remote);
                self.local_to_remote.remove(&local);
                Ok(())
            }
            Some(_) => Err(SpaceError::InconsistentMapping {
                kind: self.kind,
                remote,
                local,
            }),
            None => Err(SpaceError::UnknownEntityId {
                kind: self.kind,
                id: remote,
            }),
        }
    }

    /// Remove whatever remote id is bound to `local`, returning it
    pub fn erase_local(&mut self, local: LocalId) -> Option<RemoteId> {
        let remote = self.local_to_remote.remove(&local)?;
        self.remote_to_local.remove(&remote);
        Some(remote)
    }

    pub fn len(&self) -> usize {
        self.remote_to_local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remote_to_local.is_empty()
    }

    /// Iterate over `(remote, local)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (RemoteId, LocalId)> + '_ {
        self.remote_to_local.iter().map(|(&r, &l)| (r, l))
    }
}
