//! Dense, tombstone-capable entity storage
//!
//! Slots are addressed by their index ([`LocalId`]). Removing an entity leaves
//! a tombstone behind so that every other local id stays valid; the lowest
//! tombstoned slot is handed out again by the next `add`.
//!
//! Each slot also carries a generation counter that is bumped on removal.
//! [`SlotHandle`] pairs an index with the generation it was issued for, so
//! holders of a handle (edges, octree elements) can detect that the slot has
//! since been freed or reused.

use std::collections::BTreeSet;

use glam::Vec3;
use rand::Rng;

use crate::identity::LocalId;

/// Weak, generation-checked reference to a store slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    pub index: LocalId,
    pub generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    entry: Option<T>,
    generation: u32,
}

/// Sequence of entities with stable slot indices
#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    slots: Vec<Slot<T>>,
    free: BTreeSet<LocalId>,
    live: usize,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: BTreeSet::new(),
            live: 0,
        }
    }

    /// Store an entity, reusing the lowest tombstoned slot if there is one
    pub fn add(&mut self, entity: T) -> SlotHandle {
        self.live += 1;
        if let Some(index) = self.free.pop_first() {
            let slot = &mut self.slots[index];
            slot.entry = Some(entity);
            return SlotHandle {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            entry: Some(entity),
            generation: 0,
        });
        SlotHandle {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Tombstone a slot, returning the entity it held
    pub fn remove(&mut self, index: LocalId) -> Option<T> {
        let slot = self.slots.get_mut(index)?;
        let entity = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.insert(index);
        self.live -= 1;
        Some(entity)
    }

    pub fn get(&self, index: LocalId) -> Option<&T> {
        self.slots.get(index)?.entry.as_ref()
    }

    pub fn get_mut(&mut self, index: LocalId) -> Option<&mut T> {
        self.slots.get_mut(index)?.entry.as_mut()
    }

    /// Current handle for a live slot
    pub fn handle(&self, index: LocalId) -> Option<SlotHandle> {
        let slot = self.slots.get(index)?;
        slot.entry.as_ref().map(|_| SlotHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Dereference a handle; `None` if the slot was freed or reused since
    pub fn resolve(&self, handle: SlotHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub fn resolve_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn contains(&self, index: LocalId) -> bool {
        self.get(index).is_some()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots including tombstones
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Live entities in ascending slot order
    pub fn iter(&self) -> impl Iterator<Item = (LocalId, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.entry.as_ref().map(|e| (i, e)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LocalId, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.entry.as_mut().map(|e| (i, e)))
    }

    /// Local ids of all live entities, ascending
    pub fn ids(&self) -> Vec<LocalId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Drop every entity and tombstone
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }
}

/// A movable entity driven by the layout simulation
pub trait Body {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn direction(&self) -> Vec3;
    fn set_direction(&mut self, direction: Vec3);
    fn speed(&self) -> f32;
    fn set_speed(&mut self, speed: f32);
    fn is_position_locked(&self) -> bool;
}

impl<T: Body> EntityStore<T> {
    /// Set the step length used by [`update`](Self::update) on every entity
    pub fn set_speed(&mut self, speed: f32) {
        for (_, body) in self.iter_mut() {
            body.set_speed(speed);
        }
    }

    /// Zero every pending direction
    pub fn reset_directions(&mut self) {
        for (_, body) in self.iter_mut() {
            body.set_direction(Vec3::ZERO);
        }
    }

    /// Scale directions to unit length (zero stays zero)
    pub fn normalize_directions(&mut self) {
        for (_, body) in self.iter_mut() {
            let direction = body.direction().normalize_or_zero();
            body.set_direction(direction);
        }
    }

    /// Add a uniform random offset in `[-amount, amount]` per axis to unlocked entities
    pub fn randomize_directions<R: Rng + ?Sized>(&mut self, rng: &mut R, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        for (_, body) in self.iter_mut() {
            if body.is_position_locked() {
                continue;
            }
            let jitter = Vec3::new(
                rng.random_range(-amount..=amount),
                rng.random_range(-amount..=amount),
                rng.random_range(-amount..=amount),
            );
            body.set_direction(body.direction() + jitter);
        }
    }

    /// Advance every unlocked entity by `direction * speed`
    pub fn update(&mut self) {
        for (_, body) in self.iter_mut() {
            if body.is_position_locked() {
                continue;
            }
            let position = body.position() + body.direction() * body.speed();
            body.set_position(position);
        }
    }
}
