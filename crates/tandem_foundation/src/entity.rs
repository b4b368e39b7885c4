//! Entity identifiers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of an entity in a graph.
///
/// An id names a slot plus the generation that slot had when the entity was
/// spawned. Slots are recycled after despawn, and the generation bump makes
/// old ids detectably stale instead of silently aliasing the new occupant.
///
/// Ids are ordered by slot first, then generation, so collections keyed by
/// `EntityId` iterate deterministically.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId {
    /// Slot in the entity store.
    pub slot: u32,
    /// Generation of the slot at spawn time.
    pub generation: u32,
}

impl EntityId {
    /// Creates an entity id from its parts.
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.slot, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.slot)
    }
}
