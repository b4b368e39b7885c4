//! Entity allocation with generational ids.
//!
//! Each live entity carries its type tag and, once it first takes part in a
//! relationship, its [`RelationshipRegistry`].

use tandem_foundation::{EntityId, Error, Result, TypeTag};

use crate::registry::RelationshipRegistry;

/// A live entity.
#[derive(Clone, Debug)]
pub struct Entity {
    /// The entity's type.
    pub ty: TypeTag,
    /// Created on first relationship write.
    pub(crate) registry: Option<RelationshipRegistry>,
}

impl Entity {
    fn new(ty: TypeTag) -> Self {
        Self { ty, registry: None }
    }

    /// Returns the registry, if one has been created.
    #[must_use]
    pub fn registry(&self) -> Option<&RelationshipRegistry> {
        self.registry.as_ref()
    }

    /// Returns the registry, creating it if needed.
    pub fn registry_mut(&mut self) -> &mut RelationshipRegistry {
        self.registry.get_or_insert_with(RelationshipRegistry::new)
    }
}

#[derive(Clone, Debug)]
struct Slot {
    /// Odd while occupied, even while free.
    generation: u32,
    entity: Option<Entity>,
}

/// Allocates entities and detects stale ids.
///
/// Freed slots are reused; a slot's generation goes up by one on spawn and
/// again on despawn, so a live generation is always odd.
#[derive(Clone, Debug)]
pub struct EntityStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    /// Most slots ever allocated.
    max_slots: u32,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::with_max_slots(u32::MAX)
    }
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that allocates at most `max_slots` slots.
    #[must_use]
    pub fn with_max_slots(max_slots: u32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            max_slots,
        }
    }

    /// Spawns an entity of type `ty`, reusing a free slot if there is one.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if every slot is live and no more can be
    /// allocated.
    pub fn spawn(&mut self, ty: TypeTag) -> Result<EntityId> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.entity = Some(Entity::new(ty));
            self.live += 1;
            return Ok(EntityId::new(index, slot.generation));
        }
        let index = u32::try_from(self.slots.len())
            .ok()
            .filter(|index| *index < self.max_slots)
            .ok_or_else(|| {
                Error::capacity_exceeded(format!("all {} entity slots are live", self.slots.len()))
            })?;
        self.slots.push(Slot {
            generation: 1,
            entity: Some(Entity::new(ty)),
        });
        self.live += 1;
        Ok(EntityId::new(index, 1))
    }

    /// Frees an entity's slot, returning the entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is stale or was never allocated.
    pub fn despawn(&mut self, id: EntityId) -> Result<Entity> {
        self.validate(id)?;
        let slot = &mut self.slots[id.slot as usize];
        slot.generation += 1;
        self.free.push(id.slot);
        self.live -= 1;
        slot.entity
            .take()
            .ok_or_else(|| Error::invariant(format!("live slot of {id:?} has no entity")))
    }

    /// Checks that an id refers to a live entity.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for unallocated or free slots and
    /// `StaleEntity` when the slot has moved on to a later generation.
    pub fn validate(&self, id: EntityId) -> Result<()> {
        let Some(slot) = self.slots.get(id.slot as usize) else {
            return Err(Error::entity_not_found(id));
        };
        if slot.generation != id.generation {
            return Err(Error::stale_entity(id));
        }
        if slot.entity.is_none() {
            return Err(Error::entity_not_found(id));
        }
        Ok(())
    }

    /// Returns true if the id refers to a live entity.
    #[must_use]
    pub fn exists(&self, id: EntityId) -> bool {
        self.validate(id).is_ok()
    }

    /// Returns a live entity.
    ///
    /// # Errors
    ///
    /// Same as [`EntityStore::validate`].
    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.validate(id)?;
        self.slots[id.slot as usize]
            .entity
            .as_ref()
            .ok_or_else(|| Error::entity_not_found(id))
    }

    /// Returns a live entity mutably.
    ///
    /// # Errors
    ///
    /// Same as [`EntityStore::validate`].
    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.validate(id)?;
        self.slots[id.slot as usize]
            .entity
            .as_mut()
            .ok_or_else(|| Error::entity_not_found(id))
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterates live entity ids in slot order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entity.as_ref()?;
            let index = u32::try_from(index).ok()?;
            Some(EntityId::new(index, slot.generation))
        })
    }
}
