//! Relationship records and the reference counted store that owns them.
//!
//! A record is one logical edge, or for one-to-many relationships the whole
//! edge set of one collection owner. Both endpoints' registries refer to the
//! same record by id; the record itself refers to nothing but entity ids.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use tandem_foundation::{EntityId, Error, Result};

/// Identifier of a record in a [`RecordStore`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

/// Shape of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Every slot holds at most one member.
    OneToOne,
    /// The collection owner's slot is unbounded; every other slot holds at
    /// most one member.
    OneToMany {
        /// The entity whose has-many field this record backs.
        collection_owner: EntityId,
    },
}

/// What an owner sees on the other side of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OtherSide<'a> {
    /// A single-valued slot.
    One(Option<EntityId>),
    /// A collection slot, in insertion order.
    Many(&'a [EntityId]),
}

impl OtherSide<'_> {
    /// Returns the single member, or the first member of a collection.
    #[must_use]
    pub fn first(self) -> Option<EntityId> {
        match self {
            Self::One(member) => member,
            Self::Many(members) => members.first().copied(),
        }
    }

    /// Copies the members out.
    #[must_use]
    pub fn to_vec(self) -> Vec<EntityId> {
        match self {
            Self::One(member) => member.into_iter().collect(),
            Self::Many(members) => members.to_vec(),
        }
    }
}

/// One logical relationship edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationshipRecord {
    kind: RecordKind,
    /// Owner to the entities it sees on the other side.
    members: BTreeMap<EntityId, Vec<EntityId>>,
    /// Every `(owner, member)` pair in `members`.
    index: HashSet<(EntityId, EntityId)>,
}

impl RelationshipRecord {
    /// Creates an empty one-to-one record.
    #[must_use]
    pub fn one_to_one() -> Self {
        Self {
            kind: RecordKind::OneToOne,
            members: BTreeMap::new(),
            index: HashSet::new(),
        }
    }

    /// Creates an empty one-to-many record backing `collection_owner`'s
    /// has-many field.
    #[must_use]
    pub fn one_to_many(collection_owner: EntityId) -> Self {
        Self {
            kind: RecordKind::OneToMany { collection_owner },
            members: BTreeMap::new(),
            index: HashSet::new(),
        }
    }

    /// Returns the record's kind.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns true if `owner`'s slot is a collection.
    #[must_use]
    pub fn is_collection_slot(&self, owner: EntityId) -> bool {
        matches!(self.kind, RecordKind::OneToMany { collection_owner } if collection_owner == owner)
    }

    /// Adds `related` to `owner`'s slot.
    ///
    /// Collection slots append and ignore members already present. A single
    /// slot accepts `related` if empty or already holding it.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if a single slot already holds a
    /// different entity; callers must detach the old member first.
    pub fn add(&mut self, owner: EntityId, related: EntityId) -> Result<()> {
        if self.contains(owner, related) {
            return Ok(());
        }
        let collection = self.is_collection_slot(owner);
        let slot = self.members.entry(owner).or_default();
        if !collection && !slot.is_empty() {
            return Err(Error::invariant(format!(
                "single slot of {owner:?} already holds {:?}, cannot add {related:?}",
                slot[0]
            )));
        }
        slot.push(related);
        self.index.insert((owner, related));
        Ok(())
    }

    /// Returns true if `member` is in `owner`'s slot.
    #[must_use]
    pub fn contains(&self, owner: EntityId, member: EntityId) -> bool {
        self.index.contains(&(owner, member))
    }

    /// Returns the number of members in `owner`'s slot.
    #[must_use]
    pub fn len_for(&self, owner: EntityId) -> usize {
        self.members.get(&owner).map_or(0, Vec::len)
    }

    /// Removes `owner`'s slot, returning its former members.
    pub fn remove(&mut self, owner: EntityId) -> Vec<EntityId> {
        let former = self.members.remove(&owner).unwrap_or_default();
        for member in &former {
            self.index.remove(&(owner, *member));
        }
        former
    }

    /// Removes one member from `owner`'s slot.
    ///
    /// Returns true if the member was present. An emptied slot is dropped.
    pub fn remove_member(&mut self, owner: EntityId, member: EntityId) -> bool {
        if !self.index.remove(&(owner, member)) {
            return false;
        }
        if let Some(slot) = self.members.get_mut(&owner) {
            if let Some(at) = slot.iter().position(|m| *m == member) {
                slot.remove(at);
            }
            if slot.is_empty() {
                self.members.remove(&owner);
            }
        }
        true
    }

    /// Returns what `owner` sees on the other side.
    #[must_use]
    pub fn other_side_for(&self, owner: EntityId) -> OtherSide<'_> {
        let slot = self.members.get(&owner).map_or(&[][..], Vec::as_slice);
        if self.is_collection_slot(owner) {
            OtherSide::Many(slot)
        } else {
            OtherSide::One(slot.first().copied())
        }
    }

    /// Returns true if `owner` has a non-empty slot.
    #[must_use]
    pub fn has_slot(&self, owner: EntityId) -> bool {
        self.members.contains_key(&owner)
    }

    /// Returns true if no owner has members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates owners with non-empty slots, in id order.
    pub fn owners(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.keys().copied()
    }

    /// Checks that single slots hold at most one member, that no slot
    /// repeats a member, and that the membership index matches the slots.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation describing the first bad slot.
    pub fn verify(&self) -> Result<()> {
        let mut listed = 0;
        for (owner, slot) in &self.members {
            if !self.is_collection_slot(*owner) && slot.len() > 1 {
                return Err(Error::invariant(format!(
                    "single slot of {owner:?} holds {} members",
                    slot.len()
                )));
            }
            let mut seen = HashSet::with_capacity(slot.len());
            for m in slot {
                if !seen.insert(*m) {
                    return Err(Error::invariant(format!(
                        "slot of {owner:?} lists {m:?} twice"
                    )));
                }
                if !self.index.contains(&(*owner, *m)) {
                    return Err(Error::invariant(format!(
                        "slot of {owner:?} lists unindexed {m:?}"
                    )));
                }
            }
            listed += slot.len();
        }
        if listed != self.index.len() {
            return Err(Error::invariant(format!(
                "index holds {} pairs but slots list {listed}",
                self.index.len()
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Entry {
    record: RelationshipRecord,
    refs: usize,
}

/// Owns records and counts the registry slots referring to each.
///
/// A record is dropped when its last reference is released.
#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    entries: im::HashMap<RecordId, Entry>,
    next_id: u64,
}

impl RecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record with no references yet.
    pub fn create(&mut self, record: RelationshipRecord) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, Entry { record, refs: 0 });
        tracing::trace!(?id, "record created");
        id
    }

    /// Adds a reference to a record.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the record does not exist.
    pub fn retain(&mut self, id: RecordId) -> Result<()> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| Error::invariant(format!("retain of missing {id:?}")))?;
        entry.refs += 1;
        Ok(())
    }

    /// Drops a reference, freeing the record when none remain.
    ///
    /// Returns true if the record was freed.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the record does not exist or has
    /// no references.
    pub fn release(&mut self, id: RecordId) -> Result<bool> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| Error::invariant(format!("release of missing {id:?}")))?;
        if entry.refs == 0 {
            return Err(Error::invariant(format!("release of unreferenced {id:?}")));
        }
        entry.refs -= 1;
        if entry.refs == 0 {
            self.entries.remove(&id);
            tracing::trace!(?id, "record freed");
            return Ok(true);
        }
        Ok(false)
    }

    /// Returns a record.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&RelationshipRecord> {
        self.entries.get(&id).map(|e| &e.record)
    }

    /// Returns a record mutably.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the record does not exist.
    pub fn get_mut(&mut self, id: RecordId) -> Result<&mut RelationshipRecord> {
        self.entries
            .get_mut(&id)
            .map(|e| &mut e.record)
            .ok_or_else(|| Error::invariant(format!("missing {id:?}")))
    }

    /// Returns the number of references to a record.
    #[must_use]
    pub fn refs(&self, id: RecordId) -> usize {
        self.entries.get(&id).map_or(0, |e| e.refs)
    }

    /// Returns the number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates live records.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &RelationshipRecord)> + '_ {
        self.entries.iter().map(|(id, e)| (*id, &e.record))
    }
}
