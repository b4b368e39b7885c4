//! Per-entity map from relationship field to shared record.

use tandem_foundation::FieldName;

use crate::record::RecordId;

/// The relationship registry of one entity.
///
/// Holds record ids, never records; the same id may appear in the registry
/// of every entity taking part in the edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationshipRegistry {
    slots: im::HashMap<FieldName, RecordId>,
}

impl RelationshipRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record registered under `field`.
    #[must_use]
    pub fn get(&self, field: FieldName) -> Option<RecordId> {
        self.slots.get(&field).copied()
    }

    /// Registers `record` under `field`, returning the record it replaced.
    pub fn insert(&mut self, field: FieldName, record: RecordId) -> Option<RecordId> {
        self.slots.insert(field, record)
    }

    /// Unregisters `field`, returning its record.
    pub fn remove(&mut self, field: FieldName) -> Option<RecordId> {
        self.slots.remove(&field)
    }

    /// Returns the field other than `except` that refers to `record`.
    #[must_use]
    pub fn field_for(&self, record: RecordId, except: FieldName) -> Option<FieldName> {
        self.slots
            .iter()
            .find(|(field, id)| **id == record && **field != except)
            .map(|(field, _)| *field)
    }

    /// Returns the registered fields, sorted.
    #[must_use]
    pub fn fields(&self) -> Vec<FieldName> {
        let mut fields: Vec<_> = self.slots.keys().copied().collect();
        fields.sort_unstable();
        fields
    }

    /// Iterates `(field, record)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, RecordId)> + '_ {
        self.slots.iter().map(|(f, r)| (*f, *r))
    }

    /// Returns the number of registered fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no field is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
