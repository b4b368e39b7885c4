//! Change notification.
//!
//! The graph calls a [`ChangeSink`] after every observable relationship
//! mutation. Propagating the notification further is the sink's business.

use std::collections::VecDeque;

use tandem_foundation::{EntityId, FieldName};

/// Receiver of relationship change notifications.
pub trait ChangeSink {
    /// Called after `entity.field` changed.
    fn notify_changed(&mut self, entity: EntityId, field: FieldName);
}

/// Sink that drops every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl ChangeSink for Discard {
    fn notify_changed(&mut self, _entity: EntityId, _field: FieldName) {}
}

/// One recorded notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Sequence number, monotonically increasing across the log's lifetime.
    pub seq: u64,
    /// The entity that changed.
    pub entity: EntityId,
    /// The field that changed.
    pub field: FieldName,
}

/// Ring buffer of the most recent notifications.
///
/// Keeps at most `capacity` records, discarding the oldest when full.
#[derive(Clone, Debug)]
pub struct ChangeLog {
    records: VecDeque<ChangeRecord>,
    capacity: usize,
    next_seq: u64,
}

impl ChangeLog {
    /// Creates a log holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            next_seq: 0,
        }
    }

    /// Returns the number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the total number of notifications ever received.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.next_seq
    }

    /// Clears all records. Sequence numbers keep increasing.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterates records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter()
    }

    /// Returns the most recent `count` records, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&ChangeRecord> {
        let skip = self.records.len().saturating_sub(count);
        self.records.iter().skip(skip).collect()
    }

    /// Returns the records for one entity, oldest first.
    #[must_use]
    pub fn for_entity(&self, entity: EntityId) -> Vec<&ChangeRecord> {
        self.records.iter().filter(|r| r.entity == entity).collect()
    }

    /// Counts notifications of `entity.field` still held.
    #[must_use]
    pub fn count_for(&self, entity: EntityId, field: FieldName) -> usize {
        self.records
            .iter()
            .filter(|r| r.entity == entity && r.field == field)
            .count()
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl ChangeSink for ChangeLog {
    fn notify_changed(&mut self, entity: EntityId, field: FieldName) {
        if self.capacity == 0 {
            self.next_seq += 1;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(ChangeRecord { seq, entity, field });
    }
}
