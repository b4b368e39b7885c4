//! One-to-one relationship accessor.
//!
//! Writing `a.field = b` detaches `a` from its previous edge, then links it
//! to `b` through a single record shared with `b`'s inverse field:
//!
//! 1. detach `a.field`, notifying the previous counterpart's inverse field;
//! 2. resolve the inverse of `a.field`;
//! 3. if that inverse is one-to-one and `b` is linked through it to someone
//!    else, detach that link too;
//! 4. reuse `b`'s record for the inverse field, or create one and register
//!    it on `b`;
//! 5. register the record on `a`, add both memberships, notify both fields.
//!
//! Detach always precedes attach, so no entity is ever a member of two
//! exclusive one-to-one edges, even transiently. Notifications are queued
//! during the write and delivered once per `(entity, field)` when it ends.

use tandem_foundation::{EntityId, Error, ErrorContext, FieldName, RelationshipKind, Result};

use crate::graph::Graph;
use crate::inverse::Inverse;
use crate::notify::ChangeSink;
use crate::record::{OtherSide, RecordId, RelationshipRecord};
use crate::schema::RelationshipSchema;

/// Accessor for one belongs-to field of one entity.
pub struct BelongsTo<'g, S> {
    graph: &'g mut Graph<S>,
    entity: EntityId,
    rel: RelationshipSchema,
}

impl<'g, S: ChangeSink> BelongsTo<'g, S> {
    pub(crate) fn new(graph: &'g mut Graph<S>, entity: EntityId, rel: RelationshipSchema) -> Self {
        Self { graph, entity, rel }
    }

    /// The entity whose field this is.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// The field name.
    #[must_use]
    pub fn field(&self) -> FieldName {
        self.rel.name
    }

    /// Returns the related entity, or `None` if the field is empty.
    #[must_use]
    pub fn get(&self) -> Option<EntityId> {
        self.graph.read_one(self.entity, self.rel.name)
    }

    /// Sets the related entity, keeping the inverse side in step.
    ///
    /// Returns the value written.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if `value` is not of the field's target type,
    /// an entity error if `value` is not live, and `InvariantViolation` if
    /// the graph is found inconsistent.
    pub fn set(&mut self, value: Option<EntityId>) -> Result<Option<EntityId>> {
        let result = self.graph.write_one(self.entity, &self.rel, value);
        self.graph.flush();
        result.map_err(|e| e.with_context(self.context("belongs_to.set")))
    }

    /// Empties the field. Equivalent to `set(None)`.
    ///
    /// # Errors
    ///
    /// See [`BelongsTo::set`].
    pub fn clear(&mut self) -> Result<()> {
        self.set(None).map(|_| ())
    }

    fn context(&self, operation: &str) -> ErrorContext {
        ErrorContext::new()
            .with_operation(operation)
            .with_entity(self.entity)
            .with_field(self.rel.name)
    }
}

impl<S: ChangeSink> Graph<S> {
    pub(crate) fn read_one(&self, entity: EntityId, field: FieldName) -> Option<EntityId> {
        let rid = self.record_id(entity, field)?;
        let record = self.records.get(rid)?;
        match record.other_side_for(entity) {
            OtherSide::One(related) => related,
            // Self-loop through a has-many inverse: the owner sees itself.
            OtherSide::Many(_) => record.contains(entity, entity).then_some(entity),
        }
    }

    pub(crate) fn write_one(
        &mut self,
        entity: EntityId,
        rel: &RelationshipSchema,
        value: Option<EntityId>,
    ) -> Result<Option<EntityId>> {
        if let Some(value) = value {
            let actual = self.type_of(value)?;
            if actual != rel.target {
                return Err(Error::type_mismatch(rel.name, rel.target, actual));
            }
        }

        let owner_ty = self.type_of(entity)?;
        let inverse = self.inverse_of(owner_ty, rel.name)?;
        let had_edge = self.detach(entity, rel, inverse)?;

        let Some(value) = value else {
            if had_edge {
                self.notify(entity, rel.name);
            }
            return Ok(None);
        };

        if let Some(inverse) = inverse {
            if inverse.kind == RelationshipKind::OneToOne {
                self.release_inverse_holder(value, inverse)?;
            }
        }

        let (rid, reused) = self.record_for(entity, rel, value, inverse)?;

        self.register(entity, rel.name, rid)?;
        let record = self.records.get_mut(rid)?;
        record.add(entity, value)?;
        if inverse.is_some() {
            record.add(value, entity)?;
        }
        self.check_record(rid)?;

        tracing::debug!(
            ?entity,
            field = ?rel.name,
            related = ?value,
            record = ?rid,
            reused,
            reciprocal = inverse.is_some(),
            "linked"
        );
        self.notify(entity, rel.name);
        if let Some(inverse) = inverse {
            self.notify(value, inverse.field);
        }
        Ok(Some(value))
    }

    /// Detaches whatever `value` is linked to through its one-to-one
    /// inverse field, so `value` can take part in the new edge.
    fn release_inverse_holder(&mut self, value: EntityId, inverse: Inverse) -> Result<()> {
        if self.registered(value, inverse.field)?.is_none() {
            return Ok(());
        }
        let value_ty = self.type_of(value)?;
        let back = *self.schema().relationship(value_ty, inverse.field)?;
        let back_inverse = self.inverse_of(value_ty, inverse.field)?;
        tracing::debug!(?value, field = ?inverse.field, "releasing previous holder");
        self.detach(value, &back, back_inverse)?;
        Ok(())
    }

    /// Finds the record `entity.field = value` should use.
    ///
    /// Returns the record and whether it was reused from `value`.
    fn record_for(
        &mut self,
        entity: EntityId,
        rel: &RelationshipSchema,
        value: EntityId,
        inverse: Option<Inverse>,
    ) -> Result<(RecordId, bool)> {
        let Some(inverse) = inverse else {
            return Ok((self.records.create(RelationshipRecord::one_to_one()), false));
        };

        if let Some(rid) = self.registered(value, inverse.field)? {
            let clash = self
                .entities
                .get(entity)?
                .registry()
                .and_then(|r| r.field_for(rid, rel.name))
                .filter(|other| !(entity == value && *other == inverse.field));
            if let Some(other) = clash {
                return Err(Error::invariant(format!(
                    "{entity:?} already shares {rid:?} through {other:?}"
                )));
            }
            return Ok((rid, true));
        }

        let record = match inverse.kind {
            RelationshipKind::OneToMany => RelationshipRecord::one_to_many(value),
            RelationshipKind::OneToOne => RelationshipRecord::one_to_one(),
        };
        let rid = self.records.create(record);
        self.register(value, inverse.field, rid)?;
        Ok((rid, false))
    }
}
