//! One-to-many relationship accessor.
//!
//! With a belongs-to inverse, every change is made from the member's side:
//! `post.comments.add(c)` is `c.post = post`, so the collection and the
//! member's back reference can never disagree. Without an inverse the
//! collection is kept one-sidedly in a record owned by the collection's
//! entity alone.

use tandem_foundation::{EntityId, Error, ErrorContext, FieldName, RelationshipKind, Result};

use crate::graph::Graph;
use crate::notify::ChangeSink;
use crate::record::RelationshipRecord;
use crate::schema::RelationshipSchema;

/// Accessor for one has-many field of one entity.
pub struct HasMany<'g, S> {
    graph: &'g mut Graph<S>,
    entity: EntityId,
    rel: RelationshipSchema,
}

impl<'g, S: ChangeSink> HasMany<'g, S> {
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

    /// Returns the members in insertion order.
    #[must_use]
    pub fn get(&self) -> Vec<EntityId> {
        self.graph.members(self.entity, self.rel.name).to_vec()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.members(self.entity, self.rel.name).len()
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.members(self.entity, self.rel.name).is_empty()
    }

    /// Returns true if `value` is a member.
    #[must_use]
    pub fn contains(&self, value: EntityId) -> bool {
        self.graph.has_member(self.entity, self.rel.name, value)
    }

    /// Appends `value`, moving it away from any previous owner.
    ///
    /// Returns false if `value` was already a member.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if `value` is not of the field's target type,
    /// an entity error if it is not live, and `SchemaConflict` if the
    /// inverse field does not resolve back to this field.
    pub fn add(&mut self, value: EntityId) -> Result<bool> {
        let result = self.graph.push_many(self.entity, &self.rel, value);
        self.graph.flush();
        result.map_err(|e| e.with_context(self.context("has_many.add")))
    }

    /// Removes `value`.
    ///
    /// Returns false if `value` was not a member.
    ///
    /// # Errors
    ///
    /// Same as [`HasMany::add`].
    pub fn remove(&mut self, value: EntityId) -> Result<bool> {
        let result = self.graph.pull_many(self.entity, &self.rel, value);
        self.graph.flush();
        result.map_err(|e| e.with_context(self.context("has_many.remove")))
    }

    /// Removes every member, returning how many there were.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the graph is found inconsistent.
    pub fn clear(&mut self) -> Result<usize> {
        let result = self.graph.clear_many(self.entity, &self.rel);
        self.graph.flush();
        result.map_err(|e| e.with_context(self.context("has_many.clear")))
    }

    fn context(&self, operation: &str) -> ErrorContext {
        ErrorContext::new()
            .with_operation(operation)
            .with_entity(self.entity)
            .with_field(self.rel.name)
    }
}

impl<S: ChangeSink> Graph<S> {
    pub(crate) fn push_many(
        &mut self,
        entity: EntityId,
        rel: &RelationshipSchema,
        value: EntityId,
    ) -> Result<bool> {
        let value_ty = self.type_of(value)?;
        if value_ty != rel.target {
            return Err(Error::type_mismatch(rel.name, rel.target, value_ty));
        }
        if self.has_member(entity, rel.name, value) {
            return Ok(false);
        }

        if let Some(back) = self.back_reference(entity, rel)? {
            self.write_one(value, &back, Some(entity))?;
            return Ok(true);
        }

        let rid = match self.registered(entity, rel.name)? {
            Some(rid) => rid,
            None => {
                let rid = self.records.create(RelationshipRecord::one_to_many(entity));
                self.register(entity, rel.name, rid)?;
                rid
            }
        };
        self.records.get_mut(rid)?.add(entity, value)?;
        self.check_record(rid)?;
        tracing::debug!(?entity, field = ?rel.name, member = ?value, "appended one-sided");
        self.notify(entity, rel.name);
        Ok(true)
    }

    pub(crate) fn pull_many(
        &mut self,
        entity: EntityId,
        rel: &RelationshipSchema,
        value: EntityId,
    ) -> Result<bool> {
        if !self.has_member(entity, rel.name, value) {
            return Ok(false);
        }

        if let Some(back) = self.back_reference(entity, rel)? {
            self.write_one(value, &back, None)?;
            return Ok(true);
        }

        // One-sided members may have been despawned since; no liveness check.
        let Some(rid) = self.registered(entity, rel.name)? else {
            return Ok(false);
        };
        let record = self.records.get_mut(rid)?;
        record.remove_member(entity, value);
        if !record.has_slot(entity) {
            self.unregister(entity, rel.name)?;
        }
        tracing::debug!(?entity, field = ?rel.name, member = ?value, "removed one-sided");
        self.notify(entity, rel.name);
        Ok(true)
    }

    pub(crate) fn clear_many(&mut self, entity: EntityId, rel: &RelationshipSchema) -> Result<usize> {
        let count = self.members(entity, rel.name).len();
        let ty = self.type_of(entity)?;
        let inverse = self.inverse_of(ty, rel.name)?;
        if self.detach(entity, rel, inverse)? {
            self.notify(entity, rel.name);
        }
        Ok(count)
    }

    /// Returns the belongs-to declaration through which members of
    /// `entity.rel` point back, or `None` for a one-sided collection.
    fn back_reference(
        &mut self,
        entity: EntityId,
        rel: &RelationshipSchema,
    ) -> Result<Option<RelationshipSchema>> {
        let ty = self.type_of(entity)?;
        let Some(inverse) = self.inverse_of(ty, rel.name)? else {
            return Ok(None);
        };
        let back = *self.schema().relationship(rel.target, inverse.field)?;
        let agrees = self
            .inverse_of(rel.target, inverse.field)?
            .is_some_and(|i| i.field == rel.name);
        if back.kind != RelationshipKind::OneToOne || !agrees {
            return Err(Error::schema_conflict(format!(
                "{:?}.{:?} is not the belongs-to inverse of {:?}.{:?}",
                rel.target, inverse.field, ty, rel.name
            )));
        }
        Ok(Some(back))
    }
}
