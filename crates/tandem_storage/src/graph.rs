//! The entity graph: entities, their registries, and the shared records.
//!
//! All relationship mutation goes through `&mut Graph`, so there is exactly
//! one writer at a time. The accessor algorithms live in
//! [`belongs_to`](crate::belongs_to) and [`has_many`](crate::has_many);
//! this module holds the bookkeeping they share.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tandem_foundation::{
    EntityId, Error, FieldName, Interner, RelationshipKind, Result, TypeTag,
};

use crate::belongs_to::BelongsTo;
use crate::config::GraphConfig;
use crate::entity::EntityStore;
use crate::has_many::HasMany;
use crate::inverse::{Inverse, InverseLookup, InverseResolver, NoLookup};
use crate::notify::{ChangeLog, ChangeSink};
use crate::record::{OtherSide, RecordId, RecordStore, RelationshipRecord};
use crate::schema::{EntitySchema, RelationshipSchema, Schema};

/// An in-memory entity graph with reciprocal relationship bookkeeping.
///
/// `S` receives a notification for every observable relationship change;
/// the default [`ChangeLog`] keeps the most recent ones.
#[derive(Clone)]
pub struct Graph<S = ChangeLog> {
    interner: Interner,
    schema: Schema,
    pub(crate) entities: EntityStore,
    pub(crate) records: RecordStore,
    lookup: Arc<dyn InverseLookup>,
    inverse_cache: HashMap<(TypeTag, FieldName), Option<Inverse>>,
    /// Changes of the mutation in progress, in first-seen order.
    pending: Vec<(EntityId, FieldName)>,
    queued: HashSet<(EntityId, FieldName)>,
    sink: S,
    config: GraphConfig,
}

impl Graph<ChangeLog> {
    /// Creates an empty graph with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Creates an empty graph logging changes to a [`ChangeLog`].
    #[must_use]
    pub fn with_config(config: GraphConfig) -> Self {
        let log = ChangeLog::new(config.change_log_capacity);
        Self::with_sink(log, config)
    }
}

impl Default for Graph<ChangeLog> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ChangeSink> Graph<S> {
    /// Creates an empty graph sending changes to `sink`.
    #[must_use]
    pub fn with_sink(sink: S, config: GraphConfig) -> Self {
        Self {
            interner: Interner::new(),
            schema: Schema::new(),
            entities: EntityStore::new(),
            records: RecordStore::new(),
            lookup: Arc::new(NoLookup),
            inverse_cache: HashMap::new(),
            pending: Vec::new(),
            queued: HashSet::new(),
            sink,
            config,
        }
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Returns the interner.
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Returns the interner mutably.
    pub fn interner_mut(&mut self) -> &mut Interner {
        &mut self.interner
    }

    /// Returns the registered declarations.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Registers an entity type and its relationship fields.
    ///
    /// # Errors
    ///
    /// Returns a schema conflict if the type is already registered, or if an
    /// explicit inverse between registered types does not pair back. The
    /// graph is left unchanged on error.
    pub fn register_type(&mut self, schema: EntitySchema) -> Result<()> {
        tracing::debug!(ty = ?schema.ty, fields = schema.relationships.len(), "registering type");
        let mut next = self.schema.clone();
        next.register(schema)?;
        next.validate_registered()?;
        self.schema = next;
        self.inverse_cache.clear();
        Ok(())
    }

    /// Installs the fallback inverse lookup.
    pub fn set_inverse_lookup(&mut self, lookup: impl InverseLookup + 'static) {
        self.lookup = Arc::new(lookup);
        self.inverse_cache.clear();
    }

    /// Resolves the inverse of `ty.field`, memoised if configured.
    ///
    /// # Errors
    ///
    /// See [`InverseResolver::resolve`].
    pub fn inverse_of(&mut self, ty: TypeTag, field: FieldName) -> Result<Option<Inverse>> {
        if self.config.cache_inverses {
            if let Some(hit) = self.inverse_cache.get(&(ty, field)) {
                return Ok(*hit);
            }
        }
        let resolved = self.resolve_inverse(ty, field)?;
        if self.config.cache_inverses {
            self.inverse_cache.insert((ty, field), resolved);
        }
        Ok(resolved)
    }

    fn resolve_inverse(&self, ty: TypeTag, field: FieldName) -> Result<Option<Inverse>> {
        InverseResolver::new(&self.schema)
            .with_lookup(self.lookup.as_ref())
            .resolve(ty, field)
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Spawns an entity of a registered type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if the type was never registered, and
    /// `CapacityExceeded` if no entity slot is left.
    pub fn spawn(&mut self, ty: TypeTag) -> Result<EntityId> {
        if !self.schema.contains(ty) {
            return Err(Error::unknown_type(ty));
        }
        let id = self.entities.spawn(ty)?;
        tracing::trace!(entity = ?id, ?ty, "spawned");
        Ok(id)
    }

    /// Unlinks every relationship of an entity, then frees its id.
    ///
    /// Counterparts are notified as if each field had been cleared. Related
    /// entities are never deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not live.
    pub fn despawn(&mut self, entity: EntityId) -> Result<()> {
        let result = self.unlink_all(entity);
        self.flush();
        result
    }

    fn unlink_all(&mut self, entity: EntityId) -> Result<()> {
        let ty = self.type_of(entity)?;
        let fields = self
            .entities
            .get(entity)?
            .registry()
            .map(crate::registry::RelationshipRegistry::fields)
            .unwrap_or_default();
        for field in fields {
            let rel = *self.schema.relationship(ty, field)?;
            let inverse = self.inverse_of(ty, field)?;
            self.detach(entity, &rel, inverse)?;
        }
        self.entities.despawn(entity)?;
        tracing::debug!(?entity, "despawned");
        Ok(())
    }

    /// Returns true if the id refers to a live entity.
    #[must_use]
    pub fn exists(&self, entity: EntityId) -> bool {
        self.entities.exists(entity)
    }

    /// Returns an entity's type.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not live.
    pub fn type_of(&self, entity: EntityId) -> Result<TypeTag> {
        Ok(self.entities.get(entity)?.ty)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the one-to-one accessor for `entity.field`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not live, the field is not declared
    /// on its type, or the field is a has-many field.
    pub fn belongs_to(&mut self, entity: EntityId, field: FieldName) -> Result<BelongsTo<'_, S>> {
        let rel = self.field_schema(entity, field, RelationshipKind::OneToOne)?;
        Ok(BelongsTo::new(self, entity, rel))
    }

    /// Returns the one-to-many accessor for `entity.field`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not live, the field is not declared
    /// on its type, or the field is a belongs-to field.
    pub fn has_many(&mut self, entity: EntityId, field: FieldName) -> Result<HasMany<'_, S>> {
        let rel = self.field_schema(entity, field, RelationshipKind::OneToMany)?;
        Ok(HasMany::new(self, entity, rel))
    }

    fn field_schema(
        &self,
        entity: EntityId,
        field: FieldName,
        kind: RelationshipKind,
    ) -> Result<RelationshipSchema> {
        let ty = self.type_of(entity)?;
        let rel = *self.schema.relationship(ty, field)?;
        if rel.kind != kind {
            return Err(Error::kind_mismatch(field, kind));
        }
        Ok(rel)
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Returns the change sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the change sink mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Returns the record registered for `entity.field`, if any.
    #[must_use]
    pub fn record_id(&self, entity: EntityId, field: FieldName) -> Option<RecordId> {
        self.entities
            .get(entity)
            .ok()?
            .registry()?
            .get(field)
    }

    /// Returns a record.
    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<&RelationshipRecord> {
        self.records.get(id)
    }

    /// Returns the number of live records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Checks the whole graph for consistency.
    ///
    /// Verifies that every registry reference points at a live record, that
    /// reference counts match, that every record's slots are well formed,
    /// and that every reciprocal edge is visible from both ends.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation describing the first problem found.
    pub fn verify(&self) -> Result<()> {
        let mut refs: HashMap<RecordId, usize> = HashMap::new();
        for entity in self.entities.iter() {
            let Some(registry) = self.entities.get(entity)?.registry() else {
                continue;
            };
            for (_, rid) in registry.iter() {
                if self.records.get(rid).is_none() {
                    return Err(Error::invariant(format!(
                        "{entity:?} refers to freed {rid:?}"
                    )));
                }
                *refs.entry(rid).or_default() += 1;
            }
        }
        for (rid, record) in self.records.iter() {
            let counted = refs.get(&rid).copied().unwrap_or(0);
            if counted != self.records.refs(rid) {
                return Err(Error::invariant(format!(
                    "{rid:?} has {} references but {counted} registry slots",
                    self.records.refs(rid)
                )));
            }
            record.verify()?;
        }

        for entity in self.entities.iter() {
            let ty = self.type_of(entity)?;
            let Some(registry) = self.entities.get(entity)?.registry() else {
                continue;
            };
            for field in registry.fields() {
                let Some(inverse) = self.resolve_inverse(ty, field)? else {
                    continue;
                };
                for other in self.view(entity, field)? {
                    if !self.sees(other, inverse.field, entity)? {
                        return Err(Error::invariant(format!(
                            "{entity:?}.{field:?} sees {other:?} but {other:?}.{:?} does not see it",
                            inverse.field
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Members of `entity.field`, regardless of the field's kind.
    fn view(&self, entity: EntityId, field: FieldName) -> Result<Vec<EntityId>> {
        let ty = self.type_of(entity)?;
        Ok(match self.schema.relationship(ty, field)?.kind {
            RelationshipKind::OneToOne => self.read_one(entity, field).into_iter().collect(),
            RelationshipKind::OneToMany => self.members(entity, field).to_vec(),
        })
    }

    fn sees(&self, entity: EntityId, field: FieldName, member: EntityId) -> Result<bool> {
        let ty = self.type_of(entity)?;
        Ok(match self.schema.relationship(ty, field)?.kind {
            RelationshipKind::OneToOne => self.read_one(entity, field) == Some(member),
            RelationshipKind::OneToMany => self.has_member(entity, field, member),
        })
    }

    /// Members of a has-many field, borrowed from its record.
    pub(crate) fn members(&self, entity: EntityId, field: FieldName) -> &[EntityId] {
        let side = self
            .record_id(entity, field)
            .and_then(|rid| self.records.get(rid))
            .map(|record| record.other_side_for(entity));
        match side {
            Some(OtherSide::Many(members)) => members,
            _ => &[],
        }
    }

    /// Returns true if `member` is in `entity`'s slot of the record behind
    /// `entity.field`.
    pub(crate) fn has_member(&self, entity: EntityId, field: FieldName, member: EntityId) -> bool {
        self.record_id(entity, field)
            .and_then(|rid| self.records.get(rid))
            .is_some_and(|record| record.contains(entity, member))
    }

    // =========================================================================
    // Shared bookkeeping
    // =========================================================================

    pub(crate) fn registered(&self, entity: EntityId, field: FieldName) -> Result<Option<RecordId>> {
        Ok(self
            .entities
            .get(entity)?
            .registry()
            .and_then(|r| r.get(field)))
    }

    /// Registers `rid` under `entity.field`. Re-registering the same record
    /// is a no-op; replacing another record releases it.
    pub(crate) fn register(&mut self, entity: EntityId, field: FieldName, rid: RecordId) -> Result<()> {
        let previous = self
            .entities
            .get_mut(entity)?
            .registry_mut()
            .insert(field, rid);
        match previous {
            Some(prev) if prev == rid => return Ok(()),
            Some(prev) => {
                self.records.release(prev)?;
            }
            None => {}
        }
        self.records.retain(rid)
    }

    /// Unregisters `entity.field`, releasing its record.
    pub(crate) fn unregister(&mut self, entity: EntityId, field: FieldName) -> Result<Option<RecordId>> {
        let Some(registry) = self.entities.get_mut(entity)?.registry.as_mut() else {
            return Ok(None);
        };
        let Some(rid) = registry.remove(field) else {
            return Ok(None);
        };
        self.records.release(rid)?;
        Ok(Some(rid))
    }

    /// Queues a change notification for the mutation in progress.
    pub(crate) fn notify(&mut self, entity: EntityId, field: FieldName) {
        if self.queued.insert((entity, field)) {
            self.pending.push((entity, field));
        }
    }

    /// Delivers the queued notifications, each `(entity, field)` once.
    pub(crate) fn flush(&mut self) {
        self.queued.clear();
        for (entity, field) in self.pending.drain(..) {
            tracing::trace!(?entity, ?field, "changed");
            self.sink.notify_changed(entity, field);
        }
    }

    pub(crate) fn check_record(&self, rid: RecordId) -> Result<()> {
        if !self.config.verify_records {
            return Ok(());
        }
        match self.records.get(rid) {
            Some(record) => record.verify(),
            None => Ok(()),
        }
    }

    /// Detaches `entity.field` from its record.
    ///
    /// Every former counterpart loses `entity` from its inverse slot; a
    /// counterpart whose slot empties loses its registry entry. Counterparts
    /// are notified on their inverse field. `entity` itself is not notified.
    ///
    /// Returns true if a record was registered.
    pub(crate) fn detach(
        &mut self,
        entity: EntityId,
        rel: &RelationshipSchema,
        inverse: Option<Inverse>,
    ) -> Result<bool> {
        let Some(rid) = self.registered(entity, rel.name)? else {
            return Ok(false);
        };

        let record = self.records.get_mut(rid)?;
        let former = if rel.kind == RelationshipKind::OneToOne && record.is_collection_slot(entity) {
            // Self-loop through a has-many inverse: only the loop edge goes.
            if record.remove_member(entity, entity) {
                vec![entity]
            } else {
                Vec::new()
            }
        } else {
            record.remove(entity)
        };

        if let Some(inverse) = inverse {
            for other in &former {
                let record = self.records.get_mut(rid)?;
                record.remove_member(*other, entity);
                if !record.has_slot(*other) {
                    self.unregister(*other, inverse.field)?;
                }
                self.notify(*other, inverse.field);
            }
        }

        self.unregister(entity, rel.name)?;
        tracing::debug!(?entity, field = ?rel.name, record = ?rid, former = former.len(), "detached");
        Ok(true)
    }
}
