//! Relationship declarations.
//!
//! Each entity type declares its relationship fields up front. The engine
//! only reads these declarations; nothing is discovered by reflection.

use std::collections::HashMap;

use tandem_foundation::{Error, FieldName, RelationshipKind, Result, TypeTag};

use crate::inverse::InverseResolver;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the inverse of a relationship field is determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InverseSpec {
    /// Infer the inverse from the target type's declarations.
    #[default]
    Infer,
    /// The inverse is this field on the target type.
    Named(FieldName),
    /// The relationship is one-sided; never maintain an inverse.
    None,
}

/// Declaration of one relationship field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RelationshipSchema {
    /// Field name on the owning type (e.g. `comments`).
    pub name: FieldName,
    /// Type of the related entities.
    pub target: TypeTag,
    /// Cardinality of the field.
    pub kind: RelationshipKind,
    /// How the inverse field is found.
    pub inverse: InverseSpec,
}

impl RelationshipSchema {
    /// Declares a one-to-one (belongs-to) field.
    #[must_use]
    pub fn belongs_to(name: FieldName, target: TypeTag) -> Self {
        Self {
            name,
            target,
            kind: RelationshipKind::OneToOne,
            inverse: InverseSpec::Infer,
        }
    }

    /// Declares a one-to-many (has-many) field.
    #[must_use]
    pub fn has_many(name: FieldName, target: TypeTag) -> Self {
        Self {
            name,
            target,
            kind: RelationshipKind::OneToMany,
            inverse: InverseSpec::Infer,
        }
    }

    /// Names the inverse field explicitly.
    #[must_use]
    pub fn with_inverse(mut self, inverse: FieldName) -> Self {
        self.inverse = InverseSpec::Named(inverse);
        self
    }

    /// Marks the relationship as one-sided.
    #[must_use]
    pub fn without_inverse(mut self) -> Self {
        self.inverse = InverseSpec::None;
        self
    }
}

/// All relationship declarations of one entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntitySchema {
    /// The entity type.
    pub ty: TypeTag,
    /// Relationship fields, in declaration order.
    pub relationships: Vec<RelationshipSchema>,
}

impl EntitySchema {
    /// Creates a type with no relationship fields.
    #[must_use]
    pub fn new(ty: TypeTag) -> Self {
        Self {
            ty,
            relationships: Vec::new(),
        }
    }

    /// Adds a relationship field.
    #[must_use]
    pub fn with_relationship(mut self, relationship: RelationshipSchema) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Returns the declaration of a field.
    #[must_use]
    pub fn relationship(&self, name: FieldName) -> Option<&RelationshipSchema> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Returns the fields whose target is `ty`.
    pub fn relationships_targeting(
        &self,
        ty: TypeTag,
    ) -> impl Iterator<Item = &RelationshipSchema> + '_ {
        self.relationships.iter().filter(move |r| r.target == ty)
    }
}

/// The set of registered entity types.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Schema {
    types: HashMap<TypeTag, EntitySchema>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type.
    ///
    /// # Errors
    ///
    /// Returns a schema conflict if the type is already registered or
    /// declares the same field twice.
    pub fn register(&mut self, schema: EntitySchema) -> Result<()> {
        if self.types.contains_key(&schema.ty) {
            return Err(Error::schema_conflict(format!(
                "entity type already registered: {:?}",
                schema.ty
            )));
        }
        for (i, rel) in schema.relationships.iter().enumerate() {
            if schema.relationships[..i].iter().any(|r| r.name == rel.name) {
                return Err(Error::schema_conflict(format!(
                    "field {:?} declared twice on {:?}",
                    rel.name, schema.ty
                )));
            }
        }
        self.types.insert(schema.ty, schema);
        Ok(())
    }

    /// Returns the declarations of a type.
    #[must_use]
    pub fn entity(&self, ty: TypeTag) -> Option<&EntitySchema> {
        self.types.get(&ty)
    }

    /// Returns the declaration of a field.
    ///
    /// # Errors
    ///
    /// Returns an error if the type or the field is unknown.
    pub fn relationship(&self, ty: TypeTag, field: FieldName) -> Result<&RelationshipSchema> {
        self.entity(ty)
            .ok_or_else(|| Error::unknown_type(ty))?
            .relationship(field)
            .ok_or_else(|| Error::unknown_field(ty, field))
    }

    /// Returns true if the type is registered.
    #[must_use]
    pub fn contains(&self, ty: TypeTag) -> bool {
        self.types.contains_key(&ty)
    }

    /// Checks every explicit inverse across all registered types.
    ///
    /// An explicit inverse must name a field on the target type that points
    /// back at the owner type and pairs back with the declaring field, and
    /// two fields of one type may not claim the same explicit inverse.
    ///
    /// # Errors
    ///
    /// Returns the first conflict found.
    pub fn validate(&self) -> Result<()> {
        self.check(false)
    }

    /// Like [`Schema::validate`], but skips declarations whose target type
    /// is not registered yet.
    pub(crate) fn validate_registered(&self) -> Result<()> {
        self.check(true)
    }

    fn check(&self, skip_unregistered: bool) -> Result<()> {
        let mut claimed: HashMap<(TypeTag, FieldName), FieldName> = HashMap::new();
        let mut types: Vec<_> = self.types.values().collect();
        types.sort_by_key(|s| s.ty);
        let resolver = InverseResolver::new(self);

        for owner in types {
            for rel in &owner.relationships {
                let InverseSpec::Named(inverse) = rel.inverse else {
                    continue;
                };
                if skip_unregistered && !self.contains(rel.target) {
                    continue;
                }
                if let Some(previous) = claimed.insert((rel.target, inverse), rel.name) {
                    return Err(Error::schema_conflict(format!(
                        "{:?}.{:?} is claimed as inverse by both {:?} and {:?}",
                        rel.target, inverse, previous, rel.name
                    )));
                }
                resolver.resolve(owner.ty, rel.name)?;
            }
        }
        Ok(())
    }
}
