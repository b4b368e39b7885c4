//! Inverse field resolution.
//!
//! Given an owning type and one of its relationship fields, finds the field
//! on the related type that exposes the same edge from the other side.

use tandem_foundation::{Error, FieldName, RelationshipKind, Result, TypeTag};

use crate::schema::{InverseSpec, RelationshipSchema, Schema};

/// Last-resort source of inverse field names.
///
/// Consulted only when a field does not name its inverse and the target
/// type declares no field pointing back at the owner. Answers must be
/// deterministic for a given schema.
pub trait InverseLookup {
    /// Returns the inverse of `ty.field`, if the collaborator knows one.
    fn inverse_field_for(&self, ty: TypeTag, field: FieldName) -> Option<FieldName>;
}

/// Lookup that never knows an inverse.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLookup;

impl InverseLookup for NoLookup {
    fn inverse_field_for(&self, _ty: TypeTag, _field: FieldName) -> Option<FieldName> {
        None
    }
}

impl<F> InverseLookup for F
where
    F: Fn(TypeTag, FieldName) -> Option<FieldName>,
{
    fn inverse_field_for(&self, ty: TypeTag, field: FieldName) -> Option<FieldName> {
        self(ty, field)
    }
}

/// A resolved inverse field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Inverse {
    /// Field name on the related type.
    pub field: FieldName,
    /// Cardinality of that field.
    pub kind: RelationshipKind,
}

/// Resolves inverse fields against a schema.
pub struct InverseResolver<'a> {
    schema: &'a Schema,
    lookup: &'a dyn InverseLookup,
}

impl<'a> InverseResolver<'a> {
    /// Creates a resolver with no fallback lookup.
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            lookup: &NoLookup,
        }
    }

    /// Sets the fallback lookup.
    #[must_use]
    pub fn with_lookup(mut self, lookup: &'a dyn InverseLookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Resolves the inverse of `owner.field`.
    ///
    /// Returns `Ok(None)` when the relationship is one-sided: declared
    /// without inverse, ambiguous, absent, or a many-to-many pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner type or field is unknown, or if an
    /// explicit inverse does not exist, does not point back at the owner
    /// type, or does not pair back with the field.
    pub fn resolve(&self, owner: TypeTag, field: FieldName) -> Result<Option<Inverse>> {
        let rel = self.schema.relationship(owner, field)?;
        match rel.inverse {
            InverseSpec::None => Ok(None),
            InverseSpec::Named(name) => self.explicit(owner, rel, name).map(Some),
            InverseSpec::Infer => self.infer(owner, rel),
        }
    }

    fn explicit(
        &self,
        owner: TypeTag,
        rel: &RelationshipSchema,
        name: FieldName,
    ) -> Result<Inverse> {
        let inverse = self.named(owner, rel, name)?;
        let back = self.schema.relationship(rel.target, name)?;
        if !self.agrees(rel, back)? {
            return Err(Error::schema_conflict(format!(
                "{:?}.{:?} names {:?} as inverse, but {:?}.{:?} does not pair back",
                owner, rel.name, name, rel.target, name
            )));
        }
        Ok(inverse)
    }

    /// Checks that `name` exists on the target type and points back at
    /// `owner`. Reciprocity is not checked.
    fn named(&self, owner: TypeTag, rel: &RelationshipSchema, name: FieldName) -> Result<Inverse> {
        let back = self.schema.relationship(rel.target, name)?;
        if back.target != owner {
            return Err(Error::schema_conflict(format!(
                "inverse {:?} of {:?}.{:?} targets {:?}",
                name, owner, rel.name, back.target
            )));
        }
        if rel.kind.is_collection() && back.kind.is_collection() {
            return Err(Error::schema_conflict(format!(
                "{:?}.{:?} and its inverse {:?} are both has-many",
                owner, rel.name, name
            )));
        }
        Ok(Inverse {
            field: name,
            kind: back.kind,
        })
    }

    fn infer(&self, owner: TypeTag, rel: &RelationshipSchema) -> Result<Option<Inverse>> {
        let back = match self.pick(owner, rel)? {
            Pick::Nothing => {
                // The collaborator's answer is taken as given.
                let Some(name) = self.lookup.inverse_field_for(owner, rel.name) else {
                    return Ok(None);
                };
                return self.named(owner, rel, name).map(Some);
            }
            Pick::Ambiguous(count) => {
                tracing::warn!(
                    ?owner,
                    field = ?rel.name,
                    candidates = count,
                    "ambiguous inverse, relationship is one-sided"
                );
                return Ok(None);
            }
            Pick::Unique(back) => back,
        };

        if !self.agrees(rel, back)? {
            tracing::warn!(
                ?owner,
                field = ?rel.name,
                inverse = ?back.name,
                "inverse does not resolve back, relationship is one-sided"
            );
            return Ok(None);
        }
        if rel.kind.is_collection() && back.kind.is_collection() {
            tracing::debug!(?owner, field = ?rel.name, "has-many pair treated as one-sided");
            return Ok(None);
        }
        Ok(Some(Inverse {
            field: back.name,
            kind: back.kind,
        }))
    }

    /// Chooses the field on the target type that would pair with
    /// `owner.rel`, without checking that it pairs back.
    ///
    /// A field that names `rel` as its inverse wins outright. Otherwise only
    /// fields left to inference are candidates.
    fn pick(&self, owner: TypeTag, rel: &RelationshipSchema) -> Result<Pick<'a>> {
        let target = self
            .schema
            .entity(rel.target)
            .ok_or_else(|| Error::unknown_type(rel.target))?;

        let claimants: Vec<_> = target
            .relationships_targeting(owner)
            .filter(|c| c.inverse == InverseSpec::Named(rel.name))
            .collect();
        match claimants.as_slice() {
            [] => {}
            [only] => return Ok(Pick::Unique(*only)),
            _ => return Ok(Pick::Ambiguous(claimants.len())),
        }

        let found: Vec<_> = target
            .relationships_targeting(owner)
            .filter(|c| c.inverse == InverseSpec::Infer)
            .collect();
        Ok(match found.as_slice() {
            [] => Pick::Nothing,
            [only] => Pick::Unique(*only),
            _ if owner == rel.target => self_referential(&found, rel),
            _ => Pick::Ambiguous(found.len()),
        })
    }

    /// Checks that `back` would itself resolve to `rel`.
    fn agrees(&self, rel: &RelationshipSchema, back: &RelationshipSchema) -> Result<bool> {
        match back.inverse {
            InverseSpec::Named(name) => Ok(name == rel.name),
            InverseSpec::None => Ok(false),
            InverseSpec::Infer => Ok(matches!(
                self.pick(rel.target, back)?,
                Pick::Unique(only) if only.name == rel.name
            )),
        }
    }
}

/// Outcome of scanning the target type for an inverse.
enum Pick<'s> {
    Nothing,
    Unique(&'s RelationshipSchema),
    Ambiguous(usize),
}

/// Several same-type candidates, `rel` itself among them.
///
/// `rel` steps aside only for a single field of the other cardinality, the
/// `parent`/`children` shape. Two fields of one kind stay ambiguous.
fn self_referential<'s>(found: &[&'s RelationshipSchema], rel: &RelationshipSchema) -> Pick<'s> {
    let others: Vec<&'s RelationshipSchema> =
        found.iter().copied().filter(|c| c.name != rel.name).collect();
    match others.as_slice() {
        [only] if only.kind != rel.kind && others.len() < found.len() => Pick::Unique(*only),
        _ => Pick::Ambiguous(found.len()),
    }
}
