//! Interning for entity type names and relationship field names.
//!
//! Type and field names appear in every relationship lookup, so they are
//! interned once and compared as integers afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Interned name of an entity type (e.g. `post`, `comment`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeTag(pub(crate) u32);

impl TypeTag {
    /// Returns the raw index of this type tag.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

/// Interned name of a relationship field (e.g. `comments`, `author`).
///
/// Field names are interned independently of types: `post` can be both a
/// type and a field on `comment`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldName(pub(crate) u32);

impl FieldName {
    /// Returns the raw index of this field name.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldName({})", self.0)
    }
}

/// A single interning table: strings to dense indices and back.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct Table {
    names: Vec<Arc<str>>,
    index: HashMap<Arc<str>, u32>,
}

impl Table {
    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = u32::try_from(self.names.len()).expect("too many interned names");
        let arc: Arc<str> = s.into();
        self.names.push(arc.clone());
        self.index.insert(arc, idx);
        idx
    }

    fn lookup(&self, s: &str) -> Option<u32> {
        self.index.get(s).copied()
    }

    fn name(&self, idx: u32) -> Option<&str> {
        self.names.get(idx as usize).map(AsRef::as_ref)
    }
}

/// Interner for type tags and field names.
///
/// Not thread-safe; a graph owns exactly one interner.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interner {
    types: Table,
    fields: Table,
}

impl Interner {
    /// Creates an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns an entity type name.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` type names are interned.
    pub fn intern_type(&mut self, name: &str) -> TypeTag {
        TypeTag(self.types.intern(name))
    }

    /// Interns a relationship field name.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` field names are interned.
    pub fn intern_field(&mut self, name: &str) -> FieldName {
        FieldName(self.fields.intern(name))
    }

    /// Looks up a type tag without interning.
    #[must_use]
    pub fn lookup_type(&self, name: &str) -> Option<TypeTag> {
        self.types.lookup(name).map(TypeTag)
    }

    /// Looks up a field name without interning.
    #[must_use]
    pub fn lookup_field(&self, name: &str) -> Option<FieldName> {
        self.fields.lookup(name).map(FieldName)
    }

    /// Returns the string for a type tag.
    #[must_use]
    pub fn type_name(&self, tag: TypeTag) -> Option<&str> {
        self.types.name(tag.0)
    }

    /// Returns the string for a field name.
    #[must_use]
    pub fn field_name(&self, field: FieldName) -> Option<&str> {
        self.fields.name(field.0)
    }

    /// Returns the number of interned type names.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.names.len()
    }

    /// Returns the number of interned field names.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.names.len()
    }
}
