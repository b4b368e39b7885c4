//! Relationship cardinality.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cardinality of a relationship field, fixed when the field is declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RelationshipKind {
    /// The field holds at most one related entity (belongs-to).
    OneToOne,
    /// The field holds an ordered collection of related entities (has-many).
    OneToMany,
}

impl RelationshipKind {
    /// Returns true if the field exposes a collection.
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::OneToMany)
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneToOne => write!(f, "belongs-to"),
            Self::OneToMany => write!(f, "has-many"),
        }
    }
}
