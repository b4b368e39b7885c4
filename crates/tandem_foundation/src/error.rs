//! Error types for the Tandem system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;
use crate::intern::{FieldName, TypeTag};
use crate::kind::RelationshipKind;

/// The main error type for Tandem operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a type mismatch error for an assignment to `field`.
    #[must_use]
    pub fn type_mismatch(field: FieldName, expected: TypeTag, actual: TypeTag) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            field,
            expected,
            actual,
        })
    }

    /// Creates an invariant violation error.
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvariantViolation(message.into()))
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates a stale entity reference error.
    #[must_use]
    pub fn stale_entity(id: EntityId) -> Self {
        Self::new(ErrorKind::StaleEntity(id))
    }

    /// Creates an unknown type error.
    #[must_use]
    pub fn unknown_type(ty: TypeTag) -> Self {
        Self::new(ErrorKind::UnknownType(ty))
    }

    /// Creates an unknown field error.
    #[must_use]
    pub fn unknown_field(ty: TypeTag, field: FieldName) -> Self {
        Self::new(ErrorKind::UnknownField { ty, field })
    }

    /// Creates a kind mismatch error.
    #[must_use]
    pub fn kind_mismatch(field: FieldName, expected: RelationshipKind) -> Self {
        Self::new(ErrorKind::KindMismatch { field, expected })
    }

    /// Creates a schema conflict error.
    #[must_use]
    pub fn schema_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaConflict(message.into()))
    }

    /// Creates a capacity exceeded error.
    #[must_use]
    pub fn capacity_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CapacityExceeded(message.into()))
    }

    /// Returns true if this error signals a bug in the engine rather than
    /// caller misuse.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, ErrorKind::InvariantViolation(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// An entity of the wrong type was assigned to a relationship field.
    #[error("type mismatch on {field:?}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        /// The field being assigned.
        field: FieldName,
        /// The field's declared target type.
        expected: TypeTag,
        /// The type of the assigned entity.
        actual: TypeTag,
    },

    /// Internal relationship state is inconsistent.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Entity does not exist.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// Entity reference is stale (slot was reused).
    #[error("stale entity reference: {0:?}")]
    StaleEntity(EntityId),

    /// Entity type was never registered.
    #[error("unknown entity type: {0:?}")]
    UnknownType(TypeTag),

    /// Type has no relationship field of that name.
    #[error("unknown field {field:?} on type {ty:?}")]
    UnknownField {
        /// The entity type.
        ty: TypeTag,
        /// The field that was not declared.
        field: FieldName,
    },

    /// A one-to-one accessor was used on a has-many field or vice versa.
    #[error("field {field:?} is not a {expected} field")]
    KindMismatch {
        /// The field that was accessed.
        field: FieldName,
        /// The kind the accessor requires.
        expected: RelationshipKind,
    },

    /// Relationship declarations contradict each other.
    #[error("schema conflict: {0}")]
    SchemaConflict(String),

    /// An allocator has run out of ids.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed (e.g. `belongs_to.set`).
    pub operation: Option<String>,
    /// Entity the operation was invoked on.
    pub entity: Option<EntityId>,
    /// Field the operation was invoked on.
    pub field: Option<FieldName>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the entity.
    #[must_use]
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Sets the field.
    #[must_use]
    pub fn with_field(mut self, field: FieldName) -> Self {
        self.field = Some(field);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = &self.operation {
            write!(f, "in {op}")?;
        }
        if let Some(entity) = self.entity {
            write!(f, " on {entity:?}")?;
        }
        if let Some(field) = self.field {
            write!(f, ".{field:?}")?;
        }
        Ok(())
    }
}
