//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use tandem_foundation::{
    EntityId, Error, ErrorContext, ErrorKind, Interner, RelationshipKind,
};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_entity_not_found() {
    let id = EntityId::new(42, 1);
    let err = Error::entity_not_found(id);
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
    assert!(format!("{err}").contains("42"));
}

#[test]
fn error_stale_entity() {
    let id = EntityId::new(5, 2);
    let err = Error::stale_entity(id);
    assert!(matches!(err.kind, ErrorKind::StaleEntity(_)));
    assert!(format!("{err}").contains("5v2"));
}

#[test]
fn error_unknown_field_names_type_and_field() {
    let mut interner = Interner::new();
    let post = interner.intern_type("post");
    let title = interner.intern_field("title");

    let err = Error::unknown_field(post, title);
    assert!(matches!(err.kind, ErrorKind::UnknownField { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("TypeTag(0)"));
    assert!(msg.contains("FieldName(0)"));
}

#[test]
fn error_kind_mismatch_names_expected_kind() {
    let mut interner = Interner::new();
    let comments = interner.intern_field("comments");

    let err = Error::kind_mismatch(comments, RelationshipKind::OneToOne);
    assert_eq!(
        format!("{err}"),
        "field FieldName(0) is not a belongs-to field"
    );
}

#[test]
fn error_schema_conflict_keeps_message() {
    let err = Error::schema_conflict("two fields claim the same inverse");
    assert!(matches!(err.kind, ErrorKind::SchemaConflict(_)));
    assert!(format!("{err}").contains("two fields claim"));
    assert!(!err.is_internal());
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn error_with_context() {
    let mut interner = Interner::new();
    let author = interner.intern_field("author");

    let err = Error::invariant("slot holds two members").with_context(
        ErrorContext::new()
            .with_operation("belongs_to.set")
            .with_entity(EntityId::new(4, 1))
            .with_field(author),
    );

    let context = err.context.as_ref().unwrap();
    assert_eq!(context.operation.as_deref(), Some("belongs_to.set"));
    assert_eq!(context.entity, Some(EntityId::new(4, 1)));
    assert_eq!(
        context.to_string(),
        "in belongs_to.set on EntityId(4v1).FieldName(0)"
    );
}

#[test]
fn error_is_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&Error::invariant("x"));
}
