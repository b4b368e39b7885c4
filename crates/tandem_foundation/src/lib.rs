//! Core identifiers, interning, and error types for Tandem.
//!
//! This crate provides:
//! - [`EntityId`] - Generational entity identifiers
//! - [`TypeTag`] and [`FieldName`] - Interned entity type and field names
//! - [`RelationshipKind`] - Cardinality of a relationship field
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod intern;
pub mod kind;

pub use entity::EntityId;
pub use error::{Error, ErrorContext, ErrorKind};
pub use intern::{FieldName, Interner, TypeTag};
pub use kind::RelationshipKind;

/// Result type alias for Tandem operations.
pub type Result<T> = std::result::Result<T, Error>;
