//! Tandem - Bidirectional relationship consistency for in-memory entity graphs
//!
//! This crate re-exports all layers of the Tandem system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: tandem_storage    - Schema, inverse resolution, records, graph, accessors
//! Layer 0: tandem_foundation - Core types (EntityId, TypeTag, FieldName, Error)
//! ```

pub use tandem_foundation as foundation;
pub use tandem_storage as storage;
