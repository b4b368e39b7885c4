//! Relationship records, inverse resolution, and the entity graph for Tandem.
//!
//! This crate provides:
//! - [`Schema`] - Per-type relationship declarations
//! - [`InverseResolver`] - Finds the inverse field of a relationship
//! - [`RelationshipRecord`] / [`RecordStore`] - Shared, reference counted edges
//! - [`RelationshipRegistry`] - Per-entity field to record map
//! - [`Graph`] - Entities plus the [`BelongsTo`] and [`HasMany`] accessors
//!
//! ```
//! use tandem_storage::{EntitySchema, Graph, RelationshipSchema};
//!
//! let mut graph = Graph::new();
//! let post = graph.interner_mut().intern_type("post");
//! let comment = graph.interner_mut().intern_type("comment");
//! let comments = graph.interner_mut().intern_field("comments");
//! let parent = graph.interner_mut().intern_field("post");
//!
//! graph
//!     .register_type(
//!         EntitySchema::new(post)
//!             .with_relationship(RelationshipSchema::has_many(comments, comment)),
//!     )
//!     .unwrap();
//! graph
//!     .register_type(
//!         EntitySchema::new(comment)
//!             .with_relationship(RelationshipSchema::belongs_to(parent, post)),
//!     )
//!     .unwrap();
//!
//! let p = graph.spawn(post).unwrap();
//! let c = graph.spawn(comment).unwrap();
//! graph.belongs_to(c, parent).unwrap().set(Some(p)).unwrap();
//!
//! assert_eq!(graph.has_many(p, comments).unwrap().get(), vec![c]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod belongs_to;
mod config;
mod entity;
mod graph;
mod has_many;
mod inverse;
mod notify;
mod record;
mod registry;
mod schema;

pub use belongs_to::BelongsTo;
pub use config::GraphConfig;
pub use entity::{Entity, EntityStore};
pub use graph::Graph;
pub use has_many::HasMany;
pub use inverse::{Inverse, InverseLookup, InverseResolver, NoLookup};
pub use notify::{ChangeLog, ChangeRecord, ChangeSink, Discard};
pub use record::{OtherSide, RecordId, RecordKind, RecordStore, RelationshipRecord};
pub use registry::RelationshipRegistry;
pub use schema::{EntitySchema, InverseSpec, RelationshipSchema, Schema};
