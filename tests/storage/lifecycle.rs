//! Integration tests for entity lifecycle and graph snapshots
//!
//! Tests despawn, stale ids, record reclamation, and cloning.

use tandem_foundation::ErrorKind;
use tandem_storage::{EntitySchema, Graph, GraphConfig, RelationshipSchema};

use crate::fixtures::blog;

// =============================================================================
// Despawn
// =============================================================================

#[test]
fn despawn_child_leaves_collection() {
    let mut b = blog();
    let post = b.graph.spawn(b.post).unwrap();
    let c1 = b.graph.spawn(b.comment).unwrap();
    let c2 = b.graph.spawn(b.comment).unwrap();
    b.graph.has_many(post, b.comments).unwrap().add(c1).unwrap();
    b.graph.has_many(post, b.comments).unwrap().add(c2).unwrap();

    b.graph.despawn(c1).unwrap();

    assert_eq!(b.graph.has_many(post, b.comments).unwrap().get(), vec![c2]);
    assert_eq!(b.graph.sink().count_for(post, b.comments), 3);
    b.graph.verify().unwrap();
}

#[test]
fn despawn_owner_orphans_children_without_deleting_them() {
    let mut b = blog();
    let post = b.graph.spawn(b.post).unwrap();
    let cs: Vec<_> = (0..3).map(|_| b.graph.spawn(b.comment).unwrap()).collect();
    for c in &cs {
        b.graph.has_many(post, b.comments).unwrap().add(*c).unwrap();
    }

    b.graph.despawn(post).unwrap();

    for c in &cs {
        assert!(b.graph.exists(*c));
        assert_eq!(b.graph.belongs_to(*c, b.parent).unwrap().get(), None);
    }
    assert_eq!(b.graph.record_count(), 0);
    assert_eq!(b.graph.entity_count(), 3);
    b.graph.verify().unwrap();
}

#[test]
fn despawned_id_is_stale_after_reuse() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    b.graph.despawn(u).unwrap();
    let reused = b.graph.spawn(b.user).unwrap();

    assert_eq!(reused.slot, u.slot);
    let err = b.graph.belongs_to(u, b.profile_field).err().unwrap();
    assert!(matches!(err.kind, ErrorKind::StaleEntity(_)));
    assert!(b.graph.despawn(u).is_err());
}

#[test]
fn spawn_of_unregistered_type_fails() {
    let mut graph = Graph::new();
    let ghost = graph.interner_mut().intern_type("ghost");

    let err = graph.spawn(ghost).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownType(_)));

    graph.register_type(EntitySchema::new(ghost)).unwrap();
    assert!(graph.spawn(ghost).is_ok());
    assert!(graph.register_type(EntitySchema::new(ghost)).is_err());
}

// =============================================================================
// Records
// =============================================================================

#[test]
fn records_are_reclaimed_after_churn() {
    let mut b = blog();
    let users: Vec<_> = (0..4).map(|_| b.graph.spawn(b.user).unwrap()).collect();
    let profiles: Vec<_> = (0..4).map(|_| b.graph.spawn(b.profile).unwrap()).collect();

    for round in 0..4 {
        for (i, u) in users.iter().enumerate() {
            let p = profiles[(i + round) % profiles.len()];
            b.graph.belongs_to(*u, b.profile_field).unwrap().set(Some(p)).unwrap();
        }
        b.graph.verify().unwrap();
    }

    assert!(b.graph.record_count() <= users.len());
    for u in &users {
        b.graph.belongs_to(*u, b.profile_field).unwrap().clear().unwrap();
    }
    assert_eq!(b.graph.record_count(), 0);
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn clones_are_independent() {
    let mut b = blog();
    let post = b.graph.spawn(b.post).unwrap();
    let c = b.graph.spawn(b.comment).unwrap();
    b.graph.has_many(post, b.comments).unwrap().add(c).unwrap();

    let mut snapshot = b.graph.clone();
    b.graph.has_many(post, b.comments).unwrap().clear().unwrap();

    assert_eq!(snapshot.has_many(post, b.comments).unwrap().get(), vec![c]);
    assert!(b.graph.has_many(post, b.comments).unwrap().is_empty());
    snapshot.verify().unwrap();
}

#[test]
fn lean_config_skips_record_checks_but_stays_consistent() {
    let mut graph = Graph::with_config(GraphConfig::lean().with_cache_inverses(false));
    let person = graph.interner_mut().intern_type("person");
    let spouse = graph.interner_mut().intern_field("spouse");
    graph
        .register_type(
            EntitySchema::new(person)
                .with_relationship(RelationshipSchema::belongs_to(spouse, person)),
        )
        .unwrap();
    let a = graph.spawn(person).unwrap();
    let b = graph.spawn(person).unwrap();

    graph.belongs_to(a, spouse).unwrap().set(Some(b)).unwrap();

    assert!(!graph.config().verify_records);
    assert_eq!(graph.sink().capacity(), 256);
    assert_eq!(graph.belongs_to(b, spouse).unwrap().get(), Some(a));
    graph.verify().unwrap();
}
