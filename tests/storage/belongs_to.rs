//! Integration tests for belongs-to fields
//!
//! Tests reciprocity, reassignment, clearing, and record sharing.

use tandem_foundation::ErrorKind;

use crate::fixtures::blog;

// =============================================================================
// Reciprocity
// =============================================================================

#[test]
fn one_to_one_is_visible_from_both_sides() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    let p = b.graph.spawn(b.profile).unwrap();

    let written = b
        .graph
        .belongs_to(u, b.profile_field)
        .unwrap()
        .set(Some(p))
        .unwrap();

    assert_eq!(written, Some(p));
    assert_eq!(b.graph.belongs_to(u, b.profile_field).unwrap().get(), Some(p));
    assert_eq!(b.graph.belongs_to(p, b.owner).unwrap().get(), Some(u));
    b.graph.verify().unwrap();
}

#[test]
fn belongs_to_appends_to_inverse_collection() {
    let mut b = blog();
    let post = b.graph.spawn(b.post).unwrap();
    let c1 = b.graph.spawn(b.comment).unwrap();
    let c2 = b.graph.spawn(b.comment).unwrap();

    b.graph.belongs_to(c1, b.parent).unwrap().set(Some(post)).unwrap();
    b.graph.belongs_to(c2, b.parent).unwrap().set(Some(post)).unwrap();

    assert_eq!(b.graph.has_many(post, b.comments).unwrap().get(), vec![c1, c2]);
    b.graph.verify().unwrap();
}

#[test]
fn both_sides_share_one_record() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    let p = b.graph.spawn(b.profile).unwrap();

    b.graph.belongs_to(p, b.owner).unwrap().set(Some(u)).unwrap();

    let rid = b.graph.record_id(u, b.profile_field).unwrap();
    assert_eq!(b.graph.record_id(p, b.owner), Some(rid));
    assert_eq!(b.graph.record_count(), 1);
}

#[test]
fn children_of_one_post_share_its_record() {
    let mut b = blog();
    let post = b.graph.spawn(b.post).unwrap();
    let cs: Vec<_> = (0..4).map(|_| b.graph.spawn(b.comment).unwrap()).collect();
    for c in &cs {
        b.graph.belongs_to(*c, b.parent).unwrap().set(Some(post)).unwrap();
    }

    let rid = b.graph.record_id(post, b.comments).unwrap();
    for c in &cs {
        assert_eq!(b.graph.record_id(*c, b.parent), Some(rid));
    }
    assert_eq!(b.graph.record_count(), 1);
}

// =============================================================================
// Reassignment
// =============================================================================

#[test]
fn reassign_detaches_from_previous() {
    let mut b = blog();
    let p1 = b.graph.spawn(b.post).unwrap();
    let p2 = b.graph.spawn(b.post).unwrap();
    let c = b.graph.spawn(b.comment).unwrap();

    b.graph.belongs_to(c, b.parent).unwrap().set(Some(p1)).unwrap();
    b.graph.belongs_to(c, b.parent).unwrap().set(Some(p2)).unwrap();

    assert!(b.graph.has_many(p1, b.comments).unwrap().is_empty());
    assert_eq!(b.graph.has_many(p2, b.comments).unwrap().get(), vec![c]);
    assert_eq!(b.graph.belongs_to(c, b.parent).unwrap().get(), Some(p2));
    assert_eq!(b.graph.record_id(p1, b.comments), None);
    assert_eq!(b.graph.record_count(), 1);
    b.graph.verify().unwrap();
}

#[test]
fn reassign_one_to_one_releases_old_partner() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    let p1 = b.graph.spawn(b.profile).unwrap();
    let p2 = b.graph.spawn(b.profile).unwrap();

    b.graph.belongs_to(u, b.profile_field).unwrap().set(Some(p1)).unwrap();
    b.graph.belongs_to(u, b.profile_field).unwrap().set(Some(p2)).unwrap();

    assert_eq!(b.graph.belongs_to(p1, b.owner).unwrap().get(), None);
    assert_eq!(b.graph.belongs_to(p2, b.owner).unwrap().get(), Some(u));
    assert_eq!(b.graph.record_count(), 1);
    b.graph.verify().unwrap();
}

#[test]
fn stealing_a_partner_leaves_no_duplicate_edge() {
    let mut b = blog();
    let alice = b.graph.spawn(b.user).unwrap();
    let bob = b.graph.spawn(b.user).unwrap();
    let p = b.graph.spawn(b.profile).unwrap();

    b.graph.belongs_to(alice, b.profile_field).unwrap().set(Some(p)).unwrap();
    b.graph.belongs_to(bob, b.profile_field).unwrap().set(Some(p)).unwrap();

    assert_eq!(b.graph.belongs_to(alice, b.profile_field).unwrap().get(), None);
    assert_eq!(b.graph.belongs_to(bob, b.profile_field).unwrap().get(), Some(p));
    assert_eq!(b.graph.belongs_to(p, b.owner).unwrap().get(), Some(bob));
    assert_eq!(b.graph.record_count(), 1);
    b.graph.verify().unwrap();
}

// =============================================================================
// Clearing
// =============================================================================

#[test]
fn null_clears_both_sides() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    let p = b.graph.spawn(b.profile).unwrap();
    b.graph.belongs_to(u, b.profile_field).unwrap().set(Some(p)).unwrap();

    let written = b.graph.belongs_to(u, b.profile_field).unwrap().set(None).unwrap();

    assert_eq!(written, None);
    assert_eq!(b.graph.belongs_to(u, b.profile_field).unwrap().get(), None);
    assert_eq!(b.graph.belongs_to(p, b.owner).unwrap().get(), None);
    assert_eq!(b.graph.record_count(), 0);
    b.graph.verify().unwrap();
}

#[test]
fn clearing_one_child_keeps_siblings() {
    let mut b = blog();
    let post = b.graph.spawn(b.post).unwrap();
    let c1 = b.graph.spawn(b.comment).unwrap();
    let c2 = b.graph.spawn(b.comment).unwrap();
    b.graph.belongs_to(c1, b.parent).unwrap().set(Some(post)).unwrap();
    b.graph.belongs_to(c2, b.parent).unwrap().set(Some(post)).unwrap();

    b.graph.belongs_to(c1, b.parent).unwrap().clear().unwrap();

    assert_eq!(b.graph.has_many(post, b.comments).unwrap().get(), vec![c2]);
    assert_eq!(b.graph.belongs_to(c2, b.parent).unwrap().get(), Some(post));
    b.graph.verify().unwrap();
}

#[test]
fn clearing_an_empty_field_is_harmless() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();

    b.graph.belongs_to(u, b.profile_field).unwrap().clear().unwrap();

    assert_eq!(b.graph.sink().total(), 0);
    assert_eq!(b.graph.record_count(), 0);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn wrong_type_is_rejected_without_side_effects() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    let p = b.graph.spawn(b.profile).unwrap();
    let post = b.graph.spawn(b.post).unwrap();
    b.graph.belongs_to(u, b.profile_field).unwrap().set(Some(p)).unwrap();

    let err = b
        .graph
        .belongs_to(u, b.profile_field)
        .unwrap()
        .set(Some(post))
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert_eq!(b.graph.belongs_to(u, b.profile_field).unwrap().get(), Some(p));
    b.graph.verify().unwrap();
}

#[test]
fn accessor_on_has_many_field_is_rejected() {
    let mut b = blog();
    let post = b.graph.spawn(b.post).unwrap();

    let err = b.graph.belongs_to(post, b.comments).err().unwrap();
    assert!(matches!(err.kind, ErrorKind::KindMismatch { .. }));
}
