//! Integration tests for change notification
//!
//! Tests which `(entity, field)` pairs are reported for each mutation.

use tandem_foundation::{EntityId, FieldName};
use tandem_storage::{ChangeSink, EntitySchema, Graph, GraphConfig, RelationshipSchema};

use crate::fixtures::blog;

#[test]
fn set_notifies_both_sides() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    let p = b.graph.spawn(b.profile).unwrap();

    b.graph.belongs_to(u, b.profile_field).unwrap().set(Some(p)).unwrap();

    let log = b.graph.sink();
    assert_eq!(log.total(), 2);
    assert_eq!(log.count_for(u, b.profile_field), 1);
    assert_eq!(log.count_for(p, b.owner), 1);
}

#[test]
fn re_set_repeats_one_notification_cycle() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    let p = b.graph.spawn(b.profile).unwrap();

    b.graph.belongs_to(u, b.profile_field).unwrap().set(Some(p)).unwrap();
    let rid = b.graph.record_id(u, b.profile_field);
    b.graph.belongs_to(u, b.profile_field).unwrap().set(Some(p)).unwrap();

    let log = b.graph.sink();
    assert_eq!(log.total(), 4);
    assert_eq!(log.count_for(u, b.profile_field), 2);
    assert_eq!(log.count_for(p, b.owner), 2);

    assert_eq!(b.graph.belongs_to(p, b.owner).unwrap().get(), Some(u));
    assert_eq!(b.graph.record_count(), 1);
    assert!(rid.is_some());
    b.graph.verify().unwrap();
}

#[test]
fn reassign_notifies_old_and_new_counterparts() {
    let mut b = blog();
    let p1 = b.graph.spawn(b.post).unwrap();
    let p2 = b.graph.spawn(b.post).unwrap();
    let c = b.graph.spawn(b.comment).unwrap();
    b.graph.belongs_to(c, b.parent).unwrap().set(Some(p1)).unwrap();
    b.graph.sink_mut().clear();

    b.graph.belongs_to(c, b.parent).unwrap().set(Some(p2)).unwrap();

    let seen: Vec<_> = b.graph.sink().iter().map(|r| (r.entity, r.field)).collect();
    assert_eq!(
        seen,
        vec![(p1, b.comments), (c, b.parent), (p2, b.comments)]
    );
}

#[test]
fn clearing_notifies_self_and_former_counterpart() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    let p = b.graph.spawn(b.profile).unwrap();
    b.graph.belongs_to(u, b.profile_field).unwrap().set(Some(p)).unwrap();
    b.graph.sink_mut().clear();

    b.graph.belongs_to(u, b.profile_field).unwrap().clear().unwrap();

    let seen: Vec<_> = b.graph.sink().iter().map(|r| (r.entity, r.field)).collect();
    assert_eq!(seen, vec![(p, b.owner), (u, b.profile_field)]);
}

#[test]
fn failed_write_notifies_nothing() {
    let mut b = blog();
    let u = b.graph.spawn(b.user).unwrap();
    let c = b.graph.spawn(b.comment).unwrap();

    assert!(b.graph.belongs_to(u, b.profile_field).unwrap().set(Some(c)).is_err());
    assert!(b.graph.sink().is_empty());
}

#[derive(Default)]
struct Collect(Vec<(EntityId, FieldName)>);

impl ChangeSink for Collect {
    fn notify_changed(&mut self, entity: EntityId, field: FieldName) {
        self.0.push((entity, field));
    }
}

#[test]
fn custom_sink_receives_notifications() {
    let mut graph = Graph::with_sink(Collect::default(), GraphConfig::default());
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

    assert_eq!(graph.sink().0, vec![(a, spouse), (b, spouse)]);
}
