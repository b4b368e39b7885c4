//! Shared schemas for the storage tests.

use tandem_foundation::{FieldName, TypeTag};
use tandem_storage::{EntitySchema, Graph, GraphConfig, RelationshipSchema};

/// Posts with comments, users with one profile each.
pub struct Blog {
    pub graph: Graph,
    pub post: TypeTag,
    pub comment: TypeTag,
    pub user: TypeTag,
    pub profile: TypeTag,
    /// `post.comments`, has-many comment.
    pub comments: FieldName,
    /// `comment.post`, belongs-to post.
    pub parent: FieldName,
    /// `user.profile`, belongs-to profile.
    pub profile_field: FieldName,
    /// `profile.user`, belongs-to user.
    pub owner: FieldName,
}

pub fn blog() -> Blog {
    let mut graph = Graph::with_config(GraphConfig::strict());
    let interner = graph.interner_mut();
    let post = interner.intern_type("post");
    let comment = interner.intern_type("comment");
    let user = interner.intern_type("user");
    let profile = interner.intern_type("profile");
    let comments = interner.intern_field("comments");
    let parent = interner.intern_field("post");
    let profile_field = interner.intern_field("profile");
    let owner = interner.intern_field("user");

    graph
        .register_type(
            EntitySchema::new(post)
                .with_relationship(RelationshipSchema::has_many(comments, comment)),
        )
        .unwrap();
    graph
        .register_type(
            EntitySchema::new(comment)
                .with_relationship(RelationshipSchema::belongs_to(parent, post)),
        )
        .unwrap();
    graph
        .register_type(
            EntitySchema::new(user)
                .with_relationship(RelationshipSchema::belongs_to(profile_field, profile)),
        )
        .unwrap();
    graph
        .register_type(
            EntitySchema::new(profile)
                .with_relationship(RelationshipSchema::belongs_to(owner, user)),
        )
        .unwrap();

    Blog {
        graph,
        post,
        comment,
        user,
        profile,
        comments,
        parent,
        profile_field,
        owner,
    }
}
