//! Shared fixtures: users with posts and roles, posts with comments

#![allow(dead_code)]

use std::sync::{Arc, Once};

use elif_factory::prelude::*;
use elif_factory::template;
use serde_json::Value;

pub const USER: &str = "App\\Models\\FactoryTestUser";
pub const POST: &str = "App\\Models\\FactoryTestPost";
pub const COMMENT: &str = "App\\Models\\FactoryTestComment";
pub const ROLE: &str = "App\\Models\\FactoryTestRole";

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct FactoryTestUserFactory;

impl Definition for FactoryTestUserFactory {
    fn factory_name(&self) -> &str {
        "Database\\Factories\\FactoryTestUserFactory"
    }

    fn definition(&self, faker: &Faker, _context: &FactoryContext) -> Template {
        template! {
            "name" => faker.name(),
            "options" => Value::Null,
        }
    }
}

pub struct FactoryTestPostFactory;

impl Definition for FactoryTestPostFactory {
    fn factory_name(&self) -> &str {
        "Database\\Factories\\FactoryTestPostFactory"
    }

    fn definition(&self, faker: &Faker, context: &FactoryContext) -> Template {
        template! {
            "user_id" => context.factory(FactoryTestUserFactory),
            "title" => faker.name(),
        }
    }
}

pub struct FactoryTestCommentFactory;

impl Definition for FactoryTestCommentFactory {
    fn factory_name(&self) -> &str {
        "Database\\Factories\\FactoryTestCommentFactory"
    }

    fn definition(&self, faker: &Faker, context: &FactoryContext) -> Template {
        template! {
            "commentable_id" => context.factory(FactoryTestPostFactory),
            "commentable_type" => POST,
            "body" => faker.name(),
        }
    }
}

pub struct FactoryTestRoleFactory;

impl Definition for FactoryTestRoleFactory {
    fn factory_name(&self) -> &str {
        "Database\\Factories\\FactoryTestRoleFactory"
    }

    fn definition(&self, faker: &Faker, _context: &FactoryContext) -> Template {
        template! { "name" => faker.name() }
    }
}

fn role_user() -> PivotConfig {
    PivotConfig::new("role_user", "user_id", "role_id").with_additional_columns(["admin"])
}

/// Store and context with the four fixture models and their factories
pub fn setup() -> (Arc<MemoryStore>, FactoryContext) {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let context = FactoryContext::new(store.clone());

    let schemas = vec![
        ModelSchema::new(USER, "users")
            .relationship(RelationshipMetadata::has_many("posts", POST, "user_id"))
            .relationship(RelationshipMetadata::belongs_to_many("roles", ROLE, role_user()))
            .relationship(RelationshipMetadata::belongs_to_many("factoryTestRoles", ROLE, role_user())),
        ModelSchema::new(POST, "posts")
            .relationship(RelationshipMetadata::belongs_to("user", USER, "user_id"))
            .relationship(RelationshipMetadata::belongs_to("factoryTestUser", USER, "user_id"))
            .relationship(RelationshipMetadata::belongs_to("author", USER, "user_id"))
            .relationship(RelationshipMetadata::morph_many("comments", COMMENT, "commentable")),
        ModelSchema::new(COMMENT, "comments").relationship(RelationshipMetadata::morph_to("commentable")),
        ModelSchema::new(ROLE, "roles").relationship(RelationshipMetadata::belongs_to_many(
            "users",
            USER,
            PivotConfig::new("role_user", "role_id", "user_id").with_additional_columns(["admin"]),
        )),
    ];
    for schema in schemas {
        context.register_model(schema).expect("fixture schema is valid");
    }

    context.register_factory(FactoryTestUserFactory);
    context.register_factory(FactoryTestPostFactory);
    context.register_factory(FactoryTestCommentFactory);
    context.register_factory(FactoryTestRoleFactory);

    (store, context)
}

/// Pivot rows of `role_user` belonging to one user
pub fn roles_of(store: &MemoryStore, user: &Entity) -> Vec<Attributes> {
    store
        .pivots("role_user")
        .into_iter()
        .filter(|pivot| pivot.get("user_id") == user.key())
        .collect()
}
