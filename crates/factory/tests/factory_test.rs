mod common;

use std::sync::Arc;

use common::*;
use elif_factory::prelude::*;
use elif_factory::{template, FactoryConfig, NamingStrategy};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[test]
fn test_create_basic_models() {
    let (store, ctx) = setup();
    let factory = ctx.factory(FactoryTestUserFactory);

    let user = factory.create_one().unwrap();
    assert!(user.exists());
    assert_eq!(user.model(), USER);

    let user = factory.create_with(template! { "name" => "Taylor Otwell" }).unwrap();
    assert_eq!(user[0].get_str("name"), Some("Taylor Otwell"));

    let users = factory
        .create_many(vec![
            template! { "name" => "Taylor Otwell" },
            template! { "name" => "Jeffrey Way" },
        ])
        .unwrap();
    assert_eq!(users.len(), 2);

    let users = factory.clone().times(10).create().unwrap();
    assert_eq!(users.len(), 10);
    assert_eq!(store.count(USER), 14);
}

#[test]
fn test_expands_producers_and_passes_resolved_attributes() {
    let (_, ctx) = setup();
    let user = ctx
        .factory(FactoryTestUserFactory)
        .create_with(template! {
            "name" => AttributeValue::lazy(|| Ok(json!("taylor"))),
            "options" => AttributeValue::derived(|attributes| {
                let name = attributes.get("name").and_then(Value::as_str).unwrap_or_default();
                Ok(json!(format!("{}-options", name)))
            }),
        })
        .unwrap();

    assert_eq!(user[0].get_str("options"), Some("taylor-options"));
}

#[test]
fn test_makes_unpersisted_entities() {
    let (store, ctx) = setup();
    let factory = ctx.factory(FactoryTestUserFactory);

    let user = factory.make_one().unwrap();
    assert!(!user.exists());

    let users = factory.make_with(template! { "name" => "Taylor Otwell" }).unwrap();
    assert_eq!(users[0].get_str("name"), Some("Taylor Otwell"));
    assert_eq!(store.count(USER), 0);
}

#[test]
fn test_raw_attributes() {
    let (_, ctx) = setup();

    let user = ctx.factory(FactoryTestUserFactory).raw_one().unwrap();
    assert_eq!(user.keys().collect::<Vec<_>>(), vec!["name", "options"]);

    let users = ctx
        .factory(FactoryTestUserFactory)
        .raw_with(template! { "name" => "Taylor Otwell" })
        .unwrap();
    assert_eq!(users[0].get("name"), Some(&json!("Taylor Otwell")));
}

#[test]
fn test_raw_expands_nested_factories() {
    let (store, ctx) = setup();

    let posts = ctx
        .factory(FactoryTestPostFactory)
        .raw_with(template! { "title" => "Test Title" })
        .unwrap();

    assert!(posts[0].get("user_id").map(Value::is_i64).unwrap_or(false));
    assert_eq!(posts[0].get("title"), Some(&json!("Test Title")));
    assert_eq!(store.count(USER), 1);
    assert_eq!(store.count(POST), 0);
}

#[test]
fn test_multiple_raw_models() {
    let (_, ctx) = setup();
    let posts = ctx.factory(FactoryTestPostFactory).times(10).raw().unwrap();
    assert_eq!(posts.len(), 10);
}

#[test]
fn test_lazy_entities() {
    let (store, ctx) = setup();

    let make_user = ctx.factory(FactoryTestUserFactory).lazy(Template::new());
    assert_eq!(store.count(USER), 0);
    assert!(make_user().unwrap().exists());

    let make_user = ctx
        .factory(FactoryTestUserFactory)
        .lazy(template! { "name" => "Taylor Otwell" });
    let user = make_user().unwrap();
    assert_eq!(user.get_str("name"), Some("Taylor Otwell"));
    assert_eq!(store.count(USER), 2);
}

#[test]
fn test_after_making_and_after_creating_callbacks() {
    let (_, ctx) = setup();
    let made = Arc::new(Mutex::new(None));
    let created = Arc::new(Mutex::new(None));

    let making = made.clone();
    let creating = created.clone();
    let user = ctx
        .factory(FactoryTestUserFactory)
        .after_making(move |user, _| {
            *making.lock() = Some(user.clone());
            Ok(())
        })
        .after_creating(move |user, _| {
            *creating.lock() = Some(user.clone());
            Ok(())
        })
        .create_one()
        .unwrap();

    let made = made.lock().clone().unwrap();
    assert!(!made.exists());
    assert_eq!(made.get("name"), user.get("name"));
    assert_eq!(created.lock().as_ref(), Some(&user));
}

#[test]
fn test_callback_mutations_are_returned() {
    let (store, ctx) = setup();
    let user = ctx
        .factory(FactoryTestUserFactory)
        .after_making(|user, _| {
            user.set("options", "made");
            Ok(())
        })
        .create_one()
        .unwrap();

    assert_eq!(user.get_str("options"), Some("made"));
    assert_eq!(store.latest(USER).unwrap().get_str("options"), Some("made"));
}

#[test]
fn test_sequences() {
    let (store, ctx) = setup();

    let users = ctx
        .factory(FactoryTestUserFactory)
        .times(2)
        .sequence(vec![
            template! { "name" => "Taylor Otwell" },
            template! { "name" => "Abigail Otwell" },
        ])
        .create()
        .unwrap();
    assert_eq!(users[0].get_str("name"), Some("Taylor Otwell"));
    assert_eq!(users[1].get_str("name"), Some("Abigail Otwell"));

    let user = ctx
        .factory(FactoryTestUserFactory)
        .has_attached(
            ctx.factory(FactoryTestRoleFactory).times(4),
            Sequence::new(vec![template! { "admin" => "Y" }, template! { "admin" => "N" }]),
            Some("roles"),
        )
        .create_one()
        .unwrap();

    let pivots = roles_of(&store, &user);
    let admins: Vec<_> = pivots.iter().filter_map(|p| p.get("admin").and_then(Value::as_str)).collect();
    assert_eq!(admins, vec!["Y", "N", "Y", "N"]);

    let users = ctx
        .factory(FactoryTestUserFactory)
        .times(2)
        .sequence(vec![SequenceItem::callback(|cursor| {
            template! { "name" => format!("index: {}", cursor.index) }
        })])
        .create()
        .unwrap();
    assert_eq!(users[0].get_str("name"), Some("index: 0"));
    assert_eq!(users[1].get_str("name"), Some("index: 1"));
}

#[test]
fn test_sequence_wraps_around() {
    let (_, ctx) = setup();
    let sequence = Sequence::new(vec![template! { "name" => "a" }, template! { "name" => "b" }]);

    let users = ctx
        .factory(FactoryTestUserFactory)
        .times(4)
        .state(sequence.clone())
        .make()
        .unwrap();

    let names: Vec<_> = users.iter().filter_map(|u| u.get_str("name")).collect();
    assert_eq!(names, vec!["a", "b", "a", "b"]);
    assert_eq!(sequence.index(), 4);
}

#[test]
fn test_cross_join_sequences() {
    let (_, ctx) = setup();
    let expected = vec![
        ("Thomas", "Anderson"),
        ("Thomas", "Smith"),
        ("Agent", "Anderson"),
        ("Agent", "Smith"),
    ];
    let lists = || {
        vec![
            vec![template! { "first_name" => "Thomas" }, template! { "first_name" => "Agent" }],
            vec![template! { "last_name" => "Anderson" }, template! { "last_name" => "Smith" }],
        ]
    };
    let names = |users: Vec<Entity>| -> Vec<(String, String)> {
        users
            .iter()
            .map(|u| {
                (
                    u.get_str("first_name").unwrap_or_default().to_string(),
                    u.get_str("last_name").unwrap_or_default().to_string(),
                )
            })
            .collect()
    };
    let expected: Vec<(String, String)> =
        expected.into_iter().map(|(a, b)| (a.to_string(), b.to_string())).collect();

    let by_state = ctx
        .factory(FactoryTestUserFactory)
        .times(4)
        .state(Sequence::cross_join(lists()))
        .make()
        .unwrap();
    assert_eq!(names(by_state), expected);

    let by_method = ctx
        .factory(FactoryTestUserFactory)
        .times(4)
        .cross_join_sequence(lists())
        .make()
        .unwrap();
    assert_eq!(names(by_method), expected);
}

#[test]
fn test_empty_sequence_is_an_error() {
    let (_, ctx) = setup();
    let result = ctx
        .factory(FactoryTestUserFactory)
        .sequence(Vec::<Template>::new())
        .make();

    assert!(matches!(result, Err(FactoryError::EmptySequence)));
}

#[test]
fn test_conditional_execution() {
    let (_, ctx) = setup();
    let user = ctx
        .factory(FactoryTestUserFactory)
        .when(true, |f| f.state(template! { "options" => "when" }))
        .when(false, |_| panic!("unreachable"))
        .unless(false, |f| f.state(template! { "name" => "unless" }))
        .unless(true, |_| panic!("unreachable"))
        .raw_one()
        .unwrap();

    assert_eq!(user.get("options"), Some(&json!("when")));
    assert_eq!(user.get("name"), Some(&json!("unless")));
}

#[test]
fn test_resolves_nested_model_factories() {
    let naming = NamingStrategy::new("App\\", "Factories\\");
    let resolves = [
        ("App\\Foo", "Factories\\FooFactory"),
        ("App\\Models\\Foo", "Factories\\FooFactory"),
        ("App\\Models\\Nested\\Foo", "Factories\\Nested\\FooFactory"),
        ("App\\Models\\Really\\Nested\\Foo", "Factories\\Really\\Nested\\FooFactory"),
    ];

    for (model, factory) in resolves {
        assert_eq!(naming.resolve_factory_name(model), factory);
    }
}

#[test]
fn test_resolves_non_app_nested_model_factories() {
    let naming = NamingStrategy::new("Foo\\", "Factories\\");
    let resolves = [
        ("Foo\\Bar", "Factories\\BarFactory"),
        ("Foo\\Models\\Bar", "Factories\\BarFactory"),
        ("Foo\\Models\\Nested\\Bar", "Factories\\Nested\\BarFactory"),
        ("Foo\\Models\\Really\\Nested\\Bar", "Factories\\Really\\Nested\\BarFactory"),
    ];

    for (model, factory) in resolves {
        assert_eq!(naming.resolve_factory_name(model), factory);
    }
}

struct PriceFactory;

impl Definition for PriceFactory {
    fn factory_name(&self) -> &str {
        "Tests\\Fixtures\\Factories\\Money\\PriceFactory"
    }

    fn definition(&self, faker: &Faker, _context: &FactoryContext) -> Template {
        template! { "name" => faker.word() }
    }
}

#[test]
fn test_resolves_nested_model_names_from_factories() {
    let config = FactoryConfig {
        app_namespace: "Tests\\Fixtures\\".to_string(),
        factory_namespace: "Tests\\Fixtures\\Factories\\".to_string(),
        ..FactoryConfig::default()
    };
    let ctx = FactoryContext::builder(Arc::new(MemoryStore::new()))
        .config(config)
        .build()
        .unwrap();
    ctx.register_model(ModelSchema::new("Tests\\Fixtures\\Models\\Money\\Price", "prices"))
        .unwrap();

    assert_eq!(ctx.factory(PriceFactory).model_name(), "Tests\\Fixtures\\Models\\Money\\Price");
}

#[derive(Debug, Serialize, Deserialize)]
struct FactoryTestUser {
    id: Option<i64>,
    name: String,
    options: Option<String>,
}

impl Model for FactoryTestUser {
    fn model_name() -> &'static str {
        USER
    }
}

impl HasFactory for FactoryTestUser {}

#[test]
fn test_models_have_factories() {
    let (_, ctx) = setup();

    let factory = FactoryTestUser::factory(&ctx).unwrap();
    assert_eq!(factory.factory_name(), "Database\\Factories\\FactoryTestUserFactory");

    let users = FactoryTestUser::factory_with(&ctx, Some(2), template! { "name" => "Typed" })
        .unwrap()
        .create()
        .unwrap();
    let typed: Vec<FactoryTestUser> = users
        .iter()
        .map(FactoryTestUser::from_entity)
        .collect::<FactoryResult<_>>()
        .unwrap();

    assert_eq!(typed.len(), 2);
    assert!(typed.iter().all(|user| user.name == "Typed" && user.id.is_some()));
}

#[test]
fn test_custom_factory_name_guessing() {
    let store = Arc::new(MemoryStore::new());
    let ctx = FactoryContext::builder(store)
        .naming(NamingStrategy::default().guess_factory_names_using(|model| {
            format!("Database\\Factories\\{}Factory", model.rsplit('\\').next().unwrap_or(model))
        }))
        .build()
        .unwrap();
    ctx.register_factory(FactoryTestUserFactory);

    assert!(FactoryTestUser::factory(&ctx).is_ok());
}

#[test]
fn test_missing_factory() {
    let ctx = FactoryContext::new(Arc::new(MemoryStore::new()));
    let error = FactoryTestUser::factory(&ctx).unwrap_err();

    assert!(matches!(error, FactoryError::MissingFactory { .. }));
    assert!(error.to_string().contains("FactoryTestUserFactory"));
}

#[test]
fn test_seeded_faker_is_deterministic() {
    let build = || {
        let config = FactoryConfig {
            seed: Some(7),
            ..FactoryConfig::default()
        };
        let ctx = FactoryContext::builder(Arc::new(MemoryStore::new()))
            .config(config)
            .build()
            .unwrap();
        ctx.factory(FactoryTestUserFactory).times(3).raw().unwrap()
    };

    assert_eq!(build(), build());
}

#[test]
fn test_factory_seeders() {
    let (store, ctx) = setup();
    let manager = SeederManager::new()
        .add(
            FactorySeeder::new("posts", ctx.factory(FactoryTestPostFactory), 5)
                .depends_on(vec!["users".to_string()]),
        )
        .add_factory("users", ctx.factory(FactoryTestUserFactory), 3);

    let ran = manager.run(&ctx, &Environment::Testing).unwrap();

    assert_eq!(ran, vec!["users", "posts"]);
    assert_eq!(store.count(POST), 5);
    // every post brings its own user
    assert_eq!(store.count(USER), 8);
}
