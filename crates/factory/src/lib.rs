//! # elif-factory: Model Factories for elif.rs
//!
//! Declarative test data and database seeding. A factory describes the
//! default attributes of a model and builds raw attribute maps, unsaved
//! entities or stored entities from them, wiring up relationships along
//! the way:
//!
//! - has-one / has-many children (`has`, `has_related`)
//! - belongs-to and morph-to parents shared by a whole batch (`for_parent`)
//! - many-to-many attachments with pivot attributes (`has_attached`)
//! - states, sequences and cross-join sequences layered over the definition
//! - after-making / after-creating callbacks
//!
//! Factories run against an [`EntityStore`]; [`MemoryStore`] ships with the
//! crate for tests and seeders.
//!
//! ```
//! use std::sync::Arc;
//! use elif_factory::prelude::*;
//! use elif_factory::template;
//!
//! struct UserFactory;
//!
//! impl Definition for UserFactory {
//!     fn factory_name(&self) -> &str {
//!         "Database\\Factories\\UserFactory"
//!     }
//!
//!     fn definition(&self, faker: &Faker, _context: &FactoryContext) -> Template {
//!         template! { "name" => faker.name(), "email" => faker.email() }
//!     }
//! }
//!
//! # fn main() -> FactoryResult<()> {
//! let store = Arc::new(MemoryStore::new());
//! let context = FactoryContext::new(store.clone());
//! context.register_model(ModelSchema::new("App\\Models\\User", "users"))?;
//!
//! let users = context.factory(UserFactory).times(3).create()?;
//! assert_eq!(users.len(), 3);
//! assert_eq!(store.count("App\\Models\\User"), 3);
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod factory;
pub mod naming;
pub mod schema;
pub mod sequence;
pub mod store;

// Re-export core types
pub use attributes::{AttributeValue, Attributes, Template};
pub use config::FactoryConfig;
pub use context::{FactoryContext, FactoryContextBuilder};
pub use entity::{Entity, Model};
pub use error::{FactoryError, FactoryResult};
pub use factory::{
    Callback, Definition, Environment, Factory, FactorySeeder, Faker, HasFactory, PivotSpec,
    Seeder, SeederManager, State,
};
pub use naming::NamingStrategy;
pub use schema::{ModelSchema, PivotConfig, PolymorphicConfig, RelationshipMetadata, RelationshipType};
pub use sequence::{Sequence, SequenceCursor, SequenceItem};
pub use store::{EntityStore, MemoryStore};

/// Everything needed to write factories and seeders
pub mod prelude {
    pub use crate::attributes::{AttributeValue, Attributes, Template};
    pub use crate::context::FactoryContext;
    pub use crate::entity::{Entity, Model};
    pub use crate::error::{FactoryError, FactoryResult};
    pub use crate::factory::seeder::CustomSeeder;
    pub use crate::factory::{
        ChildSpec, Definition, Environment, Factory, FactorySeeder, Faker, HasFactory, ParentSpec,
        PivotSpec, Seeder, SeederManager, State,
    };
    pub use crate::schema::{ModelSchema, PivotConfig, RelationshipMetadata};
    pub use crate::sequence::{Sequence, SequenceCursor, SequenceItem};
    pub use crate::store::{EntityStore, MemoryStore};
}
