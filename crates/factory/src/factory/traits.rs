//! Factory trait definitions and core abstractions

use crate::attributes::Template;
use crate::context::FactoryContext;
use crate::entity::Model;
use crate::error::FactoryResult;

use super::fake_data::Faker;
use super::Factory;

/// The model-specific part of a factory
///
/// Implementors describe the default attributes of one model. Everything
/// else (counts, states, relationships, persistence) is handled by
/// [`Factory`].
pub trait Definition: Send + Sync + 'static {
    /// Fully qualified factory name, e.g. `Database\Factories\UserFactory`
    fn factory_name(&self) -> &str;

    /// Model built by this factory; guessed from the factory name when `None`
    fn model_name(&self) -> Option<&str> {
        None
    }

    /// Default attributes of the model
    ///
    /// Nested factories for related models come from `context`.
    fn definition(&self, faker: &Faker, context: &FactoryContext) -> Template;

    /// Hook applied to every new factory, e.g. to register callbacks
    fn configure(&self, factory: Factory) -> Factory {
        factory
    }
}

/// Typed models that know how to get their factory
pub trait HasFactory: Model {
    /// Explicit factory for the model, bypassing name resolution
    fn new_factory(_context: &FactoryContext) -> Option<Factory> {
        None
    }

    /// Factory for the model
    fn factory(context: &FactoryContext) -> FactoryResult<Factory> {
        match Self::new_factory(context) {
            Some(factory) => Ok(factory),
            None => context.factory_for_model(Self::model_name()),
        }
    }

    /// Factory for the model with a count and an initial state
    fn factory_with(
        context: &FactoryContext,
        count: Option<usize>,
        state: Template,
    ) -> FactoryResult<Factory> {
        Ok(Self::factory(context)?.count(count).state(state))
    }
}
