//! Shared factory context
//!
//! A [`FactoryContext`] is the explicit replacement for global factory state:
//! it carries the entity store, the naming strategy, registered factory
//! definitions and model schemas. It is cheap to clone and every factory
//! holds one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::FactoryConfig;
use crate::error::{FactoryError, FactoryResult};
use crate::factory::fake_data::Faker;
use crate::factory::{Definition, Factory};
use crate::naming::NamingStrategy;
use crate::schema::ModelSchema;
use crate::store::EntityStore;

struct ContextInner {
    store: Arc<dyn EntityStore>,
    naming: NamingStrategy,
    config: FactoryConfig,
    definitions: RwLock<HashMap<String, Arc<dyn Definition>>>,
    schemas: RwLock<HashMap<String, ModelSchema>>,
}

/// Handle shared by all factories of one test or seeding run
#[derive(Clone)]
pub struct FactoryContext {
    inner: Arc<ContextInner>,
}

impl FactoryContext {
    /// Context with default configuration
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        let config = FactoryConfig::default();
        Self::from_parts(store, config.naming(), config)
    }

    pub fn builder(store: Arc<dyn EntityStore>) -> FactoryContextBuilder {
        FactoryContextBuilder {
            store,
            config: FactoryConfig::default(),
            naming: None,
        }
    }

    fn from_parts(store: Arc<dyn EntityStore>, naming: NamingStrategy, config: FactoryConfig) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                store,
                naming,
                config,
                definitions: RwLock::new(HashMap::new()),
                schemas: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.inner.store
    }

    pub fn naming(&self) -> &NamingStrategy {
        &self.inner.naming
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.inner.config
    }

    /// Register (or replace) the schema of a model
    pub fn register_model(&self, schema: ModelSchema) -> FactoryResult<()> {
        schema.validate()?;
        tracing::debug!("Registered model schema {}", schema.name);
        self.inner.schemas.write().insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Register a factory definition under its factory name
    pub fn register_factory<D: Definition>(&self, definition: D) {
        let name = definition.factory_name().to_string();
        tracing::debug!("Registered factory {}", name);
        self.inner.definitions.write().insert(name, Arc::new(definition));
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.inner.schemas.read().contains_key(model)
    }

    pub fn schema(&self, model: &str) -> FactoryResult<ModelSchema> {
        self.inner
            .schemas
            .read()
            .get(model)
            .cloned()
            .ok_or_else(|| FactoryError::UnknownModel(model.to_string()))
    }

    /// Primary key of a model, `id` when no schema is registered
    pub fn primary_key(&self, model: &str) -> String {
        self.inner
            .schemas
            .read()
            .get(model)
            .map(|schema| schema.primary_key.clone())
            .unwrap_or_else(|| "id".to_string())
    }

    /// Whether both handles share the same registries and store
    pub fn is_same(&self, other: &FactoryContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// New factory for a definition
    pub fn factory<D: Definition>(&self, definition: D) -> Factory {
        Factory::new(Arc::new(definition), self.clone())
    }

    /// New factory for a model, located through the naming strategy
    pub fn factory_for_model(&self, model: &str) -> FactoryResult<Factory> {
        let factory_name = self.naming().resolve_factory_name(model);
        let definition = self
            .inner
            .definitions
            .read()
            .get(&factory_name)
            .cloned()
            .ok_or_else(|| FactoryError::MissingFactory {
                model: model.to_string(),
                factory: factory_name.clone(),
            })?;

        Ok(Factory::new(definition, self.clone()))
    }

    /// Model built by a definition, guessed from its factory name when unset
    pub fn model_name_for(&self, definition: &dyn Definition) -> String {
        match definition.model_name() {
            Some(model) => model.to_string(),
            None => self
                .naming()
                .resolve_model_name(definition.factory_name(), |candidate| self.has_model(candidate)),
        }
    }
}

impl fmt::Debug for FactoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryContext")
            .field("naming", &self.inner.naming)
            .field("config", &self.inner.config)
            .field("factories", &self.inner.definitions.read().len())
            .field("models", &self.inner.schemas.read().len())
            .finish()
    }
}

/// Builder for [`FactoryContext`]
pub struct FactoryContextBuilder {
    store: Arc<dyn EntityStore>,
    config: FactoryConfig,
    naming: Option<NamingStrategy>,
}

impl FactoryContextBuilder {
    pub fn config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the naming strategy derived from the configuration
    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Validate the configuration and build the context
    ///
    /// A configured seed reseeds the fake data generator of the calling thread.
    pub fn build(self) -> FactoryResult<FactoryContext> {
        self.config.validate()?;

        if let Some(seed) = self.config.seed {
            Faker::seed(seed);
        }

        let naming = self.naming.unwrap_or_else(|| self.config.naming());
        Ok(FactoryContext::from_parts(self.store, naming, self.config))
    }
}
