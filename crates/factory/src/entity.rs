//! Entities produced by factories
//!
//! An [`Entity`] is a record-like value: the name of the model it belongs to,
//! an ordered attribute map and the name of its key attribute. Typed models
//! convert to and from entities through serde.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::Attributes;
use crate::error::{FactoryError, FactoryResult};

/// A single record built by a factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    model: String,
    key_name: String,
    attributes: Attributes,
    exists: bool,
}

impl Entity {
    /// Create an unpersisted entity keyed by `id`
    pub fn new(model: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            model: model.into(),
            key_name: "id".to_string(),
            attributes,
            exists: false,
        }
    }

    /// Use a different key attribute
    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    /// Fully qualified model name, also used as the morph class
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// The key value, if the entity has a non-null one
    pub fn key(&self) -> Option<&Value> {
        self.attributes
            .get(&self.key_name)
            .filter(|value| !value.is_null())
    }

    /// The key value or `null`
    pub fn key_value(&self) -> Value {
        self.key().cloned().unwrap_or(Value::Null)
    }

    pub fn set_key(&mut self, key: Value) {
        let key_name = self.key_name.clone();
        self.set(key_name, key);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Read a string attribute
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(field.into(), value.into());
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }

    /// Whether the entity has been written to a store
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn set_exists(&mut self, exists: bool) {
        self.exists = exists;
    }

    /// Same model and same non-null key
    pub fn is(&self, other: &Entity) -> bool {
        self.model == other.model
            && self.key().is_some()
            && self.key() == other.key()
    }

    /// Deserialize the attributes into a typed model
    pub fn to_model<T: DeserializeOwned>(&self) -> FactoryResult<T> {
        Ok(serde_json::from_value(Value::Object(self.attributes.clone()))?)
    }
}

/// A typed model that can be built from factory entities
pub trait Model: Serialize + DeserializeOwned {
    /// Fully qualified model name, e.g. `App\Models\User`
    fn model_name() -> &'static str;

    /// Primary key attribute
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Build the model from an entity of the same model
    fn from_entity(entity: &Entity) -> FactoryResult<Self> {
        if entity.model() != Self::model_name() {
            return Err(FactoryError::Configuration(format!(
                "Entity of model [{}] cannot be read as [{}]",
                entity.model(),
                Self::model_name()
            )));
        }
        entity.to_model()
    }

    /// Convert the model back into an unpersisted entity
    fn to_entity(&self) -> FactoryResult<Entity> {
        match serde_json::to_value(self)? {
            Value::Object(attributes) => Ok(Entity::new(Self::model_name(), attributes)
                .with_key_name(Self::primary_key_name())),
            other => Err(FactoryError::Configuration(format!(
                "Model [{}] must serialize to an object, got {}",
                Self::model_name(),
                other
            ))),
        }
    }
}
