//! Attribute templates and their resolution
//!
//! A [`Template`] maps field names to [`AttributeValue`]s, which are either
//! literal JSON values, producers evaluated at build time, nested factories
//! or existing entities. [`resolve`] merges overrides into a template and
//! evaluates every value in field order, so a producer can read the fields
//! resolved before it.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::entity::Entity;
use crate::error::FactoryResult;
use crate::factory::Factory;

/// Resolved attributes of a single entity, in field order
pub type Attributes = serde_json::Map<String, Value>;

/// Zero-argument producer
pub type Producer = Arc<dyn Fn() -> FactoryResult<Value> + Send + Sync>;

/// Producer reading the attributes resolved so far
pub type DerivedProducer = Arc<dyn Fn(&Attributes) -> FactoryResult<Value> + Send + Sync>;

/// Producer reading the attributes resolved so far and the parent entity
pub type ContextualProducer =
    Arc<dyn Fn(&Attributes, Option<&Entity>) -> FactoryResult<Value> + Send + Sync>;

/// A single template value
#[derive(Clone)]
pub enum AttributeValue {
    Value(Value),
    Lazy(Producer),
    Derived(DerivedProducer),
    Contextual(ContextualProducer),
    /// Created at resolution time; its key becomes the attribute value
    Factory(Box<Factory>),
    /// Replaced by the entity's key
    Entity(Box<Entity>),
}

impl AttributeValue {
    pub fn lazy<F>(producer: F) -> Self
    where
        F: Fn() -> FactoryResult<Value> + Send + Sync + 'static,
    {
        AttributeValue::Lazy(Arc::new(producer))
    }

    pub fn derived<F>(producer: F) -> Self
    where
        F: Fn(&Attributes) -> FactoryResult<Value> + Send + Sync + 'static,
    {
        AttributeValue::Derived(Arc::new(producer))
    }

    pub fn contextual<F>(producer: F) -> Self
    where
        F: Fn(&Attributes, Option<&Entity>) -> FactoryResult<Value> + Send + Sync + 'static,
    {
        AttributeValue::Contextual(Arc::new(producer))
    }

    /// The literal value, if this is not a deferred value
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            AttributeValue::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Whether resolving this value runs user code or touches the store
    pub fn is_deferred(&self) -> bool {
        !matches!(self, AttributeValue::Value(_))
    }

    fn resolve(self, resolved: &Attributes, parent: Option<&Entity>) -> FactoryResult<Value> {
        match self {
            AttributeValue::Value(value) => Ok(value),
            AttributeValue::Lazy(producer) => producer(),
            AttributeValue::Derived(producer) => producer(resolved),
            AttributeValue::Contextual(producer) => producer(resolved, parent),
            AttributeValue::Factory(factory) => Ok(factory.create_one()?.key_value()),
            AttributeValue::Entity(entity) => Ok(entity.key_value()),
        }
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Value(value) => write!(f, "Value({})", value),
            AttributeValue::Lazy(_) => f.write_str("Lazy(..)"),
            AttributeValue::Derived(_) => f.write_str("Derived(..)"),
            AttributeValue::Contextual(_) => f.write_str("Contextual(..)"),
            AttributeValue::Factory(factory) => write!(f, "Factory({})", factory.model_name()),
            AttributeValue::Entity(entity) => write!(f, "Entity({})", entity.model()),
        }
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        AttributeValue::Value(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Value(Value::from(value))
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Value(Value::from(value))
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Value(Value::from(value))
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Value(Value::from(value))
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::Value(Value::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Value(Value::from(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Value(Value::from(value))
    }
}

impl From<Factory> for AttributeValue {
    fn from(factory: Factory) -> Self {
        AttributeValue::Factory(Box::new(factory))
    }
}

impl From<Entity> for AttributeValue {
    fn from(entity: Entity) -> Self {
        AttributeValue::Entity(Box::new(entity))
    }
}

/// Ordered field → value mapping used for definitions, states and overrides
#[derive(Clone, Default)]
pub struct Template {
    entries: Vec<(String, AttributeValue)>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Template::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a field; an existing field keeps its position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Literal value of a field
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(AttributeValue::as_value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        let position = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Overlay `other` onto this template, field by field
    pub fn merge(&mut self, other: Template) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn merged(mut self, other: Template) -> Self {
        self.merge(other);
        self
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(key, value)| (key, value)))
            .finish()
    }
}

impl From<Attributes> for Template {
    fn from(attributes: Attributes) -> Self {
        attributes.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Template
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut template = Template::new();
        for (key, value) in iter {
            template.insert(key, value);
        }
        template
    }
}

impl IntoIterator for Template {
    type Item = (String, AttributeValue);
    type IntoIter = std::vec::IntoIter<(String, AttributeValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Merge `overrides` into `template` and resolve every value
pub fn resolve(
    template: Template,
    overrides: Template,
    parent: Option<&Entity>,
) -> FactoryResult<Attributes> {
    expand(template.merged(overrides), parent)
}

/// Resolve every value of a template in field order
pub fn expand(template: Template, parent: Option<&Entity>) -> FactoryResult<Attributes> {
    let mut resolved = Attributes::new();
    for (key, value) in template {
        let value = value.resolve(&resolved, parent)?;
        resolved.insert(key, value);
    }
    Ok(resolved)
}

/// Build a [`Template`] from `key => value` pairs
///
/// ```
/// use elif_factory::template;
///
/// let overrides = template! { "name" => "Taylor Otwell", "admin" => true };
/// assert_eq!(overrides.len(), 2);
/// ```
#[macro_export]
macro_rules! template {
    () => {
        $crate::attributes::Template::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut template = $crate::attributes::Template::new();
        $(
            template.insert($key, $value);
        )+
        template
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FactoryError;
    use serde_json::json;

    #[test]
    fn test_overrides_take_precedence() {
        let template = template! { "name" => "default", "options" => Value::Null };
        let resolved = resolve(template, template! { "name" => "custom" }, None).unwrap();

        assert_eq!(resolved.get("name"), Some(&json!("custom")));
        assert_eq!(resolved.get("options"), Some(&Value::Null));
    }

    #[test]
    fn test_override_keeps_field_position() {
        let template = template! { "a" => 1, "b" => 2 };
        let merged = template.merged(template! { "c" => 3, "a" => 10 });

        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(merged.value("a"), Some(&json!(10)));
    }

    #[test]
    fn test_producers_see_earlier_fields() {
        let template = template! {
            "name" => AttributeValue::lazy(|| Ok(json!("taylor"))),
            "options" => AttributeValue::derived(|attributes| {
                let name = attributes.get("name").and_then(Value::as_str).unwrap_or_default();
                Ok(json!(format!("{}-options", name)))
            }),
        };

        let resolved = expand(template, None).unwrap();
        assert_eq!(resolved.get("options"), Some(&json!("taylor-options")));
    }

    #[test]
    fn test_contextual_producer_receives_parent() {
        let parent = Entity::new(
            "App\\Models\\User",
            json!({"id": 9, "name": "Abigail"}).as_object().cloned().unwrap(),
        );
        let template = template! {
            "author" => AttributeValue::contextual(|_, parent| {
                Ok(parent.and_then(|p| p.get("name").cloned()).unwrap_or(Value::Null))
            }),
        };

        assert_eq!(expand(template.clone(), Some(&parent)).unwrap().get("author"), Some(&json!("Abigail")));
        assert_eq!(expand(template, None).unwrap().get("author"), Some(&Value::Null));
    }

    #[test]
    fn test_entity_values_become_keys() {
        let user = Entity::new("App\\Models\\User", json!({"id": 4}).as_object().cloned().unwrap());
        let resolved = expand(template! { "user_id" => user }, None).unwrap();

        assert_eq!(resolved.get("user_id"), Some(&json!(4)));
    }

    #[test]
    fn test_producer_errors_propagate() {
        let template = template! {
            "name" => "ok",
            "broken" => AttributeValue::lazy(|| Err(FactoryError::producer("boom"))),
        };

        let error = expand(template, None).unwrap_err();
        assert!(matches!(error, FactoryError::Producer(ref msg) if msg == "boom"));
    }

    #[test]
    fn test_same_shape_for_repeated_resolution() {
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let producer_counter = counter.clone();
        let template = template! {
            "serial" => AttributeValue::lazy(move || {
                Ok(json!(producer_counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst)))
            }),
        };

        let first = resolve(template.clone(), Template::new(), None).unwrap();
        let second = resolve(template, Template::new(), None).unwrap();

        assert_eq!(first.keys().collect::<Vec<_>>(), second.keys().collect::<Vec<_>>());
        assert_ne!(first.get("serial"), second.get("serial"));
    }

    #[test]
    fn test_template_from_attributes() {
        let attributes = json!({"admin": "Y"}).as_object().cloned().unwrap();
        let template = Template::from(attributes);
        assert_eq!(template.value("admin"), Some(&json!("Y")));
        assert!(!template.get("admin").unwrap().is_deferred());
    }
}
