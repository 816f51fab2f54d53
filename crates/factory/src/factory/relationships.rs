//! Relationship directives attached to factories
//!
//! * [`Relationship`]: children created for every parent (`has`)
//! * [`BelongsToRelationship`]: a parent shared by every child (`for_parent`)
//! * [`BelongsToManyRelationship`]: related entities attached through a
//!   pivot table (`has_attached`)

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::attributes::{self, AttributeValue, Attributes, Template};
use crate::context::FactoryContext;
use crate::entity::Entity;
use crate::error::{FactoryError, FactoryResult};
use crate::schema::{ModelSchema, PolymorphicConfig, RelationshipMetadata, RelationshipType};
use crate::sequence::Sequence;

use super::Factory;

/// Children created through a has-one/has-many/morph/many-to-many relationship
#[derive(Clone, Debug)]
pub struct Relationship {
    factory: Factory,
    relationship: String,
}

impl Relationship {
    pub fn new(factory: Factory, relationship: impl Into<String>) -> Self {
        Self {
            factory,
            relationship: relationship.into(),
        }
    }

    pub fn relationship(&self) -> &str {
        &self.relationship
    }

    /// Create the related entities for a stored parent
    pub fn create_for(&self, parent: &Entity, context: &FactoryContext) -> FactoryResult<()> {
        let schema = context.schema(parent.model())?;
        let metadata = schema.require_relationship(&self.relationship)?;

        match metadata.relationship_type {
            RelationshipType::HasOne | RelationshipType::HasMany => {
                let state = Template::new().with(metadata.foreign_key.clone(), parent_key(parent, metadata));
                self.factory.clone().state(state).create_for_parent(parent)?;
            }
            RelationshipType::MorphOne | RelationshipType::MorphMany => {
                let morph = morph_config(metadata)?;
                let state = Template::new()
                    .with(morph.type_column.clone(), parent.model())
                    .with(morph.id_column.clone(), parent_key(parent, metadata));
                self.factory.clone().state(state).create_for_parent(parent)?;
            }
            RelationshipType::BelongsToMany => {
                let children = self.factory.create_for_parent(parent)?;
                for child in &children {
                    attach(context, parent, metadata, child, Attributes::new())?;
                }
            }
            other => return Err(unsupported(&self.relationship, other, "has")),
        }

        Ok(())
    }
}

/// Parent of a belongs-to directive
#[derive(Clone, Debug)]
pub enum ParentSpec {
    Factory(Box<Factory>),
    Entity(Box<Entity>),
}

impl ParentSpec {
    pub fn model_name(&self) -> &str {
        match self {
            ParentSpec::Factory(factory) => factory.model_name(),
            ParentSpec::Entity(entity) => entity.model(),
        }
    }
}

impl From<Factory> for ParentSpec {
    fn from(factory: Factory) -> Self {
        ParentSpec::Factory(Box::new(factory))
    }
}

impl From<Entity> for ParentSpec {
    fn from(entity: Entity) -> Self {
        ParentSpec::Entity(Box::new(entity))
    }
}

/// A parent shared by every entity a factory builds
///
/// A parent factory is created at most once: the key is remembered and
/// reused by every later entity, including those built by clones of the
/// owning factory.
#[derive(Clone)]
pub struct BelongsToRelationship {
    parent: ParentSpec,
    relationship: String,
    resolved: Arc<Mutex<Option<Value>>>,
}

impl BelongsToRelationship {
    pub fn new(parent: impl Into<ParentSpec>, relationship: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            relationship: relationship.into(),
            resolved: Arc::new(Mutex::new(None)),
        }
    }

    pub fn relationship(&self) -> &str {
        &self.relationship
    }

    /// Foreign key attributes (and morph type) for a child of `schema`
    pub fn attributes_for(&self, schema: &ModelSchema) -> FactoryResult<Template> {
        let metadata = schema.require_relationship(&self.relationship)?;

        match metadata.relationship_type {
            RelationshipType::BelongsTo => {
                Ok(Template::new().with(metadata.foreign_key.clone(), self.resolver(&metadata.local_key)))
            }
            RelationshipType::MorphTo => {
                let morph = morph_config(metadata)?;
                Ok(Template::new()
                    .with(morph.type_column.clone(), self.parent.model_name())
                    .with(morph.id_column.clone(), self.resolver(&metadata.local_key)))
            }
            other => Err(unsupported(&self.relationship, other, "for_parent")),
        }
    }

    /// Lazily resolved owner key of the parent
    ///
    /// Reads `owner_key` from the parent and falls back to its primary key
    /// when the attribute is missing or null.
    fn resolver(&self, owner_key: &str) -> AttributeValue {
        let parent = self.parent.clone();
        let resolved = self.resolved.clone();
        let owner_key = owner_key.to_string();

        AttributeValue::lazy(move || {
            if let Some(key) = resolved.lock().clone() {
                return Ok(key);
            }

            let key = match &parent {
                ParentSpec::Factory(factory) => owner_key_of(&factory.create_one()?, &owner_key),
                ParentSpec::Entity(entity) => owner_key_of(entity, &owner_key),
            };
            *resolved.lock() = Some(key.clone());

            Ok(key)
        })
    }
}

impl fmt::Debug for BelongsToRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BelongsToRelationship")
            .field("parent", &self.parent.model_name())
            .field("relationship", &self.relationship)
            .field("resolved", &*self.resolved.lock())
            .finish()
    }
}

/// Related entities for a many-to-many attachment
#[derive(Clone, Debug)]
pub enum ChildSpec {
    Factory(Box<Factory>),
    Entity(Box<Entity>),
    Entities(Vec<Entity>),
}

impl ChildSpec {
    /// Model of the related entities, if it can be told
    pub fn model_name(&self) -> Option<&str> {
        match self {
            ChildSpec::Factory(factory) => Some(factory.model_name()),
            ChildSpec::Entity(entity) => Some(entity.model()),
            ChildSpec::Entities(entities) => entities.first().map(Entity::model),
        }
    }
}

impl From<Factory> for ChildSpec {
    fn from(factory: Factory) -> Self {
        ChildSpec::Factory(Box::new(factory))
    }
}

impl From<Entity> for ChildSpec {
    fn from(entity: Entity) -> Self {
        ChildSpec::Entity(Box::new(entity))
    }
}

impl From<Vec<Entity>> for ChildSpec {
    fn from(entities: Vec<Entity>) -> Self {
        ChildSpec::Entities(entities)
    }
}

/// Pivot callback, invoked once per parent
pub type PivotCallback = Arc<dyn Fn(&Entity) -> FactoryResult<Attributes> + Send + Sync>;

/// Pivot attributes of a many-to-many attachment
#[derive(Clone)]
pub enum PivotSpec {
    /// The same attributes for every attachment
    Attributes(Attributes),
    /// Resolved once per parent, with the parent as context
    Template(Template),
    /// Invoked once per parent
    Callback(PivotCallback),
    /// Advanced once per attached child
    Sequence(Sequence),
}

impl PivotSpec {
    pub fn none() -> Self {
        PivotSpec::Attributes(Attributes::new())
    }

    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&Entity) -> FactoryResult<Attributes> + Send + Sync + 'static,
    {
        PivotSpec::Callback(Arc::new(callback))
    }
}

impl Default for PivotSpec {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Attributes> for PivotSpec {
    fn from(attributes: Attributes) -> Self {
        PivotSpec::Attributes(attributes)
    }
}

impl From<Template> for PivotSpec {
    fn from(template: Template) -> Self {
        PivotSpec::Template(template)
    }
}

impl From<Sequence> for PivotSpec {
    fn from(sequence: Sequence) -> Self {
        PivotSpec::Sequence(sequence)
    }
}

impl fmt::Debug for PivotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PivotSpec::Attributes(attributes) => f.debug_tuple("Attributes").field(attributes).finish(),
            PivotSpec::Template(template) => f.debug_tuple("Template").field(template).finish(),
            PivotSpec::Callback(_) => f.write_str("Callback(..)"),
            PivotSpec::Sequence(sequence) => f.debug_tuple("Sequence").field(sequence).finish(),
        }
    }
}

/// Entities attached to every parent through a many-to-many relationship
#[derive(Clone, Debug)]
pub struct BelongsToManyRelationship {
    children: ChildSpec,
    pivot: PivotSpec,
    relationship: String,
}

impl BelongsToManyRelationship {
    pub fn new(
        children: impl Into<ChildSpec>,
        pivot: impl Into<PivotSpec>,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            children: children.into(),
            pivot: pivot.into(),
            relationship: relationship.into(),
        }
    }

    pub fn relationship(&self) -> &str {
        &self.relationship
    }

    /// Create (if needed) and attach the related entities to `parent`
    pub fn create_for(&self, parent: &Entity, context: &FactoryContext) -> FactoryResult<()> {
        let schema = context.schema(parent.model())?;
        let metadata = schema.require_relationship(&self.relationship)?;
        if metadata.relationship_type != RelationshipType::BelongsToMany {
            return Err(unsupported(&self.relationship, metadata.relationship_type, "has_attached"));
        }

        let children = match &self.children {
            ChildSpec::Factory(factory) => factory.create_for_parent(parent)?,
            ChildSpec::Entity(entity) => vec![entity.as_ref().clone()],
            ChildSpec::Entities(entities) => entities.clone(),
        };
        if children.is_empty() {
            return Ok(());
        }

        let per_parent = match &self.pivot {
            PivotSpec::Attributes(attributes) => Some(attributes.clone()),
            PivotSpec::Template(template) => Some(attributes::expand(template.clone(), Some(parent))?),
            PivotSpec::Callback(callback) => Some(callback(parent)?),
            PivotSpec::Sequence(_) => None,
        };

        for child in &children {
            let pivot = match (&per_parent, &self.pivot) {
                (Some(pivot), _) => pivot.clone(),
                (None, PivotSpec::Sequence(sequence)) => {
                    attributes::expand(sequence.next()?, Some(parent))?
                }
                (None, _) => Attributes::new(),
            };
            attach(context, parent, metadata, child, pivot)?;
        }

        tracing::trace!(
            "Attached {} {} to {} {}",
            children.len(),
            self.relationship,
            parent.model(),
            parent.key_value()
        );
        Ok(())
    }
}

/// A child directive, run after the parent is stored
#[derive(Clone, Debug)]
pub enum ChildRelationship {
    Has(Relationship),
    Attached(BelongsToManyRelationship),
}

impl ChildRelationship {
    pub fn create_for(&self, parent: &Entity, context: &FactoryContext) -> FactoryResult<()> {
        match self {
            ChildRelationship::Has(relationship) => relationship.create_for(parent, context),
            ChildRelationship::Attached(relationship) => relationship.create_for(parent, context),
        }
    }
}

fn parent_key(parent: &Entity, metadata: &RelationshipMetadata) -> Value {
    owner_key_of(parent, &metadata.local_key)
}

fn owner_key_of(entity: &Entity, key: &str) -> Value {
    entity
        .get(key)
        .filter(|value| !value.is_null())
        .cloned()
        .unwrap_or_else(|| entity.key_value())
}

fn morph_config(metadata: &RelationshipMetadata) -> FactoryResult<&PolymorphicConfig> {
    metadata.polymorphic_config.as_ref().ok_or_else(|| {
        FactoryError::Configuration(format!(
            "Polymorphic relationship '{}' has no morph columns",
            metadata.name
        ))
    })
}

fn attach(
    context: &FactoryContext,
    parent: &Entity,
    metadata: &RelationshipMetadata,
    child: &Entity,
    pivot: Attributes,
) -> FactoryResult<()> {
    let config = metadata.pivot_config.as_ref().ok_or_else(|| {
        FactoryError::InvalidPivot(format!("relationship '{}' has no pivot table", metadata.name))
    })?;

    if !config.additional_columns.is_empty() {
        if let Some(column) = pivot.keys().find(|key| !config.additional_columns.contains(key)) {
            return Err(FactoryError::InvalidPivot(format!(
                "column '{}' is not a pivot column of '{}'",
                column, config.table
            )));
        }
    }

    let mut record = Attributes::new();
    record.insert(config.foreign_pivot_key.clone(), parent_key(parent, metadata));
    record.insert(config.related_pivot_key.clone(), child.key_value());
    record.extend(pivot);

    context.store().attach(&config.table, record)
}

fn unsupported(relationship: &str, kind: RelationshipType, directive: &'static str) -> FactoryError {
    FactoryError::UnsupportedRelationship {
        relationship: relationship.to_string(),
        kind: kind.to_string(),
        directive,
    }
}
