//! Model factory system
//!
//! A [`Factory`] pairs a model [`Definition`] with a build plan: how many
//! entities to build, which states to layer over the definition, which
//! parents they belong to, which children to create for them and which
//! callbacks to run. Builder methods return new factory values, so a base
//! factory can be shared and specialized freely.

use std::fmt;
use std::sync::Arc;

use crate::attributes::{self, Attributes, Template};
use crate::context::FactoryContext;
use crate::entity::Entity;
use crate::error::{FactoryError, FactoryResult};
use crate::naming::{camel, class_basename, plural, singular};
use crate::sequence::{Sequence, SequenceItem};

pub mod fake_data;
pub mod relationships;
pub mod seeder;
pub mod states;
pub mod traits;

pub use fake_data::Faker;
pub use relationships::{
    BelongsToManyRelationship, BelongsToRelationship, ChildRelationship, ChildSpec, ParentSpec,
    PivotSpec, Relationship,
};
pub use seeder::{Environment, FactorySeeder, Seeder, SeederManager};
pub use states::State;
pub use traits::{Definition, HasFactory};

/// After-making / after-creating callback
///
/// Receives the entity and, when built for a parent, the parent entity.
pub type Callback = Arc<dyn Fn(&mut Entity, Option<&Entity>) -> FactoryResult<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Raw,
    Make,
    Create,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Raw => write!(f, "raw"),
            Mode::Make => write!(f, "make"),
            Mode::Create => write!(f, "create"),
        }
    }
}

/// Builder and executor of entities for one model
#[derive(Clone)]
pub struct Factory {
    definition: Arc<dyn Definition>,
    context: FactoryContext,
    model: String,
    count: Option<usize>,
    states: Vec<State>,
    has: Vec<ChildRelationship>,
    for_parents: Vec<BelongsToRelationship>,
    after_making: Vec<Callback>,
    after_creating: Vec<Callback>,
}

impl Factory {
    /// Factory for a definition, with the definition's `configure` hook applied
    pub fn new(definition: Arc<dyn Definition>, context: FactoryContext) -> Self {
        let model = context.model_name_for(definition.as_ref());
        let factory = Self {
            definition: definition.clone(),
            context,
            model,
            count: None,
            states: Vec::new(),
            has: Vec::new(),
            for_parents: Vec::new(),
            after_making: Vec::new(),
            after_creating: Vec::new(),
        };

        definition.configure(factory)
    }

    /// Fully qualified name of the model this factory builds
    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn factory_name(&self) -> &str {
        self.definition.factory_name()
    }

    pub fn context(&self) -> &FactoryContext {
        &self.context
    }

    pub fn get_count(&self) -> Option<usize> {
        self.count
    }

    /// Number of entities to build; `None` builds a single entity
    pub fn count(mut self, count: Option<usize>) -> Self {
        self.count = count;
        self
    }

    pub fn times(self, count: usize) -> Self {
        self.count(Some(count))
    }

    /// Layer a state over the definition
    pub fn state(mut self, state: impl Into<State>) -> Self {
        self.states.push(state.into());
        self
    }

    /// Layer a sequence over the definition, advanced once per entity
    pub fn sequence<I, T>(self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SequenceItem>,
    {
        self.state(Sequence::new(items))
    }

    /// Layer the cartesian product of several lists over the definition
    pub fn cross_join_sequence<L, I>(self, lists: L) -> Self
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = Template>,
    {
        self.state(Sequence::cross_join(lists))
    }

    /// Create children for every entity through a has-style relationship
    ///
    /// Without a relationship name, the plural camel-case basename of the
    /// child model is used, or its singular when the model has no such
    /// relationship.
    pub fn has(mut self, factory: Factory, relationship: Option<&str>) -> Self {
        let relationship = match relationship {
            Some(name) => name.to_string(),
            None => self.guess_child_relationship(factory.model_name()),
        };

        self.has
            .push(ChildRelationship::Has(Relationship::new(factory, relationship)));
        self
    }

    /// Create `count` related entities through a named relationship
    pub fn has_related(self, relationship: &str, count: usize) -> FactoryResult<Self> {
        self.has_related_with(relationship, count, Template::new())
    }

    pub fn has_related_with(
        self,
        relationship: &str,
        count: usize,
        state: Template,
    ) -> FactoryResult<Self> {
        let related = self.related_factory(relationship, "has_related")?;
        Ok(self.has(related.times(count).state(state), Some(relationship)))
    }

    /// Make every entity belong to a parent
    ///
    /// Without a relationship name, the camel-case basename of the parent
    /// model is used.
    pub fn for_parent(mut self, parent: impl Into<ParentSpec>, relationship: Option<&str>) -> Self {
        let parent = parent.into();
        let relationship = match relationship {
            Some(name) => name.to_string(),
            None => camel(class_basename(parent.model_name())),
        };

        self.for_parents
            .push(BelongsToRelationship::new(parent, relationship));
        self
    }

    /// Make every entity belong to a new parent of a named relationship
    pub fn for_related(self, relationship: &str, state: Template) -> FactoryResult<Self> {
        let parent = self.related_factory(relationship, "for_related")?.state(state);
        Ok(self.for_parent(parent, Some(relationship)))
    }

    /// Attach related entities to every entity through a pivot table
    pub fn has_attached(
        mut self,
        children: impl Into<ChildSpec>,
        pivot: impl Into<PivotSpec>,
        relationship: Option<&str>,
    ) -> Self {
        let children = children.into();
        let relationship = match relationship {
            Some(name) => name.to_string(),
            None => self.guess_child_relationship(children.model_name().unwrap_or_default()),
        };

        self.has.push(ChildRelationship::Attached(BelongsToManyRelationship::new(
            children,
            pivot,
            relationship,
        )));
        self
    }

    /// Run a callback on every made entity
    pub fn after_making<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Entity, Option<&Entity>) -> FactoryResult<()> + Send + Sync + 'static,
    {
        self.after_making.push(Arc::new(callback));
        self
    }

    /// Run a callback on every created entity, after its children exist
    pub fn after_creating<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Entity, Option<&Entity>) -> FactoryResult<()> + Send + Sync + 'static,
    {
        self.after_creating.push(Arc::new(callback));
        self
    }

    pub fn when(self, condition: bool, apply: impl FnOnce(Self) -> Self) -> Self {
        if condition {
            apply(self)
        } else {
            self
        }
    }

    pub fn unless(self, condition: bool, apply: impl FnOnce(Self) -> Self) -> Self {
        self.when(!condition, apply)
    }

    /// Resolved attributes, one set per planned entity
    pub fn raw(&self) -> FactoryResult<Vec<Attributes>> {
        self.raw_with(Template::new())
    }

    /// Resolved attributes of a single entity, ignoring the count
    pub fn raw_one(&self) -> FactoryResult<Attributes> {
        single(&self.model, self.clone().count(None).raw())
    }

    pub fn raw_with(&self, overrides: Template) -> FactoryResult<Vec<Attributes>> {
        self.log_plan(Mode::Raw)?;
        self.resolve_all(&overrides, None)
    }

    /// Unpersisted entities
    pub fn make(&self) -> FactoryResult<Vec<Entity>> {
        self.make_with(Template::new())
    }

    pub fn make_one(&self) -> FactoryResult<Entity> {
        single(&self.model, self.clone().count(None).make())
    }

    pub fn make_with(&self, overrides: Template) -> FactoryResult<Vec<Entity>> {
        self.log_plan(Mode::Make)?;
        self.make_entities(&overrides, None)
    }

    /// Persisted entities, with their children and attachments
    pub fn create(&self) -> FactoryResult<Vec<Entity>> {
        self.create_with(Template::new())
    }

    pub fn create_one(&self) -> FactoryResult<Entity> {
        single(&self.model, self.clone().count(None).create())
    }

    pub fn create_with(&self, overrides: Template) -> FactoryResult<Vec<Entity>> {
        self.log_plan(Mode::Create)?;
        self.create_entities(&overrides, None)
    }

    /// One persisted entity per override set
    pub fn create_many(&self, records: Vec<Template>) -> FactoryResult<Vec<Entity>> {
        let factory = self.clone().count(None);
        let mut created = Vec::with_capacity(records.len());
        for overrides in records {
            created.extend(factory.create_with(overrides)?);
        }
        Ok(created)
    }

    /// Deferred creation of a single entity
    pub fn lazy(&self, overrides: Template) -> impl Fn() -> FactoryResult<Entity> + Send + Sync + 'static {
        let factory = self.clone().count(None);
        move || single(&factory.model, factory.create_with(overrides.clone()))
    }

    /// Create entities for a stored parent, respecting the count
    pub(crate) fn create_for_parent(&self, parent: &Entity) -> FactoryResult<Vec<Entity>> {
        self.log_plan(Mode::Create)?;
        self.create_entities(&Template::new(), Some(parent))
    }

    fn planned(&self) -> FactoryResult<usize> {
        let count = self.count.unwrap_or(1);
        let max_count = self.context.config().max_count;
        if count > max_count {
            return Err(FactoryError::Configuration(format!(
                "Requested {} {} entities, the maximum is {}",
                count, self.model, max_count
            )));
        }
        Ok(count)
    }

    fn log_plan(&self, mode: Mode) -> FactoryResult<()> {
        let count = self.planned()?;
        tracing::debug!(
            "Factory {} planning {} {} ({}, {} states, {} parents, {} child relationships)",
            self.factory_name(),
            count,
            self.model,
            mode,
            self.states.len(),
            self.for_parents.len(),
            self.has.len()
        );
        Ok(())
    }

    /// Definition, then parents, then states, in registration order
    fn compose(&self, parent: Option<&Entity>) -> FactoryResult<Template> {
        let mut template = self.definition.definition(&Faker::new(), &self.context);

        if !self.for_parents.is_empty() {
            let schema = self.context.schema(&self.model)?;
            for relationship in &self.for_parents {
                template.merge(relationship.attributes_for(&schema)?);
            }
        }

        for state in &self.states {
            let layer = state.apply(&template, parent)?;
            template.merge(layer);
        }

        Ok(template)
    }

    fn resolve_all(&self, overrides: &Template, parent: Option<&Entity>) -> FactoryResult<Vec<Attributes>> {
        (0..self.planned()?)
            .map(|_| attributes::resolve(self.compose(parent)?, overrides.clone(), parent))
            .collect()
    }

    fn make_entities(&self, overrides: &Template, parent: Option<&Entity>) -> FactoryResult<Vec<Entity>> {
        let key_name = self.context.primary_key(&self.model);
        let mut entities: Vec<Entity> = self
            .resolve_all(overrides, parent)?
            .into_iter()
            .map(|attributes| Entity::new(self.model.clone(), attributes).with_key_name(key_name.clone()))
            .collect();

        for entity in entities.iter_mut() {
            for callback in &self.after_making {
                callback(entity, parent)?;
            }
        }

        Ok(entities)
    }

    fn create_entities(&self, overrides: &Template, parent: Option<&Entity>) -> FactoryResult<Vec<Entity>> {
        let mut entities = self.make_entities(overrides, parent)?;
        let store = self.context.store();

        for entity in entities.iter_mut() {
            store.insert(entity)?;
            for relationship in &self.has {
                relationship.create_for(entity, &self.context)?;
            }
        }

        for entity in entities.iter_mut() {
            for callback in &self.after_creating {
                callback(entity, parent)?;
            }
        }

        Ok(entities)
    }

    fn related_factory(&self, relationship: &str, directive: &'static str) -> FactoryResult<Factory> {
        let schema = self.context.schema(&self.model)?;
        let metadata = schema.require_relationship(relationship)?;
        let related = metadata.related_model.as_deref().ok_or_else(|| {
            FactoryError::UnsupportedRelationship {
                relationship: relationship.to_string(),
                kind: metadata.relationship_type.to_string(),
                directive,
            }
        })?;

        self.context.factory_for_model(related)
    }

    fn guess_child_relationship(&self, related_model: &str) -> String {
        let guess = camel(&plural(class_basename(related_model)));
        match self.context.schema(&self.model) {
            Ok(schema) if !schema.has_relationship(&guess) => singular(&guess),
            _ => guess,
        }
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("factory", &self.factory_name())
            .field("model", &self.model)
            .field("count", &self.count)
            .field("states", &self.states)
            .field("has", &self.has)
            .field("for_parents", &self.for_parents)
            .field("after_making", &self.after_making.len())
            .field("after_creating", &self.after_creating.len())
            .finish()
    }
}

fn single<T>(model: &str, built: FactoryResult<Vec<T>>) -> FactoryResult<T> {
    built?.into_iter().next().ok_or_else(|| {
        FactoryError::Configuration(format!("Factory for [{}] built no entities", model))
    })
}
