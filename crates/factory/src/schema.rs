//! Model schemas and relationship metadata
//!
//! Factories never inspect model code. Everything they need to wire
//! relationships (foreign keys, pivot tables, morph columns) is looked up by
//! relationship name in the [`ModelSchema`] registered for a model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FactoryError, FactoryResult};

/// Defines the type of relationship between models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// One-to-one relationship (hasOne)
    HasOne,
    /// One-to-many relationship (hasMany)
    HasMany,
    /// Many-to-one relationship (belongsTo)
    BelongsTo,
    /// Many-to-many relationship through a pivot table
    BelongsToMany,
    /// Polymorphic one-to-one relationship
    MorphOne,
    /// Polymorphic one-to-many relationship
    MorphMany,
    /// Inverse polymorphic relationship
    MorphTo,
}

impl RelationshipType {
    /// Returns true if this relationship type is polymorphic
    pub fn is_polymorphic(self) -> bool {
        matches!(self, Self::MorphOne | Self::MorphMany | Self::MorphTo)
    }

    /// Returns true if this relationship returns a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::BelongsToMany | Self::MorphMany)
    }

    /// Returns true if this relationship requires a pivot table
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::BelongsToMany)
    }

    /// Returns true if the foreign key lives on the declaring model
    pub fn is_inverse(self) -> bool {
        matches!(self, Self::BelongsTo | Self::MorphTo)
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RelationshipType::HasOne => "HasOne",
            RelationshipType::HasMany => "HasMany",
            RelationshipType::BelongsTo => "BelongsTo",
            RelationshipType::BelongsToMany => "BelongsToMany",
            RelationshipType::MorphOne => "MorphOne",
            RelationshipType::MorphMany => "MorphMany",
            RelationshipType::MorphTo => "MorphTo",
        };
        f.write_str(name)
    }
}

/// A named relationship of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMetadata {
    pub relationship_type: RelationshipType,

    /// Name of the relationship, e.g. `posts`
    pub name: String,

    /// Related model name; `None` for morph-to, where it varies per row
    pub related_model: Option<String>,

    /// Foreign key column (on the child, or on this model for belongs-to)
    pub foreign_key: String,

    /// Key on the owning side; the parent's key for has-one/many, the
    /// related model's key for belongs-to
    pub local_key: String,

    /// Pivot table configuration for many-to-many relationships
    pub pivot_config: Option<PivotConfig>,

    /// Morph columns for polymorphic relationships
    pub polymorphic_config: Option<PolymorphicConfig>,
}

impl RelationshipMetadata {
    fn new(
        relationship_type: RelationshipType,
        name: impl Into<String>,
        related_model: Option<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            relationship_type,
            name: name.into(),
            related_model,
            foreign_key: foreign_key.into(),
            local_key: "id".to_string(),
            pivot_config: None,
            polymorphic_config: None,
        }
    }

    /// `name` has many `related`, which point back through `foreign_key`
    pub fn has_many(
        name: impl Into<String>,
        related: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(RelationshipType::HasMany, name, Some(related.into()), foreign_key)
    }

    pub fn has_one(
        name: impl Into<String>,
        related: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(RelationshipType::HasOne, name, Some(related.into()), foreign_key)
    }

    /// This model stores the key of `related` in `foreign_key`
    pub fn belongs_to(
        name: impl Into<String>,
        related: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self::new(RelationshipType::BelongsTo, name, Some(related.into()), foreign_key)
    }

    pub fn belongs_to_many(
        name: impl Into<String>,
        related: impl Into<String>,
        pivot: PivotConfig,
    ) -> Self {
        let foreign_key = pivot.foreign_pivot_key.clone();
        let mut metadata =
            Self::new(RelationshipType::BelongsToMany, name, Some(related.into()), foreign_key);
        metadata.pivot_config = Some(pivot);
        metadata
    }

    /// Polymorphic one-to-many using the `{morph_name}_type` / `{morph_name}_id` columns
    pub fn morph_many(
        name: impl Into<String>,
        related: impl Into<String>,
        morph_name: &str,
    ) -> Self {
        let morph = PolymorphicConfig::from_morph_name(morph_name);
        let mut metadata = Self::new(
            RelationshipType::MorphMany,
            name,
            Some(related.into()),
            morph.id_column.clone(),
        );
        metadata.polymorphic_config = Some(morph);
        metadata
    }

    pub fn morph_one(name: impl Into<String>, related: impl Into<String>, morph_name: &str) -> Self {
        let mut metadata = Self::morph_many(name, related, morph_name);
        metadata.relationship_type = RelationshipType::MorphOne;
        metadata
    }

    /// Inverse polymorphic relationship named after its morph columns
    pub fn morph_to(name: impl Into<String>) -> Self {
        let name = name.into();
        let morph = PolymorphicConfig::from_morph_name(&name);
        let mut metadata = Self::new(RelationshipType::MorphTo, name, None, morph.id_column.clone());
        metadata.polymorphic_config = Some(morph);
        metadata
    }

    /// Set the local key
    pub fn with_local_key(mut self, local_key: impl Into<String>) -> Self {
        self.local_key = local_key.into();
        self
    }

    /// Validate the relationship metadata
    pub fn validate(&self) -> FactoryResult<()> {
        if self.name.is_empty() {
            return Err(FactoryError::Configuration(
                "Relationship name cannot be empty".to_string(),
            ));
        }

        if self.foreign_key.is_empty() {
            return Err(FactoryError::Configuration(format!(
                "Relationship '{}' has an empty foreign key",
                self.name
            )));
        }

        if self.relationship_type != RelationshipType::MorphTo && self.related_model.is_none() {
            return Err(FactoryError::Configuration(format!(
                "Relationship '{}' must name its related model",
                self.name
            )));
        }

        match (self.relationship_type.requires_pivot(), &self.pivot_config) {
            (true, None) => {
                return Err(FactoryError::Configuration(format!(
                    "Relationship '{}' requires pivot configuration",
                    self.name
                )))
            }
            (true, Some(pivot)) => pivot.validate()?,
            _ => {}
        }

        match (self.relationship_type.is_polymorphic(), &self.polymorphic_config) {
            (true, None) => Err(FactoryError::Configuration(format!(
                "Polymorphic relationship '{}' requires morph columns",
                self.name
            ))),
            (true, Some(morph)) => morph.validate(),
            _ => Ok(()),
        }
    }
}

/// Pivot table configuration for many-to-many relationships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotConfig {
    /// The pivot table name
    pub table: String,

    /// Pivot column holding the declaring model's key
    pub foreign_pivot_key: String,

    /// Pivot column holding the related model's key
    pub related_pivot_key: String,

    /// Extra pivot columns carried on attachments
    pub additional_columns: Vec<String>,
}

impl PivotConfig {
    pub fn new(
        table: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            foreign_pivot_key: foreign_pivot_key.into(),
            related_pivot_key: related_pivot_key.into(),
            additional_columns: Vec::new(),
        }
    }

    /// Add additional pivot columns
    pub fn with_additional_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the pivot configuration
    pub fn validate(&self) -> FactoryResult<()> {
        if self.table.is_empty() {
            return Err(FactoryError::Configuration(
                "Pivot table name cannot be empty".to_string(),
            ));
        }

        if self.foreign_pivot_key.is_empty() || self.related_pivot_key.is_empty() {
            return Err(FactoryError::Configuration(
                "Pivot keys cannot be empty".to_string(),
            ));
        }

        if self.foreign_pivot_key == self.related_pivot_key {
            return Err(FactoryError::Configuration(
                "Pivot foreign key and related key must be different".to_string(),
            ));
        }

        Ok(())
    }
}

/// Polymorphic relationship configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolymorphicConfig {
    /// The morph type column name (stores the model name)
    pub type_column: String,

    /// The morph id column name (stores the key)
    pub id_column: String,

    /// The morph name, e.g. `commentable`
    pub name: String,
}

impl PolymorphicConfig {
    pub fn new(
        name: impl Into<String>,
        type_column: impl Into<String>,
        id_column: impl Into<String>,
    ) -> Self {
        Self {
            type_column: type_column.into(),
            id_column: id_column.into(),
            name: name.into(),
        }
    }

    /// `{name}_type` / `{name}_id`
    pub fn from_morph_name(name: &str) -> Self {
        Self::new(name, format!("{}_type", name), format!("{}_id", name))
    }

    /// Validate the polymorphic configuration
    pub fn validate(&self) -> FactoryResult<()> {
        if self.type_column.is_empty() || self.id_column.is_empty() {
            return Err(FactoryError::Configuration(format!(
                "Polymorphic relationship '{}' has empty morph columns",
                self.name
            )));
        }

        if self.type_column == self.id_column {
            return Err(FactoryError::Configuration(
                "Polymorphic type column and ID column must be different".to_string(),
            ));
        }

        Ok(())
    }
}

/// Table, key and relationships of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Fully qualified model name, e.g. `App\Models\User`
    pub name: String,
    pub table: String,
    pub primary_key: String,
    relationships: HashMap<String, RelationshipMetadata>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            relationships: HashMap::new(),
        }
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Register a relationship under its name
    pub fn relationship(mut self, metadata: RelationshipMetadata) -> Self {
        self.relationships.insert(metadata.name.clone(), metadata);
        self
    }

    pub fn get_relationship(&self, name: &str) -> Option<&RelationshipMetadata> {
        self.relationships.get(name)
    }

    pub fn has_relationship(&self, name: &str) -> bool {
        self.relationships.contains_key(name)
    }

    /// Look up a relationship, failing with a configuration error
    pub fn require_relationship(&self, name: &str) -> FactoryResult<&RelationshipMetadata> {
        self.get_relationship(name)
            .ok_or_else(|| FactoryError::UnknownRelationship {
                model: self.name.clone(),
                relationship: name.to_string(),
            })
    }

    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipMetadata> {
        self.relationships.values()
    }

    /// Validate the schema and all of its relationships
    pub fn validate(&self) -> FactoryResult<()> {
        if self.name.is_empty() || self.table.is_empty() || self.primary_key.is_empty() {
            return Err(FactoryError::Configuration(format!(
                "Model schema '{}' must have a name, table and primary key",
                self.name
            )));
        }

        self.relationships.values().try_for_each(RelationshipMetadata::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_type_properties() {
        assert!(RelationshipType::MorphTo.is_polymorphic());
        assert!(RelationshipType::MorphTo.is_inverse());
        assert!(RelationshipType::BelongsToMany.requires_pivot());
        assert!(RelationshipType::HasMany.is_collection());
        assert!(!RelationshipType::BelongsTo.is_collection());
        assert_eq!(RelationshipType::BelongsToMany.to_string(), "BelongsToMany");
    }

    #[test]
    fn test_morph_columns() {
        let comments = RelationshipMetadata::morph_many("comments", "App\\Models\\Comment", "commentable");
        let morph = comments.polymorphic_config.as_ref().unwrap();

        assert_eq!(morph.type_column, "commentable_type");
        assert_eq!(morph.id_column, "commentable_id");
        assert_eq!(comments.foreign_key, "commentable_id");

        let inverse = RelationshipMetadata::morph_to("commentable");
        assert!(inverse.related_model.is_none());
        assert!(inverse.validate().is_ok());
    }

    #[test]
    fn test_pivot_validation() {
        assert!(PivotConfig::new("role_user", "user_id", "role_id").validate().is_ok());
        assert!(PivotConfig::new("role_user", "user_id", "user_id").validate().is_err());
        assert!(PivotConfig::new("", "user_id", "role_id").validate().is_err());

        let roles = RelationshipMetadata::belongs_to_many(
            "roles",
            "App\\Models\\Role",
            PivotConfig::new("role_user", "user_id", "role_id").with_additional_columns(["admin"]),
        );
        assert_eq!(roles.foreign_key, "user_id");
        assert_eq!(roles.pivot_config.as_ref().unwrap().additional_columns, vec!["admin"]);
    }

    #[test]
    fn test_schema_lookup() {
        let schema = ModelSchema::new("App\\Models\\User", "users")
            .relationship(RelationshipMetadata::has_many("posts", "App\\Models\\Post", "user_id"));

        assert!(schema.has_relationship("posts"));
        assert!(schema.validate().is_ok());
        assert!(matches!(
            schema.require_relationship("comments"),
            Err(FactoryError::UnknownRelationship { .. })
        ));
    }

    #[test]
    fn test_invalid_relationship_rejected() {
        let mut broken = RelationshipMetadata::belongs_to("user", "App\\Models\\User", "user_id");
        broken.foreign_key.clear();

        let schema = ModelSchema::new("App\\Models\\Post", "posts").relationship(broken);
        assert!(schema.validate().is_err());
    }
}
