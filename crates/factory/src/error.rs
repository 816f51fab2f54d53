//! Error types for the factory system
//!
//! Configuration problems (missing factories, unknown relationships, empty
//! sequences) are reported synchronously. Errors raised by attribute producers
//! and by the entity store are passed through unchanged.

use thiserror::Error;

/// Result type alias for factory operations
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Error types for factory operations
#[derive(Debug, Error)]
pub enum FactoryError {
    /// No factory is registered under the resolved factory name
    #[error("Unable to locate factory [{factory}] for model [{model}]")]
    MissingFactory { model: String, factory: String },

    /// No schema is registered for the model
    #[error("Model [{0}] is not registered")]
    UnknownModel(String),

    /// The model has no relationship with the given name
    #[error("Call to undefined relationship [{relationship}] on model [{model}]")]
    UnknownRelationship { model: String, relationship: String },

    /// The relationship exists but cannot be used by the requested directive
    #[error("Relationship [{relationship}] of type {kind} cannot be used with {directive}")]
    UnsupportedRelationship {
        relationship: String,
        kind: String,
        directive: &'static str,
    },

    /// A sequence without items was advanced
    #[error("Cannot advance an empty sequence")]
    EmptySequence,

    /// Pivot attributes could not be built
    #[error("Invalid pivot attributes: {0}")]
    InvalidPivot(String),

    /// Invalid factory configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The entity store rejected an operation
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// An attribute producer or callback failed
    #[error("Producer error: {0}")]
    Producer(String),

    /// Entity (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FactoryError {
    /// Shorthand for producer failures raised from user closures
    pub fn producer(message: impl Into<String>) -> Self {
        FactoryError::Producer(message.into())
    }

    /// Returns true for errors caused by factory or schema configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FactoryError::MissingFactory { .. }
                | FactoryError::UnknownModel(_)
                | FactoryError::UnknownRelationship { .. }
                | FactoryError::UnsupportedRelationship { .. }
                | FactoryError::EmptySequence
                | FactoryError::InvalidPivot(_)
                | FactoryError::Configuration(_)
        )
    }
}

impl From<anyhow::Error> for FactoryError {
    fn from(err: anyhow::Error) -> Self {
        FactoryError::Producer(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_factory_message() {
        let error = FactoryError::MissingFactory {
            model: "App\\Models\\User".to_string(),
            factory: "Database\\Factories\\UserFactory".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Unable to locate factory [Database\\Factories\\UserFactory] for model [App\\Models\\User]"
        );
        assert!(error.is_configuration());
    }

    #[test]
    fn test_store_errors_are_not_configuration() {
        assert!(!FactoryError::Persistence("unique violation".to_string()).is_configuration());
        assert!(!FactoryError::producer("boom").is_configuration());
    }

    #[test]
    fn test_anyhow_conversion() {
        let error: FactoryError = anyhow::anyhow!("faker exhausted").into();
        assert!(matches!(error, FactoryError::Producer(ref msg) if msg == "faker exhausted"));
    }
}
