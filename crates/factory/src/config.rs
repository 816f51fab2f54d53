//! Factory configuration
//!
//! Values come from code or from `FACTORY_*` environment variables.

use std::env;

use crate::error::{FactoryError, FactoryResult};
use crate::naming::NamingStrategy;

/// Configuration for factory behavior
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryConfig {
    /// Seed for deterministic fake data generation
    pub seed: Option<u64>,
    /// Root namespace of application models
    pub app_namespace: String,
    /// Root namespace of factories
    pub factory_namespace: String,
    /// Largest count a single factory may build
    pub max_count: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            seed: None,
            app_namespace: "App\\".to_string(),
            factory_namespace: "Database\\Factories\\".to_string(),
            max_count: 10_000,
        }
    }
}

impl FactoryConfig {
    /// Load configuration from environment variables
    ///
    /// Recognized: `FACTORY_SEED`, `FACTORY_APP_NAMESPACE`,
    /// `FACTORY_NAMESPACE`, `FACTORY_MAX_COUNT`.
    pub fn from_env() -> FactoryResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FactoryResult<Self> {
        let mut config = Self::default();

        if let Some(seed) = lookup("FACTORY_SEED") {
            config.seed = Some(parse_number("FACTORY_SEED", &seed)?);
        }
        if let Some(namespace) = lookup("FACTORY_APP_NAMESPACE") {
            config.app_namespace = namespace;
        }
        if let Some(namespace) = lookup("FACTORY_NAMESPACE") {
            config.factory_namespace = namespace;
        }
        if let Some(max_count) = lookup("FACTORY_MAX_COUNT") {
            config.max_count = parse_number("FACTORY_MAX_COUNT", &max_count)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> FactoryResult<()> {
        for (field, namespace) in [
            ("app_namespace", &self.app_namespace),
            ("factory_namespace", &self.factory_namespace),
        ] {
            if !namespace.is_empty() && !namespace.ends_with('\\') {
                return Err(FactoryError::Configuration(format!(
                    "{} '{}' must end with a namespace separator",
                    field, namespace
                )));
            }
        }

        if self.max_count == 0 {
            return Err(FactoryError::Configuration(
                "max_count must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Naming strategy built from the configured namespaces
    pub fn naming(&self) -> NamingStrategy {
        NamingStrategy::new(self.app_namespace.clone(), self.factory_namespace.clone())
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> FactoryResult<T> {
    value.trim().parse().map_err(|_| {
        FactoryError::Configuration(format!("{} must be a positive integer, got '{}'", field, value))
    })
}
