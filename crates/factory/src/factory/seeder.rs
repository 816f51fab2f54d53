//! Database seeding system with environment controls

use std::collections::HashSet;
use std::fmt;

use crate::context::FactoryContext;
use crate::error::{FactoryError, FactoryResult};

use super::Factory;

/// Environment types for seeding control
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Environment {
    Development,
    Testing,
    Staging,
    Production,
    Custom(String),
}

impl Environment {
    /// Parse environment from string
    pub fn parse(env: &str) -> Self {
        match env.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Environment::Development,
            "testing" | "test" => Environment::Testing,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            custom => Environment::Custom(custom.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Custom(name) => name,
        }
    }

    /// Check if this is a safe environment for seeding
    pub fn is_safe_for_seeding(&self) -> bool {
        match self {
            Environment::Development | Environment::Testing | Environment::Staging => true,
            // Requires explicit opt-in
            Environment::Production | Environment::Custom(_) => false,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seeder trait for implementing database seeders
pub trait Seeder: Send + Sync {
    /// Get the seeder name for logging and dependency references
    fn name(&self) -> &str;

    /// Get environments where this seeder should run
    fn environments(&self) -> Vec<Environment> {
        vec![Environment::Development, Environment::Testing]
    }

    /// Check if this seeder should run in the given environment
    fn should_run(&self, env: &Environment) -> bool {
        self.environments().contains(env)
    }

    /// Get seeder priority (lower numbers run first)
    fn priority(&self) -> i32 {
        100
    }

    /// Names of seeders that must run first
    fn dependencies(&self) -> Vec<String> {
        vec![]
    }

    fn run(&self, context: &FactoryContext) -> FactoryResult<()>;
}

/// Seeder creating a fixed number of entities from a factory
///
/// Entities go through the context the factory was built with. Running the
/// seeder against any other context is a configuration error.
pub struct FactorySeeder {
    name: String,
    factory: Factory,
    count: usize,
    environments: Vec<Environment>,
    priority: i32,
    dependencies: Vec<String>,
}

impl FactorySeeder {
    pub fn new(name: impl Into<String>, factory: Factory, count: usize) -> Self {
        Self {
            name: name.into(),
            factory,
            count,
            environments: vec![Environment::Development, Environment::Testing],
            priority: 100,
            dependencies: vec![],
        }
    }

    pub fn environments(mut self, envs: Vec<Environment>) -> Self {
        self.environments = envs;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn depends_on(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl Seeder for FactorySeeder {
    fn name(&self) -> &str {
        &self.name
    }

    fn environments(&self) -> Vec<Environment> {
        self.environments.clone()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    fn run(&self, context: &FactoryContext) -> FactoryResult<()> {
        if !self.factory.context().is_same(context) {
            return Err(FactoryError::Configuration(format!(
                "Seeder '{}' was built with a different factory context",
                self.name
            )));
        }

        tracing::info!(
            "Running seeder: {} (creating {} {} records)",
            self.name,
            self.count,
            self.factory.model_name()
        );

        let created = self.factory.clone().times(self.count).create()?;

        tracing::info!("Seeder {} completed: created {} records", self.name, created.len());
        Ok(())
    }
}

type SeedFn = Box<dyn Fn(&FactoryContext) -> FactoryResult<()> + Send + Sync>;

/// Custom seeder implementation for complex seeding logic
pub struct CustomSeeder {
    name: String,
    environments: Vec<Environment>,
    priority: i32,
    dependencies: Vec<String>,
    run_fn: SeedFn,
}

impl CustomSeeder {
    pub fn new<F>(name: impl Into<String>, run_fn: F) -> Self
    where
        F: Fn(&FactoryContext) -> FactoryResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            environments: vec![Environment::Development, Environment::Testing],
            priority: 100,
            dependencies: vec![],
            run_fn: Box::new(run_fn),
        }
    }

    pub fn environments(mut self, envs: Vec<Environment>) -> Self {
        self.environments = envs;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn depends_on(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl Seeder for CustomSeeder {
    fn name(&self) -> &str {
        &self.name
    }

    fn environments(&self) -> Vec<Environment> {
        self.environments.clone()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    fn run(&self, context: &FactoryContext) -> FactoryResult<()> {
        (self.run_fn)(context)
    }
}

/// Seeder manager for running multiple seeders
#[derive(Default)]
pub struct SeederManager {
    seeders: Vec<Box<dyn Seeder>>,
}

impl SeederManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a seeder to the manager
    pub fn add<S: Seeder + 'static>(mut self, seeder: S) -> Self {
        self.seeders.push(Box::new(seeder));
        self
    }

    /// Add a factory seeder
    pub fn add_factory(self, name: impl Into<String>, factory: Factory, count: usize) -> Self {
        self.add(FactorySeeder::new(name, factory, count))
    }

    pub fn len(&self) -> usize {
        self.seeders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeders.is_empty()
    }

    /// Run all seeders for the given environment, returning their names in run order
    pub fn run(&self, context: &FactoryContext, env: &Environment) -> FactoryResult<Vec<String>> {
        if !env.is_safe_for_seeding() {
            return Err(FactoryError::Configuration(format!(
                "Environment '{}' is not safe for automatic seeding. Use explicit opt-in.",
                env
            )));
        }

        self.run_ordered(context, env)
    }

    /// Run seeders for the current environment
    pub fn run_current(&self, context: &FactoryContext) -> FactoryResult<Vec<String>> {
        self.run(context, &Self::current_environment())
    }

    /// Force run seeders in production (use with caution)
    pub fn run_production_force(&self, context: &FactoryContext) -> FactoryResult<Vec<String>> {
        tracing::warn!("Force running seeders in PRODUCTION environment");
        self.run_ordered(context, &Environment::Production)
    }

    fn run_ordered(&self, context: &FactoryContext, env: &Environment) -> FactoryResult<Vec<String>> {
        for seeder in self.seeders.iter().filter(|seeder| !seeder.should_run(env)) {
            tracing::debug!("Skipping seeder {} in {}", seeder.name(), env);
        }

        let ordered = self.resolve_dependencies(env)?;
        tracing::info!("Running {} seeders for environment: {}", ordered.len(), env);

        let mut ran = Vec::with_capacity(ordered.len());
        for seeder in ordered {
            tracing::info!("Running seeder: {}", seeder.name());
            seeder.run(context)?;
            ran.push(seeder.name().to_string());
        }

        tracing::info!("All seeders completed successfully");
        Ok(ran)
    }

    /// Eligible seeders, dependencies first and otherwise by ascending priority
    fn resolve_dependencies(&self, env: &Environment) -> FactoryResult<Vec<&dyn Seeder>> {
        let registered: HashSet<&str> = self.seeders.iter().map(|seeder| seeder.name()).collect();

        let mut pending: Vec<&dyn Seeder> = self
            .seeders
            .iter()
            .map(|seeder| seeder.as_ref())
            .filter(|seeder| seeder.should_run(env))
            .collect();
        pending.sort_by_key(|seeder| seeder.priority());

        let eligible: HashSet<&str> = self
            .seeders
            .iter()
            .filter(|seeder| seeder.should_run(env))
            .map(|seeder| seeder.name())
            .collect();
        for seeder in &pending {
            for dependency in seeder.dependencies() {
                if !registered.contains(dependency.as_str()) {
                    return Err(FactoryError::Configuration(format!(
                        "Seeder '{}' depends on '{}', but '{}' was not found",
                        seeder.name(),
                        dependency,
                        dependency
                    )));
                }
                if !eligible.contains(dependency.as_str()) {
                    tracing::warn!(
                        "Seeder '{}' depends on '{}', which does not run in {}",
                        seeder.name(),
                        dependency,
                        env
                    );
                }
            }
        }

        let mut done: HashSet<String> = HashSet::new();
        let mut ordered = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending.iter().position(|seeder| {
                seeder
                    .dependencies()
                    .iter()
                    .all(|dep| done.contains(dep) || !eligible.contains(dep.as_str()))
            });

            match ready {
                Some(position) => {
                    let seeder = pending.remove(position);
                    done.insert(seeder.name().to_string());
                    ordered.push(seeder);
                }
                None => {
                    let names: Vec<&str> = pending.iter().map(|seeder| seeder.name()).collect();
                    return Err(FactoryError::Configuration(format!(
                        "Circular dependency detected in seeders: {}",
                        names.join(", ")
                    )));
                }
            }
        }

        Ok(ordered)
    }

    /// Get current environment from environment variables
    pub fn current_environment() -> Environment {
        Self::environment_from(|name| std::env::var(name).ok())
    }

    /// `ELIF_ENV`, then `APP_ENV`, then `ENVIRONMENT`; development when unset
    pub fn environment_from(lookup: impl Fn(&str) -> Option<String>) -> Environment {
        ["ELIF_ENV", "APP_ENV", "ENVIRONMENT"]
            .iter()
            .find_map(|name| lookup(name))
            .map(|env| Environment::parse(&env))
            .unwrap_or(Environment::Development)
    }
}
