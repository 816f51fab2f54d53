//! Naming conventions linking models, factories and relationships
//!
//! Model and factory names are namespaced with `\` separators, e.g.
//! `App\Models\Nested\Foo` pairs with `Database\Factories\Nested\FooFactory`.

use std::fmt;
use std::sync::Arc;

/// Custom model name → factory name resolver
pub type FactoryNameResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Custom factory name → model name resolver
pub type ModelNameResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

const FACTORY_SUFFIX: &str = "Factory";

/// Strategy used to pair models with their factories
#[derive(Clone)]
pub struct NamingStrategy {
    app_namespace: String,
    factory_namespace: String,
    factory_name_resolver: Option<FactoryNameResolver>,
    model_name_resolver: Option<ModelNameResolver>,
}

impl NamingStrategy {
    pub fn new(app_namespace: impl Into<String>, factory_namespace: impl Into<String>) -> Self {
        Self {
            app_namespace: app_namespace.into(),
            factory_namespace: factory_namespace.into(),
            factory_name_resolver: None,
            model_name_resolver: None,
        }
    }

    pub fn app_namespace(&self) -> &str {
        &self.app_namespace
    }

    pub fn factory_namespace(&self) -> &str {
        &self.factory_namespace
    }

    /// Replace the default model → factory convention
    pub fn guess_factory_names_using<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.factory_name_resolver = Some(Arc::new(resolver));
        self
    }

    /// Replace the default factory → model convention
    pub fn guess_model_names_using<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.model_name_resolver = Some(Arc::new(resolver));
        self
    }

    /// Factory name for a model
    ///
    /// The app namespace (and a following `Models\` segment) is replaced by
    /// the factory namespace and `Factory` is appended.
    pub fn resolve_factory_name(&self, model_name: &str) -> String {
        if let Some(resolver) = &self.factory_name_resolver {
            return resolver(model_name);
        }

        let models_namespace = format!("{}Models\\", self.app_namespace);
        let relative = if model_name.starts_with(&models_namespace) {
            after(model_name, &models_namespace)
        } else {
            after(model_name, &self.app_namespace)
        };

        format!("{}{}{}", self.factory_namespace, relative, FACTORY_SUFFIX)
    }

    /// Model name for a factory
    ///
    /// `model_exists` is consulted for the nested `Models\` candidate; when it
    /// is unknown the factory basename is placed directly in the app namespace.
    pub fn resolve_model_name(&self, factory_name: &str, model_exists: impl Fn(&str) -> bool) -> String {
        if let Some(resolver) = &self.model_name_resolver {
            return resolver(factory_name);
        }

        let namespaced = replace_last(
            &replace_first(factory_name, &self.factory_namespace, ""),
            FACTORY_SUFFIX,
            "",
        );
        let candidate = format!("{}Models\\{}", self.app_namespace, namespaced);
        if model_exists(&candidate) {
            return candidate;
        }

        let basename = replace_last(class_basename(factory_name), FACTORY_SUFFIX, "");
        format!("{}{}", self.app_namespace, basename)
    }
}

impl Default for NamingStrategy {
    fn default() -> Self {
        Self::new("App\\", "Database\\Factories\\")
    }
}

impl fmt::Debug for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingStrategy")
            .field("app_namespace", &self.app_namespace)
            .field("factory_namespace", &self.factory_namespace)
            .field("custom_factory_names", &self.factory_name_resolver.is_some())
            .field("custom_model_names", &self.model_name_resolver.is_some())
            .finish()
    }
}

/// Last `\`-separated segment of a name
pub fn class_basename(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

/// `FactoryTestUser` / `factory_test_user` → `factoryTestUser`
pub fn camel(value: &str) -> String {
    let studly: String = value
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();

    let mut chars = studly.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// English plural of the last word
pub fn plural(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with('y') && !ends_with_vowel_y(&lower) {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| lower.ends_with(suffix)) {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

/// Inverse of [`plural`] for the forms it produces
pub fn singular(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if ["sses", "xes", "zes", "ches", "shes"].iter().any(|suffix| lower.ends_with(suffix)) {
        word[..word.len() - 2].to_string()
    } else if lower.ends_with('s') && !lower.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

fn ends_with_vowel_y(lower: &str) -> bool {
    lower
        .chars()
        .rev()
        .nth(1)
        .map(|c| "aeiou".contains(c))
        .unwrap_or(false)
}

fn after<'a>(subject: &'a str, search: &str) -> &'a str {
    if search.is_empty() {
        return subject;
    }
    match subject.find(search) {
        Some(position) => &subject[position + search.len()..],
        None => subject,
    }
}

fn replace_first(subject: &str, search: &str, replace: &str) -> String {
    if search.is_empty() {
        return subject.to_string();
    }
    subject.replacen(search, replace, 1)
}

fn replace_last(subject: &str, search: &str, replace: &str) -> String {
    match subject.rfind(search) {
        Some(position) if !search.is_empty() => format!(
            "{}{}{}",
            &subject[..position],
            replace,
            &subject[position + search.len()..]
        ),
        _ => subject.to_string(),
    }
}
