//! Factory states layered over a definition

use std::fmt;
use std::sync::Arc;

use crate::attributes::Template;
use crate::entity::Entity;
use crate::error::FactoryResult;
use crate::sequence::Sequence;

/// Callback state: receives the attributes composed so far and the parent
pub type StateCallback = Arc<dyn Fn(&Template, Option<&Entity>) -> Template + Send + Sync>;

/// A layer of attribute overrides
#[derive(Clone)]
pub enum State {
    /// Fixed overrides
    Attributes(Template),
    /// Overrides computed from the current attributes and the parent entity
    Callback(StateCallback),
    /// Next item of a sequence, advanced once per built entity
    Sequence(Sequence),
}

impl State {
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&Template, Option<&Entity>) -> Template + Send + Sync + 'static,
    {
        State::Callback(Arc::new(callback))
    }

    /// Overrides this state contributes for one entity
    pub(crate) fn apply(&self, current: &Template, parent: Option<&Entity>) -> FactoryResult<Template> {
        match self {
            State::Attributes(template) => Ok(template.clone()),
            State::Callback(callback) => Ok(callback(current, parent)),
            State::Sequence(sequence) => sequence.next(),
        }
    }
}

impl From<Template> for State {
    fn from(template: Template) -> Self {
        State::Attributes(template)
    }
}

impl From<Sequence> for State {
    fn from(sequence: Sequence) -> Self {
        State::Sequence(sequence)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Attributes(template) => f.debug_tuple("Attributes").field(template).finish(),
            State::Callback(_) => f.write_str("Callback(..)"),
            State::Sequence(sequence) => f.debug_tuple("Sequence").field(sequence).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template;
    use serde_json::json;

    #[test]
    fn test_attribute_state() {
        let state = State::from(template! { "status" => "active" });
        let layer = state.apply(&Template::new(), None).unwrap();
        assert_eq!(layer.value("status"), Some(&json!("active")));
    }

    #[test]
    fn test_callback_state_reads_current_attributes() {
        let state = State::callback(|current, parent| {
            let base = current.value("name").and_then(|v| v.as_str()).unwrap_or("none").to_string();
            let owner = parent.map(|p| p.model().to_string()).unwrap_or_default();
            template! { "slug" => format!("{}:{}", base, owner) }
        });

        let parent = Entity::new("App\\Models\\User", Default::default());
        let layer = state.apply(&template! { "name" => "post" }, Some(&parent)).unwrap();
        assert_eq!(layer.value("slug"), Some(&json!("post:App\\Models\\User")));
    }

    #[test]
    fn test_sequence_state_advances() {
        let state = State::from(Sequence::new(vec![template! { "n" => 1 }, template! { "n" => 2 }]));

        let values: Vec<_> = (0..3)
            .map(|_| state.apply(&Template::new(), None).unwrap().value("n").cloned())
            .collect();
        assert_eq!(values, vec![Some(json!(1)), Some(json!(2)), Some(json!(1))]);
    }
}
