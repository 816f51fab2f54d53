//! Cyclic attribute sequences
//!
//! A [`Sequence`] hands out its items in order and wraps around when it runs
//! out. Clones share the cursor, so a sequence attached to a factory keeps
//! advancing across every copy of that factory.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::attributes::Template;
use crate::error::{FactoryError, FactoryResult};

/// Position information handed to sequence callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceCursor {
    /// Zero-based index of the current call, before it is incremented
    pub index: usize,
    /// Number of items in the sequence
    pub count: usize,
}

/// A single item of a sequence
#[derive(Clone)]
pub enum SequenceItem {
    Attributes(Template),
    Callback(Arc<dyn Fn(SequenceCursor) -> Template + Send + Sync>),
}

impl SequenceItem {
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(SequenceCursor) -> Template + Send + Sync + 'static,
    {
        SequenceItem::Callback(Arc::new(callback))
    }
}

impl From<Template> for SequenceItem {
    fn from(template: Template) -> Self {
        SequenceItem::Attributes(template)
    }
}

struct SequenceState {
    items: Vec<SequenceItem>,
    index: usize,
}

/// Deterministic cyclic generator of attribute templates
#[derive(Clone)]
pub struct Sequence {
    state: Arc<Mutex<SequenceState>>,
}

impl Sequence {
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SequenceItem>,
    {
        Self {
            state: Arc::new(Mutex::new(SequenceState {
                items: items.into_iter().map(Into::into).collect(),
                index: 0,
            })),
        }
    }

    /// Cartesian product of several lists, first list varying slowest
    ///
    /// The templates of one combination are merged left to right.
    pub fn cross_join<L, I>(lists: L) -> Self
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = Template>,
    {
        let mut combinations: Vec<Vec<Template>> = vec![Vec::new()];
        for list in lists {
            let list: Vec<Template> = list.into_iter().collect();
            let mut next = Vec::with_capacity(combinations.len() * list.len());
            for combination in &combinations {
                for item in &list {
                    let mut extended = combination.clone();
                    extended.push(item.clone());
                    next.push(extended);
                }
            }
            combinations = next;
        }

        Self::new(combinations.into_iter().map(|parts| {
            parts
                .into_iter()
                .fold(Template::new(), |merged, part| merged.merged(part))
        }))
    }

    /// Number of items
    pub fn count(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Number of values handed out so far
    pub fn index(&self) -> usize {
        self.state.lock().index
    }

    /// Next template, wrapping around at the end of the list
    ///
    /// Callbacks run after the cursor is released, so they may use any
    /// clone of the sequence.
    pub fn next(&self) -> FactoryResult<Template> {
        let (item, cursor) = {
            let mut state = self.state.lock();
            let count = state.items.len();
            if count == 0 {
                return Err(FactoryError::EmptySequence);
            }

            let cursor = SequenceCursor {
                index: state.index,
                count,
            };
            let item = state.items[cursor.index % count].clone();
            state.index += 1;
            (item, cursor)
        };

        Ok(match item {
            SequenceItem::Attributes(template) => template,
            SequenceItem::Callback(callback) => callback(cursor),
        })
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Sequence")
            .field("count", &state.items.len())
            .field("index", &state.index)
            .finish()
    }
}
