//! Topic state
//!
//! A `Topic` is a two-state machine (`Inactive` / `Active`) plus the set of
//! identities subscribed to it. A topic starts `Inactive` and is activated
//! when added; removal drops it from the registry together with its
//! subscribers. Subscriptions are stored as a `HashSet`, so
//! duplicate subscribes and unsubscribes of absent identities are no-ops.
//!
//! Concurrency note: callers must synchronize access to `Topic` (for example
//! via the registry lock) when modifying it.

use std::collections::HashSet;

/// Identity of a caller, as attributed by the transport.
pub type Identity = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicState {
    #[default]
    Inactive,
    Active,
}

#[derive(Debug, Clone, Default)]
pub struct Topic {
    pub name: String,
    pub state: TopicState,
    pub subscribers: HashSet<Identity>,
}

impl Topic {
    /// Create a new, inactive topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: TopicState::Inactive,
            subscribers: HashSet::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == TopicState::Active
    }

    /// Transition to `Active`. Returns `false` if the topic already was.
    pub fn activate(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = TopicState::Active;
        true
    }

    /// Add a subscriber. Duplicate adds are ignored.
    pub fn subscribe(&mut self, id: Identity) -> bool {
        self.subscribers.insert(id)
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&mut self, id: &str) -> bool {
        self.subscribers.remove(id)
    }

    pub fn is_subscribed(&self, id: &str) -> bool {
        self.subscribers.contains(id)
    }
}
