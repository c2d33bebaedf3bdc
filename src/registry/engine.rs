//! Registry engine
//!
//! This module contains the registry state machine responsible for:
//! - tracking which topic names are active
//! - tracking, per active topic, the identities subscribed to it
//! - gating topic creation and removal behind the administrator identity
//!
//! Concurrency and usage notes:
//! - The public API here is synchronous and designed to be held behind a
//!   lock (for example `Arc<Mutex<Registry>>`) by the transport layer. One
//!   lock acquisition per operation gives every caller a consistent view.
//! - When a `Persistence` store is attached, every mutation is committed to
//!   the store before it is applied in memory. A failed commit leaves the
//!   registry untouched.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::persistence::{Persistence, PersistenceError};
use crate::registry::error::RegistryError;
use crate::registry::topic::{Identity, Topic};

#[derive(Debug)]
pub struct Registry {
    admin: Identity,
    /// Active topics only. Removal drops the entry.
    pub(crate) topics: HashMap<String, Topic>,
    persistence: Option<Persistence>,
}

impl Registry {
    /// Creates an in-memory registry owned by `admin`.
    pub fn new(admin: impl Into<Identity>) -> Self {
        Self {
            admin: admin.into(),
            topics: HashMap::new(),
            persistence: None,
        }
    }

    /// Creates a registry backed by `persistence`, restoring any state
    /// committed by a previous run.
    ///
    /// Fails with [`PersistenceError::AdminMismatch`] if the store was created
    /// for a different administrator.
    pub fn with_persistence(
        admin: impl Into<Identity>,
        persistence: Persistence,
    ) -> Result<Self, PersistenceError> {
        let admin = admin.into();
        persistence.claim_admin(&admin)?;
        let stored = persistence.load()?;

        let mut topics = HashMap::new();
        for name in stored.active_topics {
            let mut topic = Topic::new(&name);
            topic.activate();
            topics.insert(name, topic);
        }
        for (name, identity) in stored.subscriptions {
            match topics.get_mut(&name) {
                Some(topic) => {
                    topic.subscribe(identity);
                }
                None => warn!(topic = %name, %identity, "ignoring subscription to inactive topic"),
            }
        }

        info!(admin = %admin, topics = topics.len(), "registry restored from store");

        Ok(Self {
            admin,
            topics,
            persistence: Some(persistence),
        })
    }

    pub fn admin(&self) -> &str {
        &self.admin
    }

    /// Rejects every caller except the administrator.
    pub fn require_admin(&self, caller: &str) -> Result<(), RegistryError> {
        if caller == self.admin {
            return Ok(());
        }
        warn!(caller, "rejected administrator-only call");
        Err(RegistryError::Unauthorized {
            caller: caller.to_string(),
        })
    }

    /// Marks `name` active. Adding an active topic is a no-op.
    pub fn add_topic(&mut self, name: &str, caller: &str) -> Result<(), RegistryError> {
        self.require_admin(caller)?;

        if self.is_active(name) {
            debug!(topic = name, "topic already active");
            return Ok(());
        }

        if let Some(persistence) = &self.persistence {
            persistence.activate_topic(name)?;
        }
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| Topic::new(name))
            .activate();

        info!(topic = name, "topic added");
        Ok(())
    }

    /// Marks `name` inactive and drops its subscribers. Removing an unknown
    /// or inactive topic is a no-op.
    pub fn remove_topic(&mut self, name: &str, caller: &str) -> Result<(), RegistryError> {
        self.require_admin(caller)?;

        let Some(topic) = self.topics.get(name).filter(|t| t.is_active()) else {
            debug!(topic = name, "topic not active, nothing to remove");
            return Ok(());
        };

        if let Some(persistence) = &self.persistence {
            persistence.deactivate_topic(name, &topic.subscribers)?;
        }
        if let Some(removed) = self.topics.remove(name) {
            info!(
                topic = %removed.name,
                dropped = removed.subscribers.len(),
                "topic removed"
            );
        }
        Ok(())
    }

    /// Number of currently active topics.
    pub fn total_topics(&self) -> usize {
        self.topics.values().filter(|t| t.is_active()).count()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.topics.get(name).is_some_and(Topic::is_active)
    }

    /// Records `caller` as subscribed to the active topic `name`.
    pub fn subscribe(&mut self, name: &str, caller: &str) -> Result<(), RegistryError> {
        let topic = active_topic_mut(&mut self.topics, name)?;

        if topic.is_subscribed(caller) {
            debug!(topic = name, caller, "already subscribed");
            return Ok(());
        }

        if let Some(persistence) = &self.persistence {
            persistence.store_subscription(name, caller)?;
        }
        topic.subscribe(caller.to_string());

        info!(topic = name, caller, "subscribed");
        Ok(())
    }

    /// Clears `caller`'s subscription to the active topic `name`, if any.
    pub fn unsubscribe(&mut self, name: &str, caller: &str) -> Result<(), RegistryError> {
        let topic = active_topic_mut(&mut self.topics, name)?;

        if !topic.is_subscribed(caller) {
            debug!(topic = name, caller, "not subscribed");
            return Ok(());
        }

        if let Some(persistence) = &self.persistence {
            persistence.remove_subscription(name, caller)?;
        }
        topic.unsubscribe(caller);

        info!(topic = name, caller, "unsubscribed");
        Ok(())
    }

    /// Whether `identity` is subscribed to `name`. Never fails: unknown
    /// topics and identities simply report `false`.
    pub fn is_subscribed(&self, name: &str, identity: &str) -> bool {
        self.topics
            .get(name)
            .is_some_and(|t| t.is_active() && t.is_subscribed(identity))
    }

    /// Flushes the backing store, if any.
    pub fn flush(&self) -> Result<(), PersistenceError> {
        match &self.persistence {
            Some(persistence) => persistence.flush(),
            None => Ok(()),
        }
    }
}

fn active_topic_mut<'a>(
    topics: &'a mut HashMap<String, Topic>,
    name: &str,
) -> Result<&'a mut Topic, RegistryError> {
    match topics.get_mut(name) {
        Some(topic) if topic.is_active() => Ok(topic),
        _ => {
            warn!(topic = name, "topic not active");
            Err(RegistryError::UnknownTopic(name.to_string()))
        }
    }
}
