//! The `persistence` module keeps registry state on disk.
//!
//! It uses `sled` as an embedded key-value store: one tree for the topic
//! active flags, one for subscriptions keyed by (topic, identity), and a
//! small meta tree holding the administrator the store was created for.

pub mod sled_store;

pub use sled_store::{Persistence, PersistenceError, StoredState};
