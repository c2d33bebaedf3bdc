//! # popreg
//!
//! `popreg` is a topic registry for publish/subscribe systems. It tracks
//! which topics exist and which identities are interested in each of them;
//! it does not deliver messages. A single administrator, fixed when the
//! registry is created, controls the topic lifecycle. Any authenticated
//! identity may subscribe to or unsubscribe from active topics, and anyone
//! may query subscription state.
//!
//! ## Core Modules
//!
//! - `registry`: the state machine for topics, subscriptions and the administrator gate.
//! - `persistence`: a `sled` store that lets registry state survive restarts.
//! - `client`: represents a connected WebSocket client and its caller identity.
//! - `config`: handles loading server, registry and logging configuration.
//! - `transport`: the JSON protocol, token authentication and the WebSocket server.
//! - `utils`: the top-level error type and logging setup.

pub mod client;
pub mod config;
pub mod persistence;
pub mod registry;
pub mod transport;
pub mod utils;
