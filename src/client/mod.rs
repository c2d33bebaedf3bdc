//! The `client` module defines the representation of a connected client.
//!
//! It provides the `Client` struct, which holds the connection id, the
//! caller identity established by authentication, and the channel used to
//! push responses back over the WebSocket.

pub mod pubsub_client;
pub use pubsub_client::Client;
