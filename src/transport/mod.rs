//! The `transport` module is responsible for handling network communication
//! with clients via WebSockets.
//!
//! It defines the JSON protocol used between clients and the server, the
//! token check that establishes each caller's identity, the dispatch of
//! requests onto the registry, and the WebSocket server itself.

pub mod auth;
pub mod handler;
pub mod message;
pub mod websocket;

#[cfg(test)]
mod websocket_tests;

pub use message::{ClientMessage, ServerMessage};
pub use websocket::{serve, start_websocket_server};
