//! Request dispatch
//!
//! Maps one authenticated `ClientMessage` onto one registry operation and
//! builds the reply. The registry lock is held for exactly that operation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::registry::Registry;
use crate::transport::message::{ClientMessage, INVALID_REQUEST, ServerMessage};

pub fn handle_request(
    registry: &Mutex<Registry>,
    caller: &str,
    request: ClientMessage,
) -> ServerMessage {
    debug!(caller, ?request, "dispatching request");

    let (op, topic, result) = match request {
        ClientMessage::AddTopic { topic } => {
            let result = lock(registry).add_topic(&topic, caller);
            ("add_topic", topic, result)
        }
        ClientMessage::RemoveTopic { topic } => {
            let result = lock(registry).remove_topic(&topic, caller);
            ("remove_topic", topic, result)
        }
        ClientMessage::Subscribe { topic } => {
            let result = lock(registry).subscribe(&topic, caller);
            ("subscribe", topic, result)
        }
        ClientMessage::Unsubscribe { topic } => {
            let result = lock(registry).unsubscribe(&topic, caller);
            ("unsubscribe", topic, result)
        }
        ClientMessage::TotalTopics => {
            let count = lock(registry).total_topics();
            return ServerMessage::TotalTopics { count };
        }
        ClientMessage::Owner => {
            let identity = lock(registry).admin().to_string();
            return ServerMessage::Owner { identity };
        }
        ClientMessage::IsSubscribed { topic, identity } => {
            let subscribed = lock(registry).is_subscribed(&topic, &identity);
            return ServerMessage::Subscription {
                topic,
                identity,
                subscribed,
            };
        }
        ClientMessage::Auth { .. } => {
            return ServerMessage::error(INVALID_REQUEST, "auth is handled by the connection");
        }
    };

    match result {
        Ok(()) => ServerMessage::success(op, topic),
        Err(err) => ServerMessage::from(&err),
    }
}

/// Registry operations never leave partial state behind, so a poisoned
/// lock still guards a consistent registry.
fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
