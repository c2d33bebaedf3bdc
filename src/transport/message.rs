use serde::{Deserialize, Serialize};

use crate::registry::RegistryError;

/// Error code for a registry request sent before a successful `auth`.
pub const UNAUTHENTICATED: &str = "unauthenticated";
/// Error code for a rejected token. The connection is closed afterwards.
pub const AUTH_FAILED: &str = "auth_failed";
/// Error code for a frame that does not parse as a `ClientMessage`.
pub const INVALID_REQUEST: &str = "invalid_request";

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "auth")]
    Auth { token: String },

    #[serde(rename = "add_topic")]
    AddTopic { topic: String },

    #[serde(rename = "remove_topic")]
    RemoveTopic { topic: String },

    #[serde(rename = "total_topics")]
    TotalTopics,

    #[serde(rename = "owner")]
    Owner,

    #[serde(rename = "subscribe")]
    Subscribe { topic: String },

    #[serde(rename = "unsubscribe")]
    Unsubscribe { topic: String },

    #[serde(rename = "is_subscribed")]
    IsSubscribed { topic: String, identity: String },
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "authenticated")]
    Authenticated { identity: String },

    /// A mutation was accepted (including idempotent no-ops).
    #[serde(rename = "ok")]
    Success { op: String, topic: String },

    #[serde(rename = "total_topics")]
    TotalTopics { count: usize },

    #[serde(rename = "owner")]
    Owner { identity: String },

    #[serde(rename = "subscription")]
    Subscription {
        topic: String,
        identity: String,
        subscribed: bool,
    },

    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn success(op: &str, topic: String) -> Self {
        ServerMessage::Success {
            op: op.to_string(),
            topic,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<&RegistryError> for ServerMessage {
    fn from(err: &RegistryError) -> Self {
        ServerMessage::error(err.as_label(), err.to_string())
    }
}
