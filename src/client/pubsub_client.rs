use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::registry::Identity;

/// Represents a connected WebSocket client of the registry.
///
/// Each connection gets a random `id` for log correlation. The caller
/// identity is only known after the client presents a valid token; until
/// then `identity` is `None` and registry requests are refused.
#[derive(Debug)]
pub struct Client {
    /// Connection id (UUID), unrelated to the caller identity.
    pub id: String,

    /// Channel to send WebSocket messages to the client.
    pub sender: UnboundedSender<WsMessage>,

    identity: Option<Identity>,
}

impl Client {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            identity: None,
        }
    }

    /// Binds the verified caller identity to this connection.
    pub fn authenticate(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}
