use thiserror::Error;

use crate::persistence::PersistenceError;

/// Rejections produced by registry operations.
///
/// Every variant means the call was refused as a whole: no topic or
/// subscription changed.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Caller tried an administrator-only mutation.
    #[error("caller {caller} is not the registry administrator")]
    Unauthorized { caller: String },

    /// Subscribe or unsubscribe against a topic that is not active.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// The backing store refused the commit.
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs and on the wire.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::Unauthorized { .. } => "unauthorized",
            RegistryError::UnknownTopic(_) => "unknown_topic",
            RegistryError::Persistence(_) => "persistence",
        }
    }
}
