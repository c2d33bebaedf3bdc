use std::collections::HashSet;
use std::path::Path;

use sled::transaction::{ConflictableTransactionResult, TransactionError, TransactionResult};
use sled::{Db, Transactional, Tree};
use thiserror::Error;
use tracing::{debug, info};

const META_TREE: &str = "meta";
pub(crate) const TOPICS_TREE: &str = "topics";
const SUBSCRIPTIONS_TREE: &str = "subscriptions";
const ADMIN_KEY: &[u8] = b"admin";

const ACTIVE: &[u8] = &[1];
const INACTIVE: &[u8] = &[0];

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("store belongs to administrator {stored}, not {configured}")]
    AdminMismatch { stored: String, configured: String },

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("transaction aborted")]
    Aborted,
}

impl From<TransactionError<()>> for PersistenceError {
    fn from(err: TransactionError<()>) -> Self {
        match err {
            TransactionError::Abort(()) => PersistenceError::Aborted,
            TransactionError::Storage(e) => PersistenceError::Storage(e),
        }
    }
}

/// Registry state as read back from disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoredState {
    pub active_topics: Vec<String>,
    pub subscriptions: Vec<(String, String)>,
}

/// sled-backed store of the administrator, topic flags and subscriptions.
#[derive(Clone)]
pub struct Persistence {
    db: Db,
    topics: Tree,
    subscriptions: Tree,
}

impl Persistence {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let db = sled::open(path.as_ref())?;
        let topics = db.open_tree(TOPICS_TREE)?;
        let subscriptions = db.open_tree(SUBSCRIPTIONS_TREE)?;
        info!(path = %path.as_ref().display(), "opened registry store");
        Ok(Self {
            db,
            topics,
            subscriptions,
        })
    }

    /// Records `admin` as the owner of this store on first use. A store is
    /// never handed to another administrator.
    pub fn claim_admin(&self, admin: &str) -> Result<(), PersistenceError> {
        let meta = self.db.open_tree(META_TREE)?;
        let claimed =
            meta.compare_and_swap(ADMIN_KEY, None as Option<&[u8]>, Some(admin.as_bytes()))?;

        match claimed {
            Ok(()) => {
                info!(admin, "administrator recorded");
                Ok(())
            }
            Err(cas) => {
                let stored = cas
                    .current
                    .map(|v| String::from_utf8_lossy(&v).into_owned())
                    .unwrap_or_default();
                if stored == admin {
                    Ok(())
                } else {
                    Err(PersistenceError::AdminMismatch {
                        stored,
                        configured: admin.to_string(),
                    })
                }
            }
        }
    }

    pub fn activate_topic(&self, name: &str) -> Result<(), PersistenceError> {
        self.topics.insert(name.as_bytes(), ACTIVE)?;
        debug!(topic = name, "stored active topic");
        Ok(())
    }

    /// Marks `name` inactive and deletes its subscriptions in one transaction.
    pub fn deactivate_topic(
        &self,
        name: &str,
        subscribers: &HashSet<String>,
    ) -> Result<(), PersistenceError> {
        let result: TransactionResult<()> =
            (&self.topics, &self.subscriptions).transaction(
                |(topics, subs)| -> ConflictableTransactionResult<()> {
                    topics.insert(name.as_bytes(), INACTIVE)?;
                    for identity in subscribers {
                        subs.remove(subscription_key(name, identity))?;
                    }
                    Ok(())
                },
            );
        result?;
        debug!(topic = name, "stored inactive topic");
        Ok(())
    }

    pub fn store_subscription(&self, name: &str, identity: &str) -> Result<(), PersistenceError> {
        self.subscriptions
            .insert(subscription_key(name, identity), &[] as &[u8])?;
        Ok(())
    }

    pub fn remove_subscription(&self, name: &str, identity: &str) -> Result<(), PersistenceError> {
        self.subscriptions.remove(subscription_key(name, identity))?;
        Ok(())
    }

    pub fn load(&self) -> Result<StoredState, PersistenceError> {
        let mut state = StoredState::default();

        for entry in self.topics.iter() {
            let (key, value) = entry?;
            let name = decode_utf8(&key)?;
            match &value[..] {
                ACTIVE => state.active_topics.push(name),
                INACTIVE => {}
                other => {
                    return Err(PersistenceError::Corrupt(format!(
                        "topic {name} has flag {other:?}"
                    )));
                }
            }
        }

        for entry in self.subscriptions.iter() {
            let (key, _) = entry?;
            state.subscriptions.push(split_subscription_key(&key)?);
        }

        Ok(state)
    }

    pub fn flush(&self) -> Result<(), PersistenceError> {
        self.db.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("db", &"sled::Db")
            .finish()
    }
}

/// `u32` big-endian topic length, topic bytes, identity bytes.
pub(crate) fn subscription_key(topic: &str, identity: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(4 + topic.len() + identity.len());
    key.extend_from_slice(&(topic.len() as u32).to_be_bytes());
    key.extend_from_slice(topic.as_bytes());
    key.extend_from_slice(identity.as_bytes());
    key
}

pub(crate) fn split_subscription_key(key: &[u8]) -> Result<(String, String), PersistenceError> {
    let corrupt = || PersistenceError::Corrupt(format!("subscription key {key:?}"));

    let (len, rest) = key.split_first_chunk::<4>().ok_or_else(corrupt)?;
    let len = u32::from_be_bytes(*len) as usize;
    if rest.len() < len {
        return Err(corrupt());
    }
    let (topic, identity) = rest.split_at(len);
    Ok((decode_utf8(topic)?, decode_utf8(identity)?))
}

fn decode_utf8(bytes: &[u8]) -> Result<String, PersistenceError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| PersistenceError::Corrupt(format!("invalid utf-8: {e}")))
}
