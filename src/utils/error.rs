//! The `error` module defines the top-level error type of the `popreg`
//! application.
//!
//! Each concern keeps its own error enum (`RegistryError`,
//! `PersistenceError`, `AuthError`); this type aggregates the ones that can
//! stop the binary so `main` has a single thing to report.

use thiserror::Error;

use crate::persistence::PersistenceError;
use crate::transport::auth::AuthError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
