//! Caller authentication
//!
//! The registry never decides who a caller is. A connection proves its
//! identity by presenting an HS256 JWT signed with the server secret; the
//! `sub` claim becomes the caller identity for every later request.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::Identity;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token carries an empty identity")]
    EmptyIdentity,

    #[error("token lifetime out of range")]
    InvalidTtl,
}

/// Converts a lifetime in hours, rejecting values chrono cannot represent.
pub fn ttl_from_hours(hours: i64) -> Result<Duration, AuthError> {
    Duration::try_hours(hours).ok_or(AuthError::InvalidTtl)
}

/// Signs a token attributing `identity`, valid for `ttl`.
pub fn issue_token(secret: &str, identity: &str, ttl: Duration) -> Result<String, AuthError> {
    if identity.is_empty() {
        return Err(AuthError::EmptyIdentity);
    }
    let expires_at = Utc::now()
        .checked_add_signed(ttl)
        .ok_or(AuthError::InvalidTtl)?;
    let claims = Claims {
        sub: identity.to_string(),
        exp: expires_at.timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AuthError::Encode)
}

/// Verifies signature and expiry, returning the caller identity.
pub fn verify_token(secret: &str, token: &str) -> Result<Identity, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(AuthError::Invalid)?;

    if data.claims.sub.is_empty() {
        return Err(AuthError::EmptyIdentity);
    }
    Ok(data.claims.sub)
}
