//! Password hashing and bearer-token ports.

use chrono::{DateTime, Utc};
use parley_types::error::AuthError;
use serde::Serialize;
use uuid::Uuid;

/// Abstraction over salted password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a password into a self-describing string.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check `password` against a stored hash. `Ok(false)` is a mismatch;
    /// `Err` means the hash itself could not be read.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// A signed bearer token and its expiry.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Abstraction over bearer-token issuing and verification.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, user_id: Uuid) -> Result<IssuedToken, AuthError>;

    /// Returns the user id carried by a valid, unexpired token.
    fn verify(&self, token: &str) -> Result<Uuid, AuthError>;
}
