//! HS256 bearer tokens.
//!
//! Claims carry the user id in `sub` plus issue and expiry times. Expiry is
//! checked by `jsonwebtoken`'s default validation.

use std::time::Duration;

use rand_core::{OsRng, RngCore};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use parley_core::auth::credentials::{IssuedToken, TokenCodec};
use parley_types::error::AuthError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokenCodec {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        Self::from_bytes(secret.expose_secret().as_bytes(), ttl)
    }

    /// A codec keyed with random bytes. Tokens die with the process.
    pub fn ephemeral(ttl: Duration) -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::from_bytes(&key, ttl)
    }

    fn from_bytes(key: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            ttl,
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, user_id: Uuid) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|e| AuthError::Token(e.to_string()))?;
        let expires_at = now + ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(e.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.sub)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> JwtTokenCodec {
        JwtTokenCodec::new(&SecretString::from(secret.to_string()), Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec("test-secret");
        let user = Uuid::now_v7();
        let issued = codec.issue(user).unwrap();
        assert!(issued.expires_at > Utc::now());
        assert_eq!(codec.verify(&issued.token).unwrap(), user);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = codec("one").issue(Uuid::now_v7()).unwrap();
        assert!(matches!(codec("two").verify(&issued.token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec("test-secret");
        let past = Utc::now().timestamp() - 7200;
        let claims = Claims {
            sub: Uuid::now_v7(),
            iat: past - 60,
            exp: past,
        };
        let token = encode(&Header::default(), &claims, &codec.encoding).unwrap();
        assert!(matches!(codec.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(codec("s").verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_ephemeral_codecs_do_not_share_keys() {
        let a = JwtTokenCodec::ephemeral(Duration::from_secs(60));
        let b = JwtTokenCodec::ephemeral(Duration::from_secs(60));
        let issued = a.issue(Uuid::now_v7()).unwrap();
        assert!(a.verify(&issued.token).is_ok());
        assert!(b.verify(&issued.token).is_err());
    }
}
