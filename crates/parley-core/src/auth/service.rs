//! Account service: registration, login, profile, and token verification.

use std::time::Duration;

use parley_types::chat::{Chat, WELCOME_CHAT_TITLE};
use parley_types::error::AuthError;
use parley_types::user::{User, UserProfile};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::credentials::{IssuedToken, PasswordHasher, TokenCodec};
use crate::auth::repository::UserRepository;
use crate::chat::repository::ChatRepository;
use crate::deadline::bounded;

/// Lowercase and trim an email, rejecting obviously malformed input.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AuthError::Validation("invalid email address".to_string()))
    }
}

/// Generic over its repositories and credential adapters; `AppState` pins
/// them to concrete infra types.
pub struct AuthService<U, C, H, T>
where
    U: UserRepository,
    C: ChatRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    users: U,
    chats: C,
    hasher: H,
    tokens: T,
    min_password_len: usize,
    store_timeout: Duration,
}

impl<U, C, H, T> AuthService<U, C, H, T>
where
    U: UserRepository,
    C: ChatRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    pub fn new(
        users: U,
        chats: C,
        hasher: H,
        tokens: T,
        min_password_len: usize,
        store_timeout: Duration,
    ) -> Self {
        Self {
            users,
            chats,
            hasher,
            tokens,
            min_password_len,
            store_timeout,
        }
    }

    /// Create an account and its first chat.
    ///
    /// The welcome chat is best-effort: if it cannot be written the account
    /// still exists and the failure is logged.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < self.min_password_len {
            return Err(AuthError::Validation(format!(
                "password must be at least {} characters",
                self.min_password_len
            )));
        }

        let user = User::new(email, self.hasher.hash(password)?);
        bounded(
            self.store_timeout,
            AuthError::StorageTimeout,
            self.users.create_user(&user),
        )
        .await?;

        let welcome = Chat::new(user.id, WELCOME_CHAT_TITLE);
        match bounded(
            self.store_timeout,
            AuthError::StorageTimeout,
            self.chats.create_chat(&welcome),
        )
        .await
        {
            Ok(()) => {}
            Err(e) => warn!(user_id = %user.id, error = %e, "Failed to create welcome chat"),
        }

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a token. Unknown email and wrong password
    /// are indistinguishable.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, IssuedToken), AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = bounded(
            self.store_timeout,
            AuthError::StorageTimeout,
            self.users.find_by_email(&email),
        )
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "User logged in");
        Ok((user, token))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, AuthError> {
        let user = bounded(
            self.store_timeout,
            AuthError::StorageTimeout,
            self.users.find_by_id(&user_id),
        )
        .await?
        .ok_or(AuthError::UserNotFound)?;
        Ok(UserProfile::from(&user))
    }

    /// Resolve a bearer token to a user id.
    pub fn authenticate(&self, token: &str) -> Result<Uuid, AuthError> {
        self.tokens.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryChats, InMemoryUsers, PlainHasher, PlainTokens};

    type TestAuth = AuthService<InMemoryUsers, InMemoryChats, PlainHasher, PlainTokens>;

    fn service() -> (TestAuth, InMemoryUsers, InMemoryChats) {
        let users = InMemoryUsers::default();
        let chats = InMemoryChats::default();
        let svc = AuthService::new(
            users.clone(),
            chats.clone(),
            PlainHasher,
            PlainTokens,
            8,
            Duration::from_secs(5),
        );
        (svc, users, chats)
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        for bad in ["", "ada", "@example.com", "ada@", "ada@example", "a da@x.io", "a@b@c.io"] {
            assert!(normalize_email(bad).is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_register_creates_welcome_chat() {
        let (svc, users, chats) = service();
        let user = svc.register("ada@example.com", "correct horse").await.unwrap();
        assert_eq!(users.users.lock().unwrap().len(), 1);
        assert_eq!(user.password_hash, "plain$correct horse");

        let owned = chats.chats.lock().unwrap();
        let chat = owned.values().next().unwrap();
        assert_eq!(chat.user_id, user.id);
        assert_eq!(chat.title, "Chat");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (svc, _, _) = service();
        svc.register("ada@example.com", "password1").await.unwrap();
        let err = svc.register("ADA@example.com", "password2").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_register_short_password() {
        let (svc, users, _) = service();
        let err = svc.register("ada@example.com", "short").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(users.users.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let (svc, _, _) = service();
        let user = svc.register("ada@example.com", "password1").await.unwrap();
        let (logged_in, token) = svc.login("Ada@Example.com", "password1").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(svc.authenticate(&token.token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (svc, _, _) = service();
        svc.register("ada@example.com", "password1").await.unwrap();
        let wrong_password = svc.login("ada@example.com", "nope").await.unwrap_err();
        let unknown = svc.login("bob@example.com", "password1").await.unwrap_err();
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_profile() {
        let (svc, _, _) = service();
        let user = svc.register("ada@example.com", "password1").await.unwrap();
        let profile = svc.profile(user.id).await.unwrap();
        assert_eq!(profile.email, "ada@example.com");
        let err = svc.profile(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[test]
    fn test_authenticate_rejects_garbage() {
        let (svc, _, _) = service();
        assert!(matches!(svc.authenticate("garbage"), Err(AuthError::InvalidToken)));
    }
}
