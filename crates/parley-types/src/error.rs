use thiserror::Error;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to chat operations and message turns.
///
/// A chat that does not exist and a chat owned by someone else are both
/// `NotFound`; callers cannot tell them apart.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("chat not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("generation timed out")]
    UpstreamTimeout,

    /// The generation backend failed; carries its message unchanged.
    #[error("{0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("storage operation timed out")]
    StorageTimeout,
}

impl From<RepositoryError> for ChatError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ChatError::NotFound,
            RepositoryError::Conflict(msg) => ChatError::Conflict(msg),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

/// Errors related to accounts and authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("email already registered")]
    EmailTaken,

    /// Unknown email and wrong password are deliberately the same error.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("user not found")]
    UserNotFound,

    #[error("hashing error: {0}")]
    Hashing(String),

    #[error("token error: {0}")]
    Token(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("storage operation timed out")]
    StorageTimeout,
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => AuthError::EmailTaken,
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_chat_error_from_repository() {
        assert!(matches!(
            ChatError::from(RepositoryError::NotFound),
            ChatError::NotFound
        ));
        assert!(matches!(
            ChatError::from(RepositoryError::Connection),
            ChatError::Storage(_)
        ));
    }

    #[test]
    fn test_auth_error_conflict_is_email_taken() {
        let err = AuthError::from(RepositoryError::Conflict("users.email".into()));
        assert!(matches!(err, AuthError::EmailTaken));
    }
}
