//! UserRepository trait definition.

use parley_types::error::RepositoryError;
use parley_types::user::User;
use uuid::Uuid;

/// Repository trait for user accounts.
///
/// Implementations live in parley-infra (e.g., `SqliteUserRepository`).
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A taken email is `RepositoryError::Conflict`.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Look a user up by (already normalized) email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn find_by_id(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}
