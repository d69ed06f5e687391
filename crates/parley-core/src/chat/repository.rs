//! ChatRepository trait definition.
//!
//! Every lookup and mutation is filtered by chat id *and* owner id. A chat
//! that exists but belongs to someone else behaves exactly like a missing one.

use parley_types::chat::{Chat, ChatMessage};
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat transcripts.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Insert a new chat together with any messages it already holds.
    fn create_chat(
        &self,
        chat: &Chat,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Load a chat with its messages in append order.
    fn find_owned(
        &self,
        chat_id: &Uuid,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// Atomically append one message and move `updated_at` forward.
    ///
    /// Returns `RepositoryError::NotFound` when no chat matches id+owner.
    fn append_message(
        &self,
        chat_id: &Uuid,
        owner_id: &Uuid,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove a chat and its messages.
    ///
    /// Returns `RepositoryError::NotFound` when no chat matches id+owner.
    fn delete_owned(
        &self,
        chat_id: &Uuid,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All chats for an owner, newest `created_at` first.
    fn list_owned(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;
}
