//! Chat service: create, list, fetch and delete owner-bound chats.
//!
//! Every store call runs under the configured store deadline. Lookups are
//! always scoped by owner, so another user's chat is reported as not found.

use std::time::Duration;

use parley_types::chat::{Chat, DEFAULT_CHAT_TITLE};
use parley_types::error::ChatError;
use tracing::info;
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::deadline::bounded;

/// Parse a client-supplied chat id.
pub fn parse_chat_id(raw: &str) -> Result<Uuid, ChatError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ChatError::Validation("chat_id is required".to_string()));
    }
    Uuid::parse_str(raw).map_err(|_| ChatError::Validation("invalid chat_id".to_string()))
}

/// Orchestrates chat lifecycle operations.
///
/// Generic over `ChatRepository` to maintain clean architecture
/// (parley-core never depends on parley-infra).
pub struct ChatService<C: ChatRepository> {
    chat_repo: C,
    store_timeout: Duration,
}

impl<C: ChatRepository> ChatService<C> {
    pub fn new(chat_repo: C, store_timeout: Duration) -> Self {
        Self {
            chat_repo,
            store_timeout,
        }
    }

    /// Create an empty chat. A missing or blank title becomes `"new chat"`.
    pub async fn create_chat(&self, owner_id: Uuid, title: Option<&str>) -> Result<Chat, ChatError> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_CHAT_TITLE);
        let chat = Chat::new(owner_id, title);

        bounded(
            self.store_timeout,
            ChatError::StorageTimeout,
            self.chat_repo.create_chat(&chat),
        )
        .await?;

        info!(chat_id = %chat.id, user_id = %owner_id, "Chat created");
        Ok(chat)
    }

    /// All chats for the owner, newest first, each with sorted messages.
    pub async fn list_chats(&self, owner_id: Uuid) -> Result<Vec<Chat>, ChatError> {
        let mut chats = bounded(
            self.store_timeout,
            ChatError::StorageTimeout,
            self.chat_repo.list_owned(&owner_id),
        )
        .await?;

        for chat in &mut chats {
            chat.sort_messages();
        }
        Ok(chats)
    }

    /// One owned chat with sorted messages.
    pub async fn get_chat(&self, owner_id: Uuid, chat_id: Uuid) -> Result<Chat, ChatError> {
        let mut chat = bounded(
            self.store_timeout,
            ChatError::StorageTimeout,
            self.chat_repo.find_owned(&chat_id, &owner_id),
        )
        .await?
        .ok_or(ChatError::NotFound)?;

        chat.sort_messages();
        Ok(chat)
    }

    /// Delete an owned chat and its messages.
    pub async fn delete_chat(&self, owner_id: Uuid, chat_id: Uuid) -> Result<(), ChatError> {
        bounded(
            self.store_timeout,
            ChatError::StorageTimeout,
            self.chat_repo.delete_owned(&chat_id, &owner_id),
        )
        .await?;

        info!(chat_id = %chat_id, user_id = %owner_id, "Chat deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryChats;
    use chrono::Duration as ChronoDuration;
    use parley_types::chat::{ChatMessage, ChatRole};

    fn service(repo: InMemoryChats) -> ChatService<InMemoryChats> {
        ChatService::new(repo, Duration::from_secs(5))
    }

    #[test]
    fn test_parse_chat_id() {
        let id = Uuid::now_v7();
        assert_eq!(parse_chat_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_chat_id("  "), Err(ChatError::Validation(_))));
        assert!(matches!(parse_chat_id("not-a-uuid"), Err(ChatError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_chat_defaults_title() {
        let svc = service(InMemoryChats::default());
        let owner = Uuid::now_v7();
        let chat = svc.create_chat(owner, None).await.unwrap();
        assert_eq!(chat.title, "new chat");
        let chat = svc.create_chat(owner, Some("   ")).await.unwrap();
        assert_eq!(chat.title, "new chat");
        let chat = svc.create_chat(owner, Some("Trip plans")).await.unwrap();
        assert_eq!(chat.title, "Trip plans");
    }

    #[tokio::test]
    async fn test_list_chats_only_owned_and_sorted() {
        let owner = Uuid::now_v7();
        let other = Uuid::now_v7();
        let base = chrono::Utc::now();

        let mut older = Chat::new(owner, "older");
        older.created_at = base - ChronoDuration::hours(1);
        older.messages = vec![
            ChatMessage {
                role: ChatRole::Model,
                content: "late".into(),
                created_at: base,
            },
            ChatMessage {
                role: ChatRole::User,
                content: "early".into(),
                created_at: base - ChronoDuration::minutes(5),
            },
        ];
        let mut newer = Chat::new(owner, "newer");
        newer.created_at = base;
        let foreign = Chat::new(other, "foreign");

        let repo = InMemoryChats::default();
        for chat in [older, newer, foreign] {
            repo.chats.lock().unwrap().insert(chat.id, chat);
        }

        let chats = service(repo).list_chats(owner).await.unwrap();
        let titles: Vec<_> = chats.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
        assert_eq!(chats[1].messages[0].content, "early");
    }

    #[tokio::test]
    async fn test_get_chat_of_other_owner_is_not_found() {
        let chat = Chat::new(Uuid::now_v7(), "mine");
        let id = chat.id;
        let svc = service(InMemoryChats::with_chat(chat));
        let err = svc.get_chat(Uuid::now_v7(), id).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let owner = Uuid::now_v7();
        let chat = Chat::new(owner, "bye");
        let id = chat.id;
        let svc = service(InMemoryChats::with_chat(chat));
        svc.delete_chat(owner, id).await.unwrap();
        let err = svc.delete_chat(owner, id).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_by_other_owner_keeps_chat() {
        let owner = Uuid::now_v7();
        let chat = Chat::new(owner, "keep");
        let id = chat.id;
        let repo = InMemoryChats::with_chat(chat);
        let svc = service(repo.clone());
        let err = svc.delete_chat(Uuid::now_v7(), id).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound));
        assert!(repo.chats.lock().unwrap().contains_key(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let owner = Uuid::now_v7();
        let chat = Chat::new(owner, "slow");
        let id = chat.id;
        let mut repo = InMemoryChats::with_chat(chat);
        repo.lookup_delay = Some(Duration::from_secs(60));
        let err = service(repo).get_chat(owner, id).await.unwrap_err();
        assert!(matches!(err, ChatError::StorageTimeout));
    }
}
