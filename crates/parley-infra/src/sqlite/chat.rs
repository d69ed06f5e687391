//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `parley-core` using sqlx with split
//! read/write pools. Every statement is scoped by chat id *and* owner id.
//! Messages are ordered by their autoincrement `seq`, so equal timestamps
//! still come back in append order.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use parley_core::chat::repository::ChatRepository;
use parley_types::chat::{Chat, ChatMessage, ChatRole};
use parley_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn load_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, content, created_at FROM chat_messages WHERE chat_id = ? ORDER BY seq ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                ChatMessageRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_message()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatRow {
    id: String,
    user_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chat(self, messages: Vec<ChatMessage>) -> Result<Chat, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid chat id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;

        Ok(Chat {
            id,
            user_id,
            title: self.title,
            messages,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    role: String,
    content: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: ChatRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC timestamps so that text comparison matches time order.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let chat_id = chat.id.to_string();
        sqlx::query(
            "INSERT INTO chats (id, user_id, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&chat_id)
        .bind(chat.user_id.to_string())
        .bind(&chat.title)
        .bind(format_datetime(&chat.created_at))
        .bind(format_datetime(&chat.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!("chat {} already exists", chat.id));
                }
            }
            RepositoryError::Query(e.to_string())
        })?;

        for message in &chat.messages {
            sqlx::query(
                "INSERT INTO chat_messages (chat_id, role, content, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&chat_id)
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(format_datetime(&message.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn find_owned(
        &self,
        chat_id: &Uuid,
        owner_id: &Uuid,
    ) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ? AND user_id = ?")
            .bind(chat_id.to_string())
            .bind(owner_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let chat_row = ChatRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        let messages = self.load_messages(&chat_row.id).await?;
        Ok(Some(chat_row.into_chat(messages)?))
    }

    async fn append_message(
        &self,
        chat_id: &Uuid,
        owner_id: &Uuid,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        // Ownership check and timestamp bump in one statement; the insert
        // only happens if it matched.
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let created_at = format_datetime(&message.created_at);
        let result = sqlx::query(
            "UPDATE chats SET updated_at = MAX(updated_at, ?) WHERE id = ? AND user_id = ?",
        )
        .bind(&created_at)
        .bind(chat_id.to_string())
        .bind(owner_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "INSERT INTO chat_messages (chat_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(chat_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(&created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_owned(&self, chat_id: &Uuid, owner_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chats WHERE id = ? AND user_id = ?")
            .bind(chat_id.to_string())
            .bind(owner_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_owned(&self, owner_id: &Uuid) -> Result<Vec<Chat>, RepositoryError> {
        let owner = owner_id.to_string();
        let chat_rows =
            sqlx::query("SELECT * FROM chats WHERE user_id = ? ORDER BY created_at DESC, id DESC")
                .bind(&owner)
                .fetch_all(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let message_rows = sqlx::query(
            r#"SELECT m.chat_id, m.role, m.content, m.created_at
               FROM chat_messages m JOIN chats c ON c.id = m.chat_id
               WHERE c.user_id = ?
               ORDER BY m.seq ASC"#,
        )
        .bind(&owner)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut by_chat: HashMap<String, Vec<ChatMessage>> = HashMap::new();
        for row in &message_rows {
            let chat_id: String = row
                .try_get("chat_id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let message = ChatMessageRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_message()?;
            by_chat.entry(chat_id).or_default().push(message);
        }

        let mut chats = Vec::with_capacity(chat_rows.len());
        for row in &chat_rows {
            let chat_row =
                ChatRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            let messages = by_chat.remove(&chat_row.id).unwrap_or_default();
            chats.push(chat_row.into_chat(messages)?);
        }

        Ok(chats)
    }
}
