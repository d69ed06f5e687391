//! Chat CRUD HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/chats      - Create a chat
//! - GET    /api/v1/chats      - List the caller's chats, newest first
//! - GET    /api/v1/chats/{id} - Get one chat with its messages
//! - DELETE /api/v1/chats/{id} - Delete a chat and its messages

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_core::chat::service::parse_chat_id;
use parley_types::chat::Chat;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for chat creation. The body itself is optional.
#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedChat {
    pub id: Uuid,
    pub deleted: bool,
}

/// POST /api/v1/chats
pub async fn create_chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Option<Json<CreateChatRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<Chat>>), AppError> {
    let start = Instant::now();
    let title = body.and_then(|Json(b)| b.title);

    let chat = state
        .chat_service
        .create_chat(user_id, title.as_deref())
        .await?;

    let href = format!("/api/v1/chats/{}", chat.id);
    let resp = ApiResponse::success(chat, start)
        .with_link("self", &href)
        .with_link("messages", "/api/v1/chats/messages");

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/chats
pub async fn list_chats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ApiResponse<Vec<Chat>>>, AppError> {
    let start = Instant::now();
    let chats = state.chat_service.list_chats(user_id).await?;
    Ok(Json(ApiResponse::success(chats, start).with_link("self", "/api/v1/chats")))
}

/// GET /api/v1/chats/{id}
pub async fn get_chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let chat_id = parse_chat_id(&id)?;
    let chat = state.chat_service.get_chat(user_id, chat_id).await?;

    let href = format!("/api/v1/chats/{}", chat.id);
    Ok(Json(ApiResponse::success(chat, start).with_link("self", &href)))
}

/// DELETE /api/v1/chats/{id}
pub async fn delete_chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedChat>>, AppError> {
    let start = Instant::now();
    let chat_id = parse_chat_id(&id)?;
    state.chat_service.delete_chat(user_id, chat_id).await?;

    Ok(Json(ApiResponse::success(
        DeletedChat {
            id: chat_id,
            deleted: true,
        },
        start,
    )))
}
