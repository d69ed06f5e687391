//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::{AuthError, ChatError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat and message-turn errors.
    Chat(ChatError),
    /// Account and token errors.
    Auth(AuthError),
    /// Missing or unusable bearer token.
    Unauthorized(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(e) => {
                let (status, code) = match e {
                    ChatError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                    ChatError::NotFound => (StatusCode::NOT_FOUND, "CHAT_NOT_FOUND"),
                    ChatError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                    ChatError::UpstreamTimeout => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT"),
                    ChatError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
                    ChatError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
                    ChatError::StorageTimeout => (StatusCode::GATEWAY_TIMEOUT, "STORAGE_TIMEOUT"),
                };
                (status, code, e.to_string())
            }
            AppError::Auth(e) => {
                let (status, code) = match e {
                    AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                    AuthError::EmailTaken => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
                    AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                    AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                    AuthError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
                    AuthError::StorageTimeout => (StatusCode::GATEWAY_TIMEOUT, "STORAGE_TIMEOUT"),
                    AuthError::Hashing(_) | AuthError::Token(_) | AuthError::Storage(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                    }
                };
                (status, code, e.to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, error = %message, "Request failed");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
