//! Account HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/auth/register - Create an account (and its first chat)
//! - POST /api/v1/auth/login    - Exchange credentials for a bearer token
//! - GET  /api/v1/me            - Profile of the authenticated user

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_types::user::UserProfile;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResponse>>), AppError> {
    let start = Instant::now();

    let user = state
        .auth_service
        .register(&body.email, &body.password)
        .await?;

    let resp = ApiResponse::success(
        RegisterResponse {
            user_id: user.id,
            email: user.email,
        },
        start,
    )
    .with_link("login", "/api/v1/auth/login");

    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let start = Instant::now();

    let (user, issued) = state.auth_service.login(&body.email, &body.password).await?;

    let resp = ApiResponse::success(
        LoginResponse {
            user_id: user.id,
            token: issued.token,
            expires_at: issued.expires_at,
        },
        start,
    )
    .with_link("me", "/api/v1/me")
    .with_link("chats", "/api/v1/chats");

    Ok(Json(resp))
}

/// GET /api/v1/me
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let start = Instant::now();
    let profile = state.auth_service.profile(user_id).await?;
    Ok(Json(ApiResponse::success(profile, start).with_link("self", "/api/v1/me")))
}
