//! Bearer-token authentication extractor.
//!
//! Reads `Authorization: Bearer <token>`, verifies it, and yields the
//! authenticated user's id. Handlers that take `AuthUser` reject anonymous
//! requests with 401 before running.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user_id = state.auth_service.authenticate(token)?;
        Ok(AuthUser(user_id))
    }
}

/// Extract the token from the Authorization header.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Missing token. Provide it via 'Authorization: Bearer <token>'.".to_string(),
            )
        })?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/me");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with(Some("Bearer abc.def"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert!(bearer_token(&parts_with(None)).is_err());
        assert!(bearer_token(&parts_with(Some("Basic dXNlcg=="))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer   "))).is_err());
    }
}
