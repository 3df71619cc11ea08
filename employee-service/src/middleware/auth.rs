use std::collections::HashSet;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{authz::Principal, dtos::ErrorResponse, AppState};

/// Middleware to require authentication.
///
/// Validates the bearer token, then loads the caller's roles and claims
/// so that authorization decisions downstream see current grants, not
/// the grants at token issue time.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match token {
        Some(token) => token,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Missing or invalid Authorization header".to_string(),
                }),
            ));
        }
    };

    let claims = match state.jwt.verify_access_token(token) {
        Ok(claims) => claims,
        Err(_) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or expired token".to_string(),
                }),
            ));
        }
    };

    let user_id: Uuid = claims.sub.parse().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or expired token".to_string(),
            }),
        )
    })?;

    let internal_error = || {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Internal server error".to_string(),
            }),
        )
    };

    // The account must still exist; a deleted user's token is dead.
    let user = state
        .identity
        .find_user_by_id(user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load user for auth");
            internal_error()
        })?
        .ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or expired token".to_string(),
            }),
        ))?;

    let roles = state
        .identity
        .user_role_names(user.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load roles for auth");
            internal_error()
        })?;

    let permissions: HashSet<_> = state
        .identity
        .user_claims(user.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load claims for auth");
            internal_error()
        })?
        .into_iter()
        .collect();

    let principal = Principal {
        user_id: user.user_id.to_string(),
        roles,
        permissions,
    };

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Extractor for the authenticated principal in handlers.
pub struct CurrentUser(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts.extensions.get::<Principal>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Principal missing from request extensions".to_string(),
            }),
        ))?;

        Ok(CurrentUser(principal.clone()))
    }
}
