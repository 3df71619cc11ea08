use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    dtos::{auth::RegisterRequest, MessageResponse},
    error::AppError,
    utils::validation::ValidatedJson,
    AppState,
};

/// Register a new user. Sign-in stays blocked until the emailed
/// confirmation link is followed.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmEmailQuery {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub token: String,
}

/// Confirm an email address from the mailed link.
pub async fn confirm_email(
    State(state): State<AppState>,
    Query(query): Query<ConfirmEmailQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .confirm_email(crate::dtos::auth::ConfirmEmailRequest {
            user_id: query.user_id,
            token: query.token,
        })
        .await?;

    Ok(Json(MessageResponse::new("Email confirmed successfully")))
}
