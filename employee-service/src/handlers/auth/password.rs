use axum::{extract::State, response::IntoResponse, Json};
use uuid::Uuid;

use crate::{
    dtos::{
        auth::{AddPasswordRequest, ChangePasswordRequest, PasswordResetConfirm, PasswordResetRequest},
        MessageResponse,
    },
    error::AppError,
    middleware::CurrentUser,
    utils::validation::ValidatedJson,
    AppState,
};

/// Start the password reset flow. The response is the same whether or
/// not the address is registered.
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.request_password_reset(req).await?;
    Ok(Json(MessageResponse::new(
        "If that email is registered, a reset link has been sent.",
    )))
}

/// Complete the password reset flow with the mailed token.
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirm>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.confirm_password_reset(req).await?;
    Ok(Json(MessageResponse::new("Password has been reset.")))
}

/// Change the password of the signed-in account.
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id: Uuid = principal
        .user_id
        .parse()
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid principal id")))?;

    state.auth_service.change_password(user_id, req).await?;
    Ok(Json(MessageResponse::new("Password changed.")))
}

/// Add a local password to an account created through an external
/// provider.
pub async fn add_password(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ValidatedJson(req): ValidatedJson<AddPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id: Uuid = principal
        .user_id
        .parse()
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid principal id")))?;

    state.auth_service.add_password(user_id, req).await?;
    Ok(Json(MessageResponse::new("Password added.")))
}
